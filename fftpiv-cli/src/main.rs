use clap::Parser;
use fftpiv::image::io::load_frame;
use fftpiv::{
    CorrelationMethod, PivConfig, PivField, PivProcessor, Shape2, Sig2NoiseMethod, SubpixelMethod,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "fftpiv CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

/// A window size given either as one number or as `[rows, cols]`.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(untagged)]
enum SizeJson {
    Square(usize),
    Rect([usize; 2]),
}

impl From<SizeJson> for Shape2 {
    fn from(value: SizeJson) -> Self {
        match value {
            SizeJson::Square(size) => Shape2::square(size),
            SizeJson::Rect([rows, cols]) => Shape2::new(rows, cols),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CorrelationConfig {
    Circular,
    Linear,
    Direct,
}

impl From<CorrelationConfig> for CorrelationMethod {
    fn from(value: CorrelationConfig) -> Self {
        match value {
            CorrelationConfig::Circular => CorrelationMethod::Circular,
            CorrelationConfig::Linear => CorrelationMethod::Linear,
            CorrelationConfig::Direct => CorrelationMethod::Direct,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SubpixelConfig {
    Gaussian,
    Centroid,
    Parabolic,
}

impl From<SubpixelConfig> for SubpixelMethod {
    fn from(value: SubpixelConfig) -> Self {
        match value {
            SubpixelConfig::Gaussian => SubpixelMethod::Gaussian,
            SubpixelConfig::Centroid => SubpixelMethod::Centroid,
            SubpixelConfig::Parabolic => SubpixelMethod::Parabolic,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Sig2NoiseConfig {
    Peak2peak,
    Peak2mean,
}

impl From<Sig2NoiseConfig> for Sig2NoiseMethod {
    fn from(value: Sig2NoiseConfig) -> Self {
        match value {
            Sig2NoiseConfig::Peak2peak => Sig2NoiseMethod::PeakToPeak,
            Sig2NoiseConfig::Peak2mean => Sig2NoiseMethod::PeakToMean,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PivConfigJson {
    window_size: SizeJson,
    overlap: SizeJson,
    search_area_size: Option<SizeJson>,
    dt: f32,
    correlation_method: CorrelationConfig,
    normalized_correlation: bool,
    subpixel_method: SubpixelConfig,
    sig2noise_method: Option<Sig2NoiseConfig>,
    width: usize,
    max_array_size: Option<usize>,
    parallel: bool,
}

impl Default for PivConfigJson {
    fn default() -> Self {
        let cfg = PivConfig::default();
        Self {
            window_size: SizeJson::Rect([cfg.window_size.rows, cfg.window_size.cols]),
            overlap: SizeJson::Rect([cfg.overlap.rows, cfg.overlap.cols]),
            search_area_size: None,
            dt: cfg.dt,
            correlation_method: CorrelationConfig::Circular,
            normalized_correlation: cfg.normalized_correlation,
            subpixel_method: SubpixelConfig::Gaussian,
            sig2noise_method: None,
            width: cfg.width,
            max_array_size: cfg.max_array_size,
            parallel: cfg.parallel,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    frame_a_path: String,
    frame_b_path: String,
    output_path: Option<String>,
    center_on_field: bool,
    piv: PivConfigJson,
}

impl Config {
    fn piv_config(self) -> PivConfig {
        let piv = self.piv;
        PivConfig {
            window_size: piv.window_size.into(),
            overlap: piv.overlap.into(),
            search_area_size: piv.search_area_size.map(Shape2::from),
            dt: piv.dt,
            correlation_method: piv.correlation_method.into(),
            normalized_correlation: piv.normalized_correlation,
            subpixel_method: piv.subpixel_method.into(),
            sig2noise_method: piv.sig2noise_method.map(Sig2NoiseMethod::from),
            width: piv.width,
            max_array_size: piv.max_array_size,
            parallel: piv.parallel,
            center_on_field: self.center_on_field,
        }
    }
}

/// Non-finite values serialize as `null`.
#[derive(Debug, Serialize)]
struct Output {
    shape: [usize; 2],
    x: Vec<f32>,
    y: Vec<f32>,
    u: Vec<f32>,
    v: Vec<f32>,
    sig2noise: Vec<f32>,
    invalid_count: usize,
    invalid_percentage: f32,
    gaussian_fallbacks: usize,
    blocks: usize,
}

impl Output {
    fn new(field: PivField, x: Vec<f32>, y: Vec<f32>) -> Self {
        Self {
            shape: [field.shape.rows, field.shape.cols],
            invalid_percentage: field.invalid_percentage(),
            x,
            y,
            u: field.u,
            v: field.v,
            sig2noise: field.sig2noise,
            invalid_count: field.invalid_count,
            gaussian_fallbacks: field.gaussian_fallbacks,
            blocks: field.blocks,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("fftpiv=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.frame_a_path.is_empty() || config.frame_b_path.is_empty() {
        return Err("frame_a_path and frame_b_path must be set in the config".into());
    }

    let frame_a = load_frame(&config.frame_a_path)?;
    let frame_b = load_frame(&config.frame_b_path)?;
    let output_path = config.output_path.clone();
    let processor = PivProcessor::new(config.piv_config())?;

    let field = processor.process_frames(&frame_a, &frame_b)?;
    let coords = processor.coordinates(frame_a.view().shape())?;
    tracing::info!(
        invalid = field.invalid_count,
        percent = field.invalid_percentage(),
        "evaluated {}x{} windows",
        field.shape.rows,
        field.shape.cols
    );

    let output = Output::new(field, coords.x().to_vec(), coords.y().to_vec());
    let json = serde_json::to_string_pretty(&output)?;

    match output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
