//! Single-pass PIV evaluation of a frame pair.
//!
//! `PivProcessor` runs the whole chain for every interrogation window:
//! extraction from both frames, intensity normalization, circular FFT
//! correlation, first peak search, sub-pixel refinement, optional
//! signal-to-noise ratio and conversion to a displacement. When a memory
//! ceiling is configured and the window batch would exceed it, the grid is
//! processed in sequential blocks whose buffers are dropped before the next
//! block starts. Each window is processed independently, so the blocked result
//! is identical to the unblocked one.

use std::ops::Range;

use crate::correlate::Correlator;
use crate::grid::{field_shape, rect_coordinates, Coordinates, FieldShape, Shape2};
use crate::image::{Frame, ImageView};
use crate::peak::find_all_first_peaks;
use crate::refine::refine_batch;
use crate::snr::sig2noise_batch;
use crate::spectral::{RustFftTransform, SpectralTransform};
use crate::trace::{trace_event, trace_span};
use crate::util::{PivError, PivResult};
use crate::window::{extract_windows, normalize_intensity};

mod block;
mod config;
mod displacement;

pub use block::BlockPlan;
pub use config::PivConfig;
pub use displacement::{correlation_to_displacements, MASK_WIDTH};

/// Displacement field of one frame pair.
///
/// All grids are row-major with `shape`.
#[derive(Clone, Debug, PartialEq)]
pub struct PivField {
    /// Number of windows along each axis.
    pub shape: FieldShape,
    /// Column displacement per `dt`; NaN for invalid windows.
    pub u: Vec<f32>,
    /// Row displacement per `dt`; NaN for invalid windows.
    pub v: Vec<f32>,
    /// Signal-to-noise ratio; NaN when no measure was requested.
    pub sig2noise: Vec<f32>,
    /// Windows with a border peak or a non-finite displacement.
    pub invalid_count: usize,
    /// Windows refined with the parabolic fit instead of the gaussian one.
    pub gaussian_fallbacks: usize,
    /// Number of blocks the grid was processed in.
    pub blocks: usize,
}

impl PivField {
    /// Share of invalid windows in percent.
    pub fn invalid_percentage(&self) -> f32 {
        if self.shape.is_empty() {
            return 0.0;
        }
        self.invalid_count as f32 / self.shape.len() as f32 * 100.0
    }
}

/// Cross-correlation PIV evaluator.
pub struct PivProcessor<S = RustFftTransform> {
    config: PivConfig,
    correlator: Correlator<S>,
}

impl PivProcessor<RustFftTransform> {
    /// Creates a processor with the default FFT backend.
    ///
    /// The configuration is validated up front.
    pub fn new(config: PivConfig) -> PivResult<Self> {
        Self::with_transform(config, RustFftTransform::new())
    }
}

impl<S: SpectralTransform> PivProcessor<S> {
    /// Creates a processor on top of a custom spectral backend.
    pub fn with_transform(config: PivConfig, transform: S) -> PivResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            correlator: Correlator::with_transform(transform),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PivConfig {
        &self.config
    }

    /// Field shape for an image of `image` pixels.
    pub fn field_shape(&self, image: Shape2) -> PivResult<FieldShape> {
        field_shape(image, self.config.window_size, self.config.overlap)
    }

    /// Window-center coordinates for an image of `image` pixels.
    pub fn coordinates(&self, image: Shape2) -> PivResult<Coordinates> {
        rect_coordinates(
            image,
            self.config.window_size,
            self.config.overlap,
            self.config.center_on_field,
        )
    }

    /// Evaluates two owned frames.
    pub fn process_frames(&self, frame_a: &Frame, frame_b: &Frame) -> PivResult<PivField> {
        self.process(frame_a.view(), frame_b.view())
    }

    /// Evaluates the displacement from `frame_a` to `frame_b`.
    pub fn process(&self, frame_a: ImageView<'_, f32>, frame_b: ImageView<'_, f32>) -> PivResult<PivField> {
        if frame_a.shape() != frame_b.shape() {
            return Err(PivError::FrameShapeMismatch {
                a_rows: frame_a.height(),
                a_cols: frame_a.width(),
                b_rows: frame_b.height(),
                b_cols: frame_b.width(),
            });
        }
        let cfg = &self.config;
        let shape = self.field_shape(frame_a.shape())?;
        let count = shape.len();
        let area = cfg.window_size.area();
        let _span = trace_span!("piv", rows = shape.rows, cols = shape.cols, area = area).entered();

        let plan = match cfg.max_array_size {
            Some(max) => BlockPlan::new(max, area, count)?,
            None => None,
        };
        let ranges: Vec<Range<usize>> = match &plan {
            Some(plan) => plan.ranges().collect(),
            None => vec![0..count],
        };

        let mut field = PivField {
            shape,
            u: vec![f32::NAN; count],
            v: vec![f32::NAN; count],
            sig2noise: vec![f32::NAN; count],
            invalid_count: 0,
            gaussian_fallbacks: 0,
            blocks: ranges.len(),
        };
        for range in ranges {
            let _block = trace_span!("block", start = range.start, end = range.end).entered();
            self.process_block(frame_a, frame_b, range, &mut field)?;
        }

        trace_event!(
            "piv_done",
            windows = count,
            invalid = field.invalid_count,
            fallbacks = field.gaussian_fallbacks,
            blocks = field.blocks
        );
        Ok(field)
    }

    fn process_block(
        &self,
        frame_a: ImageView<'_, f32>,
        frame_b: ImageView<'_, f32>,
        range: Range<usize>,
        field: &mut PivField,
    ) -> PivResult<()> {
        let cfg = &self.config;
        let corr = {
            let mut a = extract_windows(frame_a, cfg.window_size, cfg.overlap, Some(range.clone()), cfg.parallel)?;
            let mut b = extract_windows(frame_b, cfg.window_size, cfg.overlap, Some(range.clone()), cfg.parallel)?;
            normalize_intensity(&mut a, cfg.parallel);
            normalize_intensity(&mut b, cfg.parallel);
            self.correlator.correlate_batch(&a, &b, cfg.parallel)?
        };

        let peaks = find_all_first_peaks(&corr, cfg.parallel);
        let refined = refine_batch(&corr, &peaks, cfg.subpixel_method, cfg.parallel);
        field.gaussian_fallbacks += refined.fallbacks;
        field.invalid_count += correlation_to_displacements(
            &peaks,
            &refined.offsets,
            corr.shape(),
            cfg.dt,
            &mut field.u[range.clone()],
            &mut field.v[range.clone()],
        );

        if let Some(method) = cfg.sig2noise_method {
            let snr = sig2noise_batch(&corr, &peaks, method, cfg.width, cfg.parallel);
            field.sig2noise[range].copy_from_slice(&snr);
        }
        Ok(())
    }
}
