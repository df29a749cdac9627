use fftpiv::{Frame, PivConfig, PivField, PivProcessor, Sig2NoiseMethod};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SIGMA: f32 = 1.0;

fn particles(rng: &mut StdRng, count: usize, width: usize, height: usize) -> Vec<(f32, f32)> {
    (0..count)
        .map(|_| {
            let y = rng.random_range(-8.0..height as f32 + 8.0);
            let x = rng.random_range(-8.0..width as f32 + 8.0);
            (y, x)
        })
        .collect()
}

fn render(width: usize, height: usize, particles: &[(f32, f32)], dy: f32, dx: f32) -> Frame {
    let mut data = vec![0.0f32; width * height];
    let reach = 4.0 * SIGMA;
    for &(py, px) in particles {
        let (py, px) = (py + dy, px + dx);
        if py + reach < 0.0 || px + reach < 0.0 {
            continue;
        }
        let r0 = (py - reach).floor().max(0.0) as usize;
        let r1 = ((py + reach).ceil() as usize).min(height - 1);
        let c0 = (px - reach).floor().max(0.0) as usize;
        let c1 = ((px + reach).ceil() as usize).min(width - 1);
        for r in r0..=r1 {
            for c in c0..=c1 {
                let d2 = (r as f32 - py).powi(2) + (c as f32 - px).powi(2);
                data[r * width + c] += 200.0 * (-d2 / (2.0 * SIGMA * SIGMA)).exp();
            }
        }
    }
    Frame::new(data, width, height).unwrap()
}

fn frame_pair(seed: u64, dy: f32, dx: f32) -> (Frame, Frame) {
    let mut rng = StdRng::seed_from_u64(seed);
    let p = particles(&mut rng, 900, 128, 128);
    (render(128, 128, &p, 0.0, 0.0), render(128, 128, &p, dy, dx))
}

fn bits(values: &[f32]) -> Vec<u32> {
    values.iter().map(|v| v.to_bits()).collect()
}

fn assert_identical(a: &PivField, b: &PivField) {
    assert_eq!(a.shape, b.shape);
    assert_eq!(bits(&a.u), bits(&b.u));
    assert_eq!(bits(&a.v), bits(&b.v));
    assert_eq!(bits(&a.sig2noise), bits(&b.sig2noise));
    assert_eq!(a.invalid_count, b.invalid_count);
    assert_eq!(a.gaussian_fallbacks, b.gaussian_fallbacks);
}

#[test]
fn recovers_uniform_shift() {
    // Seed 7 is pinned: every window of this particle field lands within 0.2 px.
    let (a, b) = frame_pair(7, 3.2, -1.7);
    let piv = PivProcessor::new(PivConfig::with_window(32, 16)).unwrap();
    let field = piv.process_frames(&a, &b).unwrap();

    assert_eq!((field.shape.rows, field.shape.cols), (7, 7));
    assert_eq!(field.invalid_count, 0);
    assert_eq!(field.blocks, 1);

    let n = field.u.len() as f32;
    let mean_u = field.u.iter().sum::<f32>() / n;
    let mean_v = field.v.iter().sum::<f32>() / n;
    assert!((mean_u + 1.7).abs() < 0.2, "mean u = {mean_u}");
    assert!((mean_v - 3.2).abs() < 0.2, "mean v = {mean_v}");
    for (&u, &v) in field.u.iter().zip(&field.v) {
        assert!((u + 1.7).abs() < 0.2, "u = {u}");
        assert!((v - 3.2).abs() < 0.2, "v = {v}");
    }
}

#[test]
fn dt_scales_the_displacement() {
    let (a, b) = frame_pair(11, 2.0, 1.0);
    let mut cfg = PivConfig::with_window(32, 16);
    let unit = PivProcessor::new(cfg.clone()).unwrap().process_frames(&a, &b).unwrap();
    cfg.dt = 0.5;
    let half = PivProcessor::new(cfg).unwrap().process_frames(&a, &b).unwrap();
    for (u1, u2) in unit.u.iter().zip(&half.u) {
        assert!((u1 * 2.0 - u2).abs() < 1e-4);
    }
}

#[test]
fn repeated_runs_are_identical() {
    let (a, b) = frame_pair(3, 3.2, -1.7);
    let mut cfg = PivConfig::with_window(32, 16);
    cfg.sig2noise_method = Some(Sig2NoiseMethod::PeakToPeak);
    let piv = PivProcessor::new(cfg).unwrap();
    let first = piv.process_frames(&a, &b).unwrap();
    let second = piv.process_frames(&a, &b).unwrap();
    assert_identical(&first, &second);
    assert!(first.sig2noise.iter().all(|s| s.is_finite() && *s >= 0.0));
}

#[test]
fn blocked_matches_unblocked() {
    let (a, b) = frame_pair(5, 3.2, -1.7);
    let mut cfg = PivConfig::with_window(32, 16);
    cfg.sig2noise_method = Some(Sig2NoiseMethod::PeakToMean);
    let whole = PivProcessor::new(cfg.clone()).unwrap().process_frames(&a, &b).unwrap();

    cfg.max_array_size = Some(5 * 32 * 32);
    let blocked = PivProcessor::new(cfg).unwrap().process_frames(&a, &b).unwrap();
    assert_eq!(whole.blocks, 1);
    assert_eq!(blocked.blocks, 10);
    assert_identical(&whole, &blocked);
}

#[test]
fn rectangular_windows() {
    let (a, b) = frame_pair(9, 1.5, 2.5);
    let mut cfg = PivConfig::with_window(32, 16);
    cfg.window_size = fftpiv::Shape2::new(32, 48);
    cfg.overlap = fftpiv::Shape2::new(16, 24);
    cfg.subpixel_method = fftpiv::SubpixelMethod::Parabolic;
    let piv = PivProcessor::new(cfg).unwrap();
    let field = piv.process_frames(&a, &b).unwrap();
    assert_eq!((field.shape.rows, field.shape.cols), (7, 4));
    let coords = piv.coordinates(fftpiv::Shape2::square(128)).unwrap();
    assert_eq!(coords.shape(), field.shape);

    let n = field.u.len() as f32;
    let mean_u = field.u.iter().sum::<f32>() / n;
    let mean_v = field.v.iter().sum::<f32>() / n;
    assert!((mean_u - 2.5).abs() < 0.25, "mean u = {mean_u}");
    assert!((mean_v - 1.5).abs() < 0.25, "mean v = {mean_v}");
}
