use fftpiv::correlate::CorrelationBatch;
use fftpiv::peak::find_all_first_peaks;
use fftpiv::snr::{sig2noise_batch, MIN_PEAK_AMPLITUDE};
use fftpiv::{sig2noise_ratio, Frame, PivConfig, PivProcessor, Shape2, Sig2NoiseMethod};

fn peaked_map(shape: Shape2, peak: f32, second: f32) -> Vec<f32> {
    let mut map = vec![0.0f32; shape.area()];
    map[(shape.rows / 2) * shape.cols + shape.cols / 2] = peak;
    map[2 * shape.cols + 2] = second;
    map
}

#[test]
fn weak_correlation_scores_zero() {
    let shape = Shape2::square(16);
    let map = peaked_map(shape, MIN_PEAK_AMPLITUDE * 0.5, MIN_PEAK_AMPLITUDE * 0.1);
    assert_eq!(sig2noise_ratio(&map, shape, Sig2NoiseMethod::PeakToPeak, 2), 0.0);
    assert_eq!(sig2noise_ratio(&map, shape, Sig2NoiseMethod::PeakToMean, 2), 0.0);

    let strong = peaked_map(shape, 1.0, 0.25);
    assert!((sig2noise_ratio(&strong, shape, Sig2NoiseMethod::PeakToPeak, 2) - 4.0).abs() < 1e-6);
}

#[test]
fn missing_second_peak_scores_zero() {
    let shape = Shape2::square(16);
    let map = peaked_map(shape, 1.0, 0.0);
    assert_eq!(sig2noise_ratio(&map, shape, Sig2NoiseMethod::PeakToPeak, 2), 0.0);
}

#[test]
fn batch_keeps_window_order() {
    let shape = Shape2::square(16);
    let mut data = peaked_map(shape, 1.0, 0.5);
    data.extend(peaked_map(shape, 1.0, 0.1));
    let batch = CorrelationBatch::from_vec(data, 2, shape).unwrap();
    let first = find_all_first_peaks(&batch, false);
    let snr = sig2noise_batch(&batch, &first, Sig2NoiseMethod::PeakToPeak, 2, false);
    assert!((snr[0] - 2.0).abs() < 1e-6);
    assert!((snr[1] - 10.0).abs() < 1e-5);
}

#[test]
fn blank_frames_score_zero_in_the_pipeline() {
    let frame = Frame::new(vec![0.0; 64 * 64], 64, 64).unwrap();
    let mut cfg = PivConfig::with_window(32, 16);
    cfg.sig2noise_method = Some(Sig2NoiseMethod::PeakToPeak);
    let field = PivProcessor::new(cfg).unwrap().process_frames(&frame, &frame).unwrap();
    assert!(field.sig2noise.iter().all(|&s| s == 0.0));
}
