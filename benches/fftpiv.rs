use criterion::{criterion_group, criterion_main, Criterion};
use fftpiv::correlate::{CorrelationMethod, Correlator};
use fftpiv::{Frame, PivConfig, PivProcessor, Shape2, Sig2NoiseMethod};
use std::hint::black_box;

fn make_frame(width: usize, height: usize, dy: usize, dx: usize) -> Frame {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let (sy, sx) = (y + 16 - dy, x + 16 - dx);
            let value = ((sx * 13) ^ (sy * 7) ^ (sx * sy)) & 0xFF;
            data.push(value as f32);
        }
    }
    Frame::new(data, width, height).unwrap()
}

fn bench_pipeline(c: &mut Criterion) {
    let a = make_frame(512, 512, 0, 0);
    let b = make_frame(512, 512, 3, 5);

    let mut cfg = PivConfig::with_window(32, 16);
    cfg.sig2noise_method = Some(Sig2NoiseMethod::PeakToPeak);
    let whole = PivProcessor::new(cfg.clone()).unwrap();
    c.bench_function("piv_512_w32_o16", |bench| {
        bench.iter(|| black_box(whole.process_frames(&a, &b).unwrap()));
    });

    let mut blocked_cfg = cfg.clone();
    blocked_cfg.max_array_size = Some(64 * 32 * 32);
    let blocked = PivProcessor::new(blocked_cfg).unwrap();
    c.bench_function("piv_512_w32_o16_blocked", |bench| {
        bench.iter(|| black_box(blocked.process_frames(&a, &b).unwrap()));
    });

    #[cfg(feature = "rayon")]
    {
        let mut par_cfg = cfg;
        par_cfg.parallel = true;
        let parallel = PivProcessor::new(par_cfg).unwrap();
        c.bench_function("piv_512_w32_o16_parallel", |bench| {
            bench.iter(|| black_box(parallel.process_frames(&a, &b).unwrap()));
        });
    }
}

fn bench_single_window(c: &mut Criterion) {
    let a_shape = Shape2::square(32);
    let a: Vec<f32> = (0..a_shape.area()).map(|v| ((v * 37) % 101) as f32).collect();
    let b: Vec<f32> = (0..a_shape.area()).map(|v| ((v * 53) % 97) as f32).collect();
    let correlator = Correlator::new();
    for method in [CorrelationMethod::Linear, CorrelationMethod::Direct] {
        c.bench_function(&format!("window_32_{}", method.name()), |bench| {
            bench.iter(|| {
                black_box(
                    correlator
                        .correlate_windows(&a, a_shape, &b, a_shape, method)
                        .unwrap(),
                )
            });
        });
    }
}

criterion_group!(benches, bench_pipeline, bench_single_window);
criterion_main!(benches);
