//! Spectral transform backends for FFT correlation.
//!
//! The correlator never calls an FFT library directly. It asks a
//! `SpectralTransform` for a `SpectralPlan` of the window shape and uses the
//! plan's forward transform, inverse transform and shift. `RustFftTransform`
//! is the default CPU backend built on `rustfft`; other backends can be
//! injected through `Correlator::with_transform`.

use std::sync::{Arc, Mutex, PoisonError};

use rustfft::num_complex::Complex32;
use rustfft::{Fft, FftPlanner};

use crate::grid::Shape2;

/// A 2D transform prepared for one fixed shape.
pub trait SpectralPlan: Send + Sync {
    /// Shape the plan operates on.
    fn shape(&self) -> Shape2;

    /// Forward 2D FFT of a real, row-major input into a full complex spectrum.
    ///
    /// Both slices hold `shape().area()` elements.
    fn forward_real(&self, input: &[f32], spectrum: &mut [Complex32]);

    /// Inverse 2D FFT keeping the real part, normalized by the area.
    ///
    /// `spectrum` is used as scratch and left in an unspecified state.
    fn inverse_real(&self, spectrum: &mut [Complex32], output: &mut [f32]);

    /// Moves the zero-frequency (zero-lag) sample to the center of the map.
    fn shift(&self, data: &mut [f32]) {
        fftshift(data, self.shape());
    }
}

/// Factory of spectral plans.
pub trait SpectralTransform: Send + Sync {
    /// Plan type produced by this backend.
    type Plan: SpectralPlan;

    /// Prepares a plan for `shape`.
    fn plan(&self, shape: Shape2) -> Self::Plan;
}

/// Rolls a row-major map by half its size along both axes.
///
/// Sample `(r, c)` moves to `((r + rows / 2) % rows, (c + cols / 2) % cols)`.
pub fn fftshift(data: &mut [f32], shape: Shape2) {
    let rows = shape.rows;
    let cols = shape.cols;
    if rows == 0 || cols == 0 || data.len() != rows * cols {
        return;
    }
    let src = data.to_vec();
    let dr = rows / 2;
    let dc = cols / 2;
    for r in 0..rows {
        let dst_row = ((r + dr) % rows) * cols;
        let src_row = &src[r * cols..(r + 1) * cols];
        for (c, &value) in src_row.iter().enumerate() {
            data[dst_row + (c + dc) % cols] = value;
        }
    }
}

/// CPU spectral backend on top of `rustfft`.
///
/// Plans are cached by the inner planner, so repeated requests for the same
/// window shape are cheap.
pub struct RustFftTransform {
    planner: Mutex<FftPlanner<f32>>,
}

impl RustFftTransform {
    /// Creates a backend with an empty plan cache.
    pub fn new() -> Self {
        Self {
            planner: Mutex::new(FftPlanner::new()),
        }
    }
}

impl Default for RustFftTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectralTransform for RustFftTransform {
    type Plan = RustFftPlan;

    fn plan(&self, shape: Shape2) -> RustFftPlan {
        let mut planner = self.planner.lock().unwrap_or_else(PoisonError::into_inner);
        RustFftPlan {
            shape,
            row_forward: planner.plan_fft_forward(shape.cols),
            col_forward: planner.plan_fft_forward(shape.rows),
            row_inverse: planner.plan_fft_inverse(shape.cols),
            col_inverse: planner.plan_fft_inverse(shape.rows),
        }
    }
}

/// Separable 2D FFT plan: row transforms, then column transforms on a
/// transposed copy.
pub struct RustFftPlan {
    shape: Shape2,
    row_forward: Arc<dyn Fft<f32>>,
    col_forward: Arc<dyn Fft<f32>>,
    row_inverse: Arc<dyn Fft<f32>>,
    col_inverse: Arc<dyn Fft<f32>>,
}

impl RustFftPlan {
    fn transform(&self, buffer: &mut [Complex32], rows_fft: &dyn Fft<f32>, cols_fft: &dyn Fft<f32>) {
        let rows = self.shape.rows;
        let cols = self.shape.cols;
        rows_fft.process(buffer);

        let mut transposed = vec![Complex32::new(0.0, 0.0); rows * cols];
        for r in 0..rows {
            for c in 0..cols {
                transposed[c * rows + r] = buffer[r * cols + c];
            }
        }
        cols_fft.process(&mut transposed);
        for c in 0..cols {
            for r in 0..rows {
                buffer[r * cols + c] = transposed[c * rows + r];
            }
        }
    }
}

impl SpectralPlan for RustFftPlan {
    fn shape(&self) -> Shape2 {
        self.shape
    }

    fn forward_real(&self, input: &[f32], spectrum: &mut [Complex32]) {
        for (dst, &src) in spectrum.iter_mut().zip(input) {
            *dst = Complex32::new(src, 0.0);
        }
        self.transform(spectrum, self.row_forward.as_ref(), self.col_forward.as_ref());
    }

    fn inverse_real(&self, spectrum: &mut [Complex32], output: &mut [f32]) {
        self.transform(spectrum, self.row_inverse.as_ref(), self.col_inverse.as_ref());
        let scale = 1.0 / self.shape.area() as f32;
        for (dst, src) in output.iter_mut().zip(spectrum.iter()) {
            *dst = src.re * scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{fftshift, RustFftTransform, SpectralPlan, SpectralTransform};
    use crate::grid::Shape2;
    use rustfft::num_complex::Complex32;

    #[test]
    fn fftshift_moves_origin_to_center() {
        let mut data = vec![0.0f32; 12];
        data[0] = 1.0;
        fftshift(&mut data, Shape2::new(3, 4));
        assert_eq!(data[4 + 2], 1.0);
        assert_eq!(data.iter().filter(|&&v| v != 0.0).count(), 1);
    }

    #[test]
    fn forward_then_inverse_restores_input() {
        let shape = Shape2::new(4, 6);
        let plan = RustFftTransform::new().plan(shape);
        let input: Vec<f32> = (0..shape.area()).map(|v| (v as f32 * 0.37).sin()).collect();
        let mut spectrum = vec![Complex32::new(0.0, 0.0); shape.area()];
        plan.forward_real(&input, &mut spectrum);
        let mut output = vec![0.0f32; shape.area()];
        plan.inverse_real(&mut spectrum, &mut output);
        for (a, b) in input.iter().zip(&output) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn dc_bin_holds_the_sum() {
        let shape = Shape2::new(2, 2);
        let plan = RustFftTransform::new().plan(shape);
        let mut spectrum = vec![Complex32::new(0.0, 0.0); 4];
        plan.forward_real(&[1.0, 2.0, 3.0, 4.0], &mut spectrum);
        assert!((spectrum[0].re - 10.0).abs() < 1e-6);
        assert!(spectrum[0].im.abs() < 1e-6);
    }
}
