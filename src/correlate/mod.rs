//! FFT cross-correlation of window pairs.
//!
//! The production path is circular correlation of equally shaped windows:
//! `corr = shift(ifft2(conj(fft2(a)) * fft2(b)).re)`. The map has the window
//! shape and zero lag sits at `(rows / 2, cols / 2)`, so a peak at
//! `(rows / 2 + dy, cols / 2 + dx)` means that window `b` holds the pattern of
//! window `a` moved by `(dy, dx)`.
//!
//! For single window pairs the linear (zero-padded) and direct variants are
//! also available. They return the full `Wa + Wb - 1` map of the convolution
//! of `a` with the flipped `b`, with zero lag at `(Wb.rows - 1, Wb.cols - 1)`.

use std::str::FromStr;

use rustfft::num_complex::Complex32;

use crate::grid::Shape2;
use crate::spectral::{RustFftTransform, SpectralPlan, SpectralTransform};
use crate::trace::trace_span;
use crate::util::math::padded_len;
use crate::util::par::for_each_window_mut;
use crate::util::{PivError, PivResult};
use crate::window::WindowBatch;

mod direct;

pub use direct::correlate_direct;

/// How a window pair is correlated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CorrelationMethod {
    /// FFT correlation without padding (periodic boundary).
    #[default]
    Circular,
    /// FFT correlation with zero padding to the full linear size.
    Linear,
    /// Explicit 2D convolution with the flipped second window.
    Direct,
}

impl CorrelationMethod {
    /// Canonical method name.
    pub fn name(self) -> &'static str {
        match self {
            CorrelationMethod::Circular => "circular",
            CorrelationMethod::Linear => "linear",
            CorrelationMethod::Direct => "direct",
        }
    }
}

impl FromStr for CorrelationMethod {
    type Err = PivError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "circular" | "fft" => Ok(CorrelationMethod::Circular),
            "linear" => Ok(CorrelationMethod::Linear),
            "direct" => Ok(CorrelationMethod::Direct),
            _ => Err(PivError::UnknownMethod {
                kind: "correlation",
                name: s.to_string(),
            }),
        }
    }
}

/// A single correlation map.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelationMap {
    shape: Shape2,
    data: Vec<f32>,
}

impl CorrelationMap {
    /// Shape of the map.
    pub fn shape(&self) -> Shape2 {
        self.shape
    }

    /// Map values in row-major order.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Value at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.shape.rows || col >= self.shape.cols {
            return None;
        }
        self.data.get(row * self.shape.cols + col).copied()
    }
}

/// Correlation maps of a window batch, one per window pair, in batch order.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelationBatch {
    count: usize,
    shape: Shape2,
    data: Vec<f32>,
}

impl CorrelationBatch {
    /// Wraps an existing buffer of `count * shape.area()` values.
    pub fn from_vec(data: Vec<f32>, count: usize, shape: Shape2) -> PivResult<Self> {
        if shape.rows == 0 || shape.cols == 0 {
            return Err(PivError::InvalidDimensions {
                width: shape.cols,
                height: shape.rows,
            });
        }
        let needed = count
            .checked_mul(shape.area())
            .ok_or(PivError::InvalidInput("correlation batch too large"))?;
        if data.len() != needed {
            return Err(PivError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self { count, shape, data })
    }

    /// Number of maps.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Shape of every map.
    pub fn shape(&self) -> Shape2 {
        self.shape
    }

    /// Returns map `idx`.
    pub fn map(&self, idx: usize) -> Option<&[f32]> {
        let area = self.shape.area();
        let start = idx.checked_mul(area)?;
        self.data.get(start..start + area)
    }

    /// Returns the whole batch buffer.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Cross-correlates window pairs through an injected spectral backend.
pub struct Correlator<S = RustFftTransform> {
    transform: S,
}

impl Correlator<RustFftTransform> {
    /// Creates a correlator with the default `rustfft` backend.
    pub fn new() -> Self {
        Self {
            transform: RustFftTransform::new(),
        }
    }
}

impl Default for Correlator<RustFftTransform> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SpectralTransform> Correlator<S> {
    /// Creates a correlator on top of a custom spectral backend.
    pub fn with_transform(transform: S) -> Self {
        Self { transform }
    }

    /// Returns the spectral backend.
    pub fn transform(&self) -> &S {
        &self.transform
    }

    /// Circular correlation of every window pair `(a[i], b[i])`.
    pub fn correlate_batch(
        &self,
        a: &WindowBatch,
        b: &WindowBatch,
        parallel: bool,
    ) -> PivResult<CorrelationBatch> {
        if a.count() != b.count() || a.shape() != b.shape() {
            return Err(PivError::BatchShapeMismatch {
                a_count: a.count(),
                a_rows: a.shape().rows,
                a_cols: a.shape().cols,
                b_count: b.count(),
                b_rows: b.shape().rows,
                b_cols: b.shape().cols,
            });
        }
        let shape = a.shape();
        let area = shape.area();
        let _span = trace_span!("correlate_batch", windows = a.count(), area = area).entered();

        let plan = self.transform.plan(shape);
        let mut data = vec![0.0f32; a.count() * area];
        let a_data = a.as_slice();
        let b_data = b.as_slice();
        for_each_window_mut(&mut data, area, parallel, |idx, out| {
            let range = idx * area..(idx + 1) * area;
            circular_pair(&plan, &a_data[range.clone()], &b_data[range], out);
        });

        CorrelationBatch::from_vec(data, a.count(), shape)
    }

    /// Correlates a single window pair with the requested method.
    ///
    /// `circular` requires equal shapes and returns a map of that shape;
    /// `linear` and `direct` return the full `a + b - 1` map.
    pub fn correlate_windows(
        &self,
        a: &[f32],
        a_shape: Shape2,
        b: &[f32],
        b_shape: Shape2,
        method: CorrelationMethod,
    ) -> PivResult<CorrelationMap> {
        check_window(a, a_shape)?;
        check_window(b, b_shape)?;
        match method {
            CorrelationMethod::Circular => {
                if a_shape != b_shape {
                    return Err(PivError::BatchShapeMismatch {
                        a_count: 1,
                        a_rows: a_shape.rows,
                        a_cols: a_shape.cols,
                        b_count: 1,
                        b_rows: b_shape.rows,
                        b_cols: b_shape.cols,
                    });
                }
                let plan = self.transform.plan(a_shape);
                let mut data = vec![0.0f32; a_shape.area()];
                circular_pair(&plan, a, b, &mut data);
                Ok(CorrelationMap {
                    shape: a_shape,
                    data,
                })
            }
            CorrelationMethod::Linear => Ok(self.linear_pair(a, a_shape, b, b_shape)),
            CorrelationMethod::Direct => Ok(CorrelationMap {
                shape: full_shape(a_shape, b_shape),
                data: correlate_direct(a, a_shape, b, b_shape),
            }),
        }
    }

    fn linear_pair(&self, a: &[f32], a_shape: Shape2, b: &[f32], b_shape: Shape2) -> CorrelationMap {
        let full = full_shape(a_shape, b_shape);
        let padded = Shape2::new(
            padded_len(a_shape.rows, b_shape.rows),
            padded_len(a_shape.cols, b_shape.cols),
        );
        let plan = self.transform.plan(padded);

        let mut a_pad = vec![0.0f32; padded.area()];
        for r in 0..a_shape.rows {
            let src = &a[r * a_shape.cols..(r + 1) * a_shape.cols];
            a_pad[r * padded.cols..r * padded.cols + a_shape.cols].copy_from_slice(src);
        }
        let mut b_pad = vec![0.0f32; padded.area()];
        for r in 0..b_shape.rows {
            for c in 0..b_shape.cols {
                let flipped = (b_shape.rows - 1 - r) * b_shape.cols + (b_shape.cols - 1 - c);
                b_pad[r * padded.cols + c] = b[flipped];
            }
        }

        let zero = Complex32::new(0.0, 0.0);
        let mut fa = vec![zero; padded.area()];
        let mut fb = vec![zero; padded.area()];
        plan.forward_real(&a_pad, &mut fa);
        plan.forward_real(&b_pad, &mut fb);
        for (x, y) in fa.iter_mut().zip(&fb) {
            *x *= *y;
        }
        let mut full_padded = vec![0.0f32; padded.area()];
        plan.inverse_real(&mut fa, &mut full_padded);

        let mut data = Vec::with_capacity(full.area());
        for r in 0..full.rows {
            data.extend_from_slice(&full_padded[r * padded.cols..r * padded.cols + full.cols]);
        }
        CorrelationMap { shape: full, data }
    }
}

fn circular_pair<P: SpectralPlan>(plan: &P, a: &[f32], b: &[f32], out: &mut [f32]) {
    let zero = Complex32::new(0.0, 0.0);
    let mut fa = vec![zero; a.len()];
    let mut fb = vec![zero; b.len()];
    plan.forward_real(a, &mut fa);
    plan.forward_real(b, &mut fb);
    for (x, y) in fa.iter_mut().zip(&fb) {
        *x = x.conj() * *y;
    }
    plan.inverse_real(&mut fa, out);
    plan.shift(out);
}

fn full_shape(a: Shape2, b: Shape2) -> Shape2 {
    Shape2::new(a.rows + b.rows - 1, a.cols + b.cols - 1)
}

fn check_window(data: &[f32], shape: Shape2) -> PivResult<()> {
    if shape.rows == 0 || shape.cols == 0 {
        return Err(PivError::InvalidDimensions {
            width: shape.cols,
            height: shape.rows,
        });
    }
    if data.len() != shape.area() {
        return Err(PivError::BufferTooSmall {
            needed: shape.area(),
            got: data.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{CorrelationMethod, Correlator};
    use crate::grid::Shape2;
    use crate::peak::find_first_peak;
    use crate::util::PivError;
    use crate::window::WindowBatch;

    fn blob(shape: Shape2, cy: f32, cx: f32) -> Vec<f32> {
        let mut out = Vec::with_capacity(shape.area());
        for r in 0..shape.rows {
            for c in 0..shape.cols {
                let dy = r as f32 - cy;
                let dx = c as f32 - cx;
                out.push((-(dx * dx + dy * dy) / 4.0).exp());
            }
        }
        out
    }

    #[test]
    fn circular_peak_sits_at_the_shift() {
        let shape = Shape2::new(16, 20);
        let a = blob(shape, 7.0, 9.0);
        let b = blob(shape, 10.0, 7.0);
        let batch_a = WindowBatch::from_vec(a, 1, shape).unwrap();
        let batch_b = WindowBatch::from_vec(b, 1, shape).unwrap();
        let corr = Correlator::new()
            .correlate_batch(&batch_a, &batch_b, false)
            .unwrap();
        assert_eq!(corr.shape(), shape);
        let peak = find_first_peak(corr.map(0).unwrap(), shape);
        assert_eq!((peak.row, peak.col), (8 + 3, 10 - 2));
    }

    #[test]
    fn linear_matches_direct() {
        let a_shape = Shape2::new(5, 4);
        let b_shape = Shape2::new(3, 6);
        let a: Vec<f32> = (0..a_shape.area()).map(|v| ((v * 7) % 5) as f32).collect();
        let b: Vec<f32> = (0..b_shape.area()).map(|v| ((v * 3) % 4) as f32 - 1.0).collect();
        let correlator = Correlator::new();
        let linear = correlator
            .correlate_windows(&a, a_shape, &b, b_shape, CorrelationMethod::Linear)
            .unwrap();
        let direct = correlator
            .correlate_windows(&a, a_shape, &b, b_shape, CorrelationMethod::Direct)
            .unwrap();
        assert_eq!(linear.shape(), Shape2::new(7, 9));
        assert_eq!(linear.shape(), direct.shape());
        for (l, d) in linear.data().iter().zip(direct.data()) {
            assert!((l - d).abs() < 1e-3, "{l} vs {d}");
        }
    }

    #[test]
    fn circular_rejects_mismatched_batches() {
        let a = WindowBatch::from_vec(vec![0.0; 8], 2, Shape2::square(2)).unwrap();
        let b = WindowBatch::from_vec(vec![0.0; 4], 1, Shape2::square(2)).unwrap();
        let err = Correlator::new().correlate_batch(&a, &b, false).unwrap_err();
        assert!(matches!(err, PivError::BatchShapeMismatch { .. }));
    }

    #[test]
    fn method_names_parse() {
        assert_eq!("fft".parse::<CorrelationMethod>().unwrap(), CorrelationMethod::Circular);
        assert_eq!("Linear".parse::<CorrelationMethod>().unwrap(), CorrelationMethod::Linear);
        assert!("spectral".parse::<CorrelationMethod>().is_err());
    }
}
