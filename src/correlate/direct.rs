//! Direct (spatial domain) full correlation.
//!
//! Computes `convolve2d(a, flip(b), "full")` one row pair at a time. Every
//! output sample at lag `s = k - (b.shape - 1)` is a sum of row dot products
//! over the overlap of `a` and `b` shifted by `s`. With the `simd` feature the
//! dot products run on `f32x8` lanes.

use crate::grid::Shape2;

#[cfg(feature = "simd")]
use wide::f32x8;

#[cfg(feature = "simd")]
const LANES: usize = 8;

/// Full 2D correlation of `a` with `b`, equal to convolving `a` with flipped `b`.
///
/// Returns a row-major map of shape `(a.rows + b.rows - 1, a.cols + b.cols - 1)`.
pub fn correlate_direct(a: &[f32], a_shape: Shape2, b: &[f32], b_shape: Shape2) -> Vec<f32> {
    let out_rows = a_shape.rows + b_shape.rows - 1;
    let out_cols = a_shape.cols + b_shape.cols - 1;
    let mut out = vec![0.0f32; out_rows * out_cols];

    for kr in 0..out_rows {
        let sr = kr as isize - (b_shape.rows as isize - 1);
        let r0 = sr.max(0) as usize;
        let r1 = (a_shape.rows as isize).min(b_shape.rows as isize + sr) as usize;
        for kc in 0..out_cols {
            let sc = kc as isize - (b_shape.cols as isize - 1);
            let c0 = sc.max(0) as usize;
            let c1 = (a_shape.cols as isize).min(b_shape.cols as isize + sc) as usize;
            if c0 >= c1 {
                continue;
            }
            let mut acc = 0.0f32;
            for ra in r0..r1 {
                let rb = (ra as isize - sr) as usize;
                let a_row = &a[ra * a_shape.cols + c0..ra * a_shape.cols + c1];
                let b_start = rb * b_shape.cols + (c0 as isize - sc) as usize;
                let b_row = &b[b_start..b_start + (c1 - c0)];
                acc += dot(a_row, b_row);
            }
            out[kr * out_cols + kc] = acc;
        }
    }
    out
}

#[cfg(not(feature = "simd"))]
#[inline]
fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(feature = "simd")]
#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

/// Horizontal sum of f32x8.
#[cfg(feature = "simd")]
#[inline]
fn hsum(v: f32x8) -> f32 {
    let arr = v.to_array();
    arr[0] + arr[1] + arr[2] + arr[3] + arr[4] + arr[5] + arr[6] + arr[7]
}

#[cfg(feature = "simd")]
#[inline]
fn dot(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    let simd_end = len / LANES * LANES;
    let mut acc = f32x8::ZERO;
    let mut i = 0;
    while i < simd_end {
        acc += load_f32x8(&a[i..]) * load_f32x8(&b[i..]);
        i += LANES;
    }
    let mut tail = 0.0f32;
    while i < len {
        tail += a[i] * b[i];
        i += 1;
    }
    hsum(acc) + tail
}

#[cfg(test)]
mod tests {
    use super::correlate_direct;
    use crate::grid::Shape2;

    #[test]
    fn matches_hand_computed_convolution() {
        // convolve2d([[1, 2], [3, 4]], flip([[1, 0], [0, 1]]), "full")
        let a = [1.0f32, 2.0, 3.0, 4.0];
        let b = [1.0f32, 0.0, 0.0, 1.0];
        let out = correlate_direct(&a, Shape2::square(2), &b, Shape2::square(2));
        assert_eq!(out, vec![1.0, 2.0, 0.0, 3.0, 5.0, 2.0, 0.0, 3.0, 4.0]);
    }

    #[test]
    fn zero_lag_holds_the_dot_product() {
        let a: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let shape = Shape2::new(3, 4);
        let out = correlate_direct(&a, shape, &a, shape);
        let expected: f32 = a.iter().map(|v| v * v).sum();
        let zero_lag = 2 * 7 + 3;
        assert_eq!(out[zero_lag], expected);
    }
}
