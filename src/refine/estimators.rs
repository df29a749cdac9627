//! Three-point peak offset estimators.
//!
//! Each estimator takes the samples at `x = -1, 0, +1` (`cm`, `c0`, `cp`) and
//! returns the fractional peak offset along that axis, or NaN when the fit is
//! degenerate.

/// Parabolic (quadratic) fit through the three samples.
///
/// Returns NaN when the parabola is not concave.
pub fn parabolic_offset(cm: f32, c0: f32, cp: f32) -> f32 {
    let denom = 2.0 * cm - 4.0 * c0 + 2.0 * cp;
    if !(denom < 0.0) {
        return f32::NAN;
    }
    (cm - cp) / denom
}

/// Gaussian fit: the parabolic fit of the log samples.
///
/// All samples must be strictly positive; the caller decides what to do
/// otherwise.
pub fn gaussian_offset(cm: f32, c0: f32, cp: f32) -> f32 {
    parabolic_offset(cm.ln(), c0.ln(), cp.ln())
}

/// Center of mass of the three samples relative to the middle one.
///
/// Returns NaN when the weights do not sum to a positive value.
pub fn centroid_offset(cm: f32, c0: f32, cp: f32) -> f32 {
    let sum = cm + c0 + cp;
    if !(sum > 0.0) {
        return f32::NAN;
    }
    (cp - cm) / sum
}
