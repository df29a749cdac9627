//! Mathematical helpers for window statistics and FFT sizing.

/// Arithmetic mean accumulated in `f64`. Returns 0 for an empty slice.
pub(crate) fn mean(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: f64 = values.iter().map(|&v| v as f64).sum();
    sum / values.len() as f64
}

/// Population standard deviation (`ddof = 0`) around a known mean.
pub(crate) fn population_std(values: &[f32], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum();
    (sum_sq / values.len() as f64).sqrt()
}

/// Length of a zero-padded FFT axis holding a full linear correlation.
///
/// Returns the smallest power of two that is at least `a + b - 1`.
pub(crate) fn padded_len(a: usize, b: usize) -> usize {
    (a + b).saturating_sub(1).max(1).next_power_of_two()
}

#[cfg(test)]
mod tests {
    use super::{mean, padded_len, population_std};

    #[test]
    fn mean_and_std_match_closed_form() {
        let values = [1.0f32, 2.0, 3.0, 4.0];
        let m = mean(&values);
        assert!((m - 2.5).abs() < 1e-12);
        let s = population_std(&values, m);
        assert!((s - 1.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn empty_slice_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(population_std(&[], 0.0), 0.0);
    }

    #[test]
    fn padded_len_rounds_up_to_power_of_two() {
        assert_eq!(padded_len(32, 32), 64);
        assert_eq!(padded_len(3, 2), 4);
        assert_eq!(padded_len(5, 4), 8);
        assert_eq!(padded_len(1, 1), 1);
    }
}
