//! Per-window intensity normalization.

use crate::util::math::{mean, population_std};
use crate::util::par::for_each_window_mut;
use crate::window::WindowBatch;

/// Normalizes a single window in place.
///
/// The mean is removed, the residue is divided by the population standard
/// deviation (a flat window becomes all zeros) and negative values are clipped
/// to zero.
pub fn normalize_window(window: &mut [f32]) {
    let m = mean(window);
    let std = population_std(window, m);
    if std == 0.0 || !std.is_finite() {
        window.fill(0.0);
        return;
    }
    let max = window
        .iter()
        .map(|&v| ((v as f64 - m) / std) as f32)
        .fold(0.0f32, f32::max);
    for v in window.iter_mut() {
        let z = ((*v as f64 - m) / std) as f32;
        *v = z.clamp(0.0, max);
    }
}

/// Normalizes every window of the batch independently.
pub fn normalize_intensity(batch: &mut WindowBatch, parallel: bool) {
    let area = batch.shape().area();
    for_each_window_mut(batch.as_mut_slice(), area, parallel, |_, window| {
        normalize_window(window)
    });
}

#[cfg(test)]
mod tests {
    use super::{normalize_intensity, normalize_window};
    use crate::grid::Shape2;
    use crate::window::WindowBatch;

    #[test]
    fn flat_window_becomes_zero() {
        let mut w = vec![5.0f32; 9];
        normalize_window(&mut w);
        assert!(w.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn values_are_standardized_and_clipped() {
        let mut w = vec![0.0f32, 0.0, 2.0, 2.0];
        normalize_window(&mut w);
        assert_eq!(w, vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn windows_do_not_mix() {
        let data = vec![0.0f32, 0.0, 2.0, 2.0, 7.0, 7.0, 7.0, 7.0];
        let mut batch = WindowBatch::from_vec(data, 2, Shape2::square(2)).unwrap();
        normalize_intensity(&mut batch, false);
        assert_eq!(batch.window(0).unwrap(), &[0.0, 0.0, 1.0, 1.0]);
        assert_eq!(batch.window(1).unwrap(), &[0.0, 0.0, 0.0, 0.0]);
    }
}
