//! Signal-to-noise ratio of correlation maps.
//!
//! Both measures compare the height of the first peak against a noise level:
//! the second peak outside the exclusion square (`peak2peak`) or the mean of
//! the whole map (`peak2mean`). Maps whose first peak is weak or sits on the
//! border score 0, and so does any ratio that is not a number.

use std::str::FromStr;

use crate::correlate::CorrelationBatch;
use crate::grid::Shape2;
use crate::peak::{find_all_second_peaks, find_first_peak, find_second_peak, Peak};
use crate::trace::trace_span;
use crate::util::math::mean;
use crate::util::par::map_windows;
use crate::util::PivError;

/// First peaks below this amplitude score 0.
pub const MIN_PEAK_AMPLITUDE: f32 = 1e-3;

/// Signal-to-noise measure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sig2NoiseMethod {
    /// First peak over second peak.
    PeakToPeak,
    /// First peak over the absolute map mean.
    PeakToMean,
}

impl Sig2NoiseMethod {
    /// Canonical method name.
    pub fn name(self) -> &'static str {
        match self {
            Sig2NoiseMethod::PeakToPeak => "peak2peak",
            Sig2NoiseMethod::PeakToMean => "peak2mean",
        }
    }
}

impl FromStr for Sig2NoiseMethod {
    type Err = PivError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "peak2peak" => Ok(Sig2NoiseMethod::PeakToPeak),
            "peak2mean" => Ok(Sig2NoiseMethod::PeakToMean),
            _ => Err(PivError::UnknownMethod {
                kind: "sig2noise",
                name: s.to_string(),
            }),
        }
    }
}

fn first_peak_usable(first: Peak, shape: Shape2) -> bool {
    first.value >= MIN_PEAK_AMPLITUDE && !first.on_border(shape)
}

fn finite_or_zero(ratio: f32) -> f32 {
    if ratio.is_nan() {
        0.0
    } else {
        ratio
    }
}

/// Peak-to-peak ratio given both peaks of one map.
pub fn peak_to_peak(first: Peak, second: Option<Peak>, shape: Shape2) -> f32 {
    if !first_peak_usable(first, shape) {
        return 0.0;
    }
    let Some(second) = second else {
        return 0.0;
    };
    if !(second.value > 0.0) {
        return 0.0;
    }
    if second.on_border(shape) && second.value > 0.5 * first.value {
        return 0.0;
    }
    finite_or_zero(first.value / second.value)
}

/// Peak-to-mean ratio of one map.
pub fn peak_to_mean(map: &[f32], first: Peak, shape: Shape2) -> f32 {
    if !first_peak_usable(first, shape) {
        return 0.0;
    }
    let level = mean(map).abs();
    if level == 0.0 {
        return 0.0;
    }
    finite_or_zero((first.value as f64 / level) as f32)
}

/// Signal-to-noise ratio of a single map.
pub fn sig2noise_ratio(map: &[f32], shape: Shape2, method: Sig2NoiseMethod, width: usize) -> f32 {
    let first = find_first_peak(map, shape);
    match method {
        Sig2NoiseMethod::PeakToPeak => {
            peak_to_peak(first, find_second_peak(map, shape, first, width), shape)
        }
        Sig2NoiseMethod::PeakToMean => peak_to_mean(map, first, shape),
    }
}

/// Signal-to-noise ratio of every map given its first peak.
pub fn sig2noise_batch(
    batch: &CorrelationBatch,
    first: &[Peak],
    method: Sig2NoiseMethod,
    width: usize,
    parallel: bool,
) -> Vec<f32> {
    let shape = batch.shape();
    let _span = trace_span!("sig2noise", windows = batch.count(), method = method.name()).entered();
    match method {
        Sig2NoiseMethod::PeakToPeak => {
            let second = find_all_second_peaks(batch, first, width, parallel);
            first
                .iter()
                .zip(second)
                .map(|(&p1, p2)| peak_to_peak(p1, p2, shape))
                .collect()
        }
        Sig2NoiseMethod::PeakToMean => {
            map_windows(batch.as_slice(), shape.area(), parallel, |idx, map| {
                first
                    .get(idx)
                    .map_or(0.0, |&p1| peak_to_mean(map, p1, shape))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{peak_to_mean, peak_to_peak, sig2noise_batch, sig2noise_ratio, Sig2NoiseMethod};
    use crate::correlate::CorrelationBatch;
    use crate::grid::Shape2;
    use crate::peak::{find_all_first_peaks, Peak};

    fn two_peak_map() -> (Vec<f32>, Shape2) {
        let shape = Shape2::new(7, 7);
        let mut map = vec![0.1f32; 49];
        map[3 * 7 + 3] = 4.0;
        map[5 * 7 + 1] = 2.0;
        (map, shape)
    }

    #[test]
    fn peak2peak_is_first_over_second() {
        let (map, shape) = two_peak_map();
        let snr = sig2noise_ratio(&map, shape, Sig2NoiseMethod::PeakToPeak, 1);
        assert!((snr - 2.0).abs() < 1e-6);
    }

    #[test]
    fn peak2mean_uses_the_map_mean() {
        let (map, shape) = two_peak_map();
        let mean = map.iter().sum::<f32>() / 49.0;
        let snr = sig2noise_ratio(&map, shape, Sig2NoiseMethod::PeakToMean, 1);
        assert!((snr - 4.0 / mean).abs() < 1e-3);
    }

    #[test]
    fn weak_first_peak_scores_zero() {
        let shape = Shape2::new(5, 5);
        let mut map = vec![0.0f32; 25];
        map[12] = 5e-4;
        for method in [Sig2NoiseMethod::PeakToPeak, Sig2NoiseMethod::PeakToMean] {
            assert_eq!(sig2noise_ratio(&map, shape, method, 1), 0.0);
        }
    }

    #[test]
    fn strong_border_second_peak_scores_zero() {
        let shape = Shape2::new(5, 5);
        let p1 = Peak { row: 2, col: 2, value: 1.0 };
        let border = Peak { row: 0, col: 4, value: 0.6 };
        assert_eq!(peak_to_peak(p1, Some(border), shape), 0.0);
        let weak_border = Peak { value: 0.4, ..border };
        assert!((peak_to_peak(p1, Some(weak_border), shape) - 2.5).abs() < 1e-6);
        assert_eq!(peak_to_peak(p1, None, shape), 0.0);
    }

    #[test]
    fn zero_mean_map_scores_zero() {
        let shape = Shape2::new(5, 5);
        let mut map = vec![0.0f32; 25];
        map[12] = 1.0;
        map[0] = -1.0;
        let first = Peak { row: 2, col: 2, value: 1.0 };
        assert_eq!(peak_to_mean(&map, first, shape), 0.0);
        assert_eq!(sig2noise_ratio(&map, shape, Sig2NoiseMethod::PeakToMean, 1), 0.0);
    }

    #[test]
    fn batch_matches_single_maps() {
        let (map, shape) = two_peak_map();
        let mut data = map.clone();
        data.extend(map.iter().map(|v| v * 0.5));
        let batch = CorrelationBatch::from_vec(data, 2, shape).unwrap();
        let first = find_all_first_peaks(&batch, false);
        for method in [Sig2NoiseMethod::PeakToPeak, Sig2NoiseMethod::PeakToMean] {
            let all = sig2noise_batch(&batch, &first, method, 1, false);
            for (i, &value) in all.iter().enumerate() {
                let single = sig2noise_ratio(batch.map(i).unwrap(), shape, method, 1);
                assert_eq!(value, single);
            }
        }
    }

    #[test]
    fn names_parse() {
        assert_eq!("peak2mean".parse::<Sig2NoiseMethod>().unwrap(), Sig2NoiseMethod::PeakToMean);
        assert!("peak2energy".parse::<Sig2NoiseMethod>().is_err());
    }
}
