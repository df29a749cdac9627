//! Correlation peak search.
//!
//! The first peak of a map is its maximum (first occurrence in row-major
//! order wins, NaN is never selected). The second peak is the maximum outside
//! a square of half-width `width` around the first one. Excluded samples are
//! overwritten with `NO_VALUE` in a scratch copy of the maps; the argmax skips
//! that sentinel, so it can never be reported as a peak.

use crate::correlate::CorrelationBatch;
use crate::grid::Shape2;
use crate::trace::trace_span;
use crate::util::par::map_windows;

/// Sentinel written over excluded samples during the second-peak search.
pub const NO_VALUE: f32 = f32::NEG_INFINITY;

/// Integer peak location and amplitude in a correlation map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    /// Row index of the peak.
    pub row: usize,
    /// Column index of the peak.
    pub col: usize,
    /// Correlation value at the peak.
    pub value: f32,
}

impl Peak {
    /// Returns true when the peak lies within `margin` samples of any border.
    ///
    /// `margin = 1` flags peaks on the first or last row or column.
    pub fn near_border(&self, shape: Shape2, margin: usize) -> bool {
        self.row < margin
            || self.col < margin
            || self.row + margin >= shape.rows
            || self.col + margin >= shape.cols
    }

    /// Returns true when the peak lies on the first or last row or column.
    pub fn on_border(&self, shape: Shape2) -> bool {
        self.near_border(shape, 1)
    }
}

fn argmax(map: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &value) in map.iter().enumerate() {
        if value == NO_VALUE || value.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((idx, value)),
        }
    }
    best
}

fn to_peak(found: Option<(usize, f32)>, shape: Shape2) -> Option<Peak> {
    found.map(|(idx, value)| Peak {
        row: idx / shape.cols,
        col: idx % shape.cols,
        value,
    })
}

/// Finds the maximum of a single map.
///
/// A map without any usable sample reports a NaN peak at `(0, 0)`, which sits
/// on the border and is therefore treated as invalid downstream.
pub fn find_first_peak(map: &[f32], shape: Shape2) -> Peak {
    to_peak(argmax(map), shape).unwrap_or(Peak {
        row: 0,
        col: 0,
        value: f32::NAN,
    })
}

/// Overwrites the clamped `(2 * width + 1)`-square around `center` with `NO_VALUE`.
fn mask_around(map: &mut [f32], shape: Shape2, center: Peak, width: usize) {
    let r0 = center.row.saturating_sub(width);
    let r1 = (center.row + width + 1).min(shape.rows);
    let c0 = center.col.saturating_sub(width);
    let c1 = (center.col + width + 1).min(shape.cols);
    for r in r0..r1 {
        map[r * shape.cols + c0..r * shape.cols + c1].fill(NO_VALUE);
    }
}

/// Finds the second peak of a single map, excluding the neighbourhood of `first`.
///
/// Returns `None` when every sample is excluded. The input map is not modified.
pub fn find_second_peak(map: &[f32], shape: Shape2, first: Peak, width: usize) -> Option<Peak> {
    let mut scratch = map.to_vec();
    mask_around(&mut scratch, shape, first, width);
    to_peak(argmax(&scratch), shape)
}

/// First peak of every map in the batch; entry `i` belongs to window `i`.
pub fn find_all_first_peaks(batch: &CorrelationBatch, parallel: bool) -> Vec<Peak> {
    let shape = batch.shape();
    map_windows(batch.as_slice(), shape.area(), parallel, |_, map| {
        find_first_peak(map, shape)
    })
}

/// Second peak of every map in the batch given the first peaks.
///
/// The exclusion squares are written into one scratch copy of the whole
/// batch, then the same argmax as for the first peak runs on every map.
pub fn find_all_second_peaks(
    batch: &CorrelationBatch,
    first: &[Peak],
    width: usize,
    parallel: bool,
) -> Vec<Option<Peak>> {
    let shape = batch.shape();
    let area = shape.area();
    let _span = trace_span!("second_peaks", windows = batch.count(), width = width).entered();

    let mut scratch = batch.as_slice().to_vec();
    for (map, &peak) in scratch.chunks_exact_mut(area).zip(first) {
        mask_around(map, shape, peak, width);
    }
    map_windows(&scratch, area, parallel, |_, map| to_peak(argmax(map), shape))
}
