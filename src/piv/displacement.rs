//! Conversion of refined correlation peaks into displacements.

use crate::grid::Shape2;
use crate::peak::Peak;
use crate::refine::SubpixelOffset;

/// Half-width of the border band where a first peak is rejected.
pub const MASK_WIDTH: usize = 1;

/// Converts refined peaks into `(u, v)` displacements written at `out_offset`.
///
/// `v = row + d_row - rows / 2` and `u = col + d_col - cols / 2`, both divided
/// by `dt`. Windows whose peak touches the border band, or whose displacement
/// is not finite, are written as NaN. Returns the number of such windows.
pub fn correlation_to_displacements(
    peaks: &[Peak],
    offsets: &[SubpixelOffset],
    corr_shape: Shape2,
    dt: f32,
    u: &mut [f32],
    v: &mut [f32],
) -> usize {
    let center_row = (corr_shape.rows / 2) as f32;
    let center_col = (corr_shape.cols / 2) as f32;
    let mut invalid = 0;
    for (((peak, offset), u), v) in peaks.iter().zip(offsets).zip(u.iter_mut()).zip(v.iter_mut()) {
        if peak.near_border(corr_shape, MASK_WIDTH) {
            *u = f32::NAN;
            *v = f32::NAN;
            invalid += 1;
            continue;
        }
        let dv = (peak.row as f32 + offset.d_row - center_row) / dt;
        let du = (peak.col as f32 + offset.d_col - center_col) / dt;
        if du.is_finite() && dv.is_finite() {
            *u = du;
            *v = dv;
        } else {
            *u = f32::NAN;
            *v = f32::NAN;
            invalid += 1;
        }
    }
    invalid
}
