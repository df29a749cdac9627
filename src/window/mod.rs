//! Interrogation window batches.
//!
//! A `WindowBatch` stores `count` windows of `rows x cols` pixels back to back
//! in one contiguous buffer, in row-major window order of the field grid.
//! Batches are built per call (or per block) and dropped once correlated.

use std::ops::Range;

use crate::grid::{field_shape, Shape2};
use crate::image::ImageView;
use crate::util::par::for_each_window_mut;
use crate::util::{PivError, PivResult};

mod normalize;

pub use normalize::{normalize_intensity, normalize_window};

/// Contiguous stack of equally sized windows.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowBatch {
    count: usize,
    shape: Shape2,
    data: Vec<f32>,
}

impl WindowBatch {
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
            .ok_or(PivError::InvalidInput("window batch too large"))?;
        if data.len() != needed {
            return Err(PivError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self { count, shape, data })
    }

    /// Number of windows in the batch.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Shape of every window.
    pub fn shape(&self) -> Shape2 {
        self.shape
    }

    /// Returns window `idx` in row-major order.
    pub fn window(&self, idx: usize) -> Option<&[f32]> {
        let area = self.shape.area();
        let start = idx.checked_mul(area)?;
        self.data.get(start..start + area)
    }

    /// Returns the whole batch buffer.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

/// Gathers the interrogation windows of `image` into a batch.
///
/// Window `k` of the field (row-major) has its top-left corner at
/// `(row * (window.rows - overlap.rows), col * (window.cols - overlap.cols))`.
/// `block` restricts the gather to a contiguous range of window indices; its
/// end is clamped to the window count.
pub fn extract_windows(
    image: ImageView<'_, f32>,
    window: Shape2,
    overlap: Shape2,
    block: Option<Range<usize>>,
    parallel: bool,
) -> PivResult<WindowBatch> {
    let field = field_shape(image.shape(), window, overlap)?;
    let total = field.len();
    let range = match block {
        Some(r) => {
            let end = r.end.min(total);
            if r.start > end {
                return Err(PivError::BlockRangeOutOfBounds {
                    start: r.start,
                    end: r.end,
                    count: total,
                });
            }
            r.start..end
        }
        None => 0..total,
    };

    let step_rows = window.rows - overlap.rows;
    let step_cols = window.cols - overlap.cols;

    // The last window has the largest origin on both axes.
    image.roi(
        (field.cols - 1) * step_cols,
        (field.rows - 1) * step_rows,
        window.cols,
        window.rows,
    )?;

    let count = range.len();
    let area = window.area();
    let mut data = vec![0.0f32; count * area];
    let src = image.as_slice();
    let stride = image.stride();
    let first = range.start;

    for_each_window_mut(&mut data, area, parallel, |local, dst| {
        let idx = first + local;
        let y0 = (idx / field.cols) * step_rows;
        let x0 = (idx % field.cols) * step_cols;
        for (r, dst_row) in dst.chunks_exact_mut(window.cols).enumerate() {
            let start = (y0 + r) * stride + x0;
            dst_row.copy_from_slice(&src[start..start + window.cols]);
        }
    });

    WindowBatch::from_vec(data, count, window)
}
