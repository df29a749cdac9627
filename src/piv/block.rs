//! Memory-bounded split of the window grid into sequential blocks.

use std::ops::Range;

use crate::util::{PivError, PivResult};

/// Split of a window grid into contiguous blocks bounded by a memory ceiling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockPlan {
    window_count: usize,
    windows_per_block: usize,
}

impl BlockPlan {
    /// Plans blocks for `window_count` windows of `window_area` elements each.
    ///
    /// Returns `Ok(None)` when the whole batch fits under `max_elements`.
    pub fn new(max_elements: usize, window_area: usize, window_count: usize) -> PivResult<Option<Self>> {
        let total = window_count.saturating_mul(window_area);
        if total <= max_elements {
            return Ok(None);
        }
        let windows_per_block = max_elements / window_area.max(1);
        if windows_per_block == 0 {
            return Err(PivError::MemoryCeilingTooSmall {
                max_elements,
                window_area,
            });
        }
        Ok(Some(Self {
            window_count,
            windows_per_block,
        }))
    }

    /// Windows handled by every block but possibly the last.
    pub fn windows_per_block(&self) -> usize {
        self.windows_per_block
    }

    /// Number of blocks, `ceil(window_count / windows_per_block)`.
    pub fn num_blocks(&self) -> usize {
        self.window_count.div_ceil(self.windows_per_block)
    }

    /// Window index ranges of the blocks, in order.
    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.num_blocks()).map(move |b| {
            let start = b * self.windows_per_block;
            start..(start + self.windows_per_block).min(self.window_count)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::BlockPlan;
    use crate::util::PivError;

    #[test]
    fn fits_without_blocks() {
        assert_eq!(BlockPlan::new(1000, 10, 100).unwrap(), None);
    }

    #[test]
    fn ranges_cover_every_window_once() {
        let plan = BlockPlan::new(35, 10, 10).unwrap().unwrap();
        assert_eq!(plan.windows_per_block(), 3);
        assert_eq!(plan.num_blocks(), 4);
        let ranges: Vec<_> = plan.ranges().collect();
        assert_eq!(ranges, vec![0..3, 3..6, 6..9, 9..10]);
    }

    #[test]
    fn ceiling_below_one_window_fails() {
        let err = BlockPlan::new(5, 10, 10).unwrap_err();
        assert!(matches!(err, PivError::MemoryCeilingTooSmall { .. }));
    }
}
