//! Per-window iteration helpers with an optional rayon backend.
//!
//! Batches are stored as contiguous `count * area` buffers. These helpers walk
//! them one window at a time, in parallel when the `rayon` feature is enabled
//! and the caller asks for it. Every window is handled by the same closure in
//! isolation, so both paths produce identical results.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Applies `f(window_index, window)` to every `area`-sized chunk of `data`.
pub(crate) fn for_each_window_mut<F>(data: &mut [f32], area: usize, parallel: bool, f: F)
where
    F: Fn(usize, &mut [f32]) + Send + Sync,
{
    if area == 0 {
        return;
    }
    #[cfg(feature = "rayon")]
    if parallel {
        data.par_chunks_mut(area)
            .enumerate()
            .for_each(|(idx, chunk)| f(idx, chunk));
        return;
    }
    let _ = parallel;
    data.chunks_mut(area)
        .enumerate()
        .for_each(|(idx, chunk)| f(idx, chunk));
}

/// Maps every `area`-sized chunk of `data` through `f(window_index, window)`.
pub(crate) fn map_windows<T, F>(data: &[f32], area: usize, parallel: bool, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize, &[f32]) -> T + Send + Sync,
{
    if area == 0 {
        return Vec::new();
    }
    #[cfg(feature = "rayon")]
    if parallel {
        return data
            .par_chunks(area)
            .enumerate()
            .map(|(idx, chunk)| f(idx, chunk))
            .collect();
    }
    let _ = parallel;
    data.chunks(area)
        .enumerate()
        .map(|(idx, chunk)| f(idx, chunk))
        .collect()
}
