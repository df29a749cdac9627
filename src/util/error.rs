//! Error types for fftpiv.

use thiserror::Error;

/// Result alias for fftpiv operations.
pub type PivResult<T> = std::result::Result<T, PivError>;

/// Errors that can occur when configuring or running a PIV evaluation.
///
/// Only configuration and unsupported-path problems are errors. Numerical
/// failures inside a single window (border peaks, degenerate fits) are
/// reported as NaN displacements plus counters on the result instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PivError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Width or height is zero or too large to address.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is shorter than the declared layout.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Overlap is not strictly smaller than the window along an axis.
    #[error("overlap {overlap} must be smaller than window size {window} along {axis}")]
    OverlapTooLarge {
        axis: &'static str,
        window: usize,
        overlap: usize,
    },
    /// Search area is smaller than the interrogation window along an axis.
    #[error("search area {search} cannot be smaller than window size {window} along {axis}")]
    SearchAreaTooSmall {
        axis: &'static str,
        window: usize,
        search: usize,
    },
    /// Window does not fit into the image along an axis.
    #[error("window size {window} cannot be larger than the image ({image}) along {axis}")]
    WindowLargerThanImage {
        axis: &'static str,
        window: usize,
        image: usize,
    },
    /// The two frames of a pair have different shapes.
    #[error("frame shapes differ: {a_rows}x{a_cols} vs {b_rows}x{b_cols}")]
    FrameShapeMismatch {
        a_rows: usize,
        a_cols: usize,
        b_rows: usize,
        b_cols: usize,
    },
    /// Two window batches cannot be correlated element-wise.
    #[error("batch shapes differ: {a_count}x{a_rows}x{a_cols} vs {b_count}x{b_rows}x{b_cols}")]
    BatchShapeMismatch {
        a_count: usize,
        a_rows: usize,
        a_cols: usize,
        b_count: usize,
        b_rows: usize,
        b_cols: usize,
    },
    /// Requested block of windows starts past the end of the window grid.
    #[error("block range {start}..{end} is outside of {count} windows")]
    BlockRangeOutOfBounds {
        start: usize,
        end: usize,
        count: usize,
    },
    /// Memory ceiling cannot hold even a single window.
    #[error("memory ceiling of {max_elements} elements is smaller than one window ({window_area})")]
    MemoryCeilingTooSmall {
        max_elements: usize,
        window_area: usize,
    },
    /// A method name did not match any supported method.
    #[error("unknown {kind} method: {name}")]
    UnknownMethod { kind: &'static str, name: String },
    /// A configuration requests a code path that is not supported.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
    /// Image decoding failed.
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
}
