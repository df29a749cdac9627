//! Frame views and owned frame buffers.
//!
//! `ImageView` is a borrowed 2D view into a 1D buffer with an explicit stride.
//! The stride counts elements between the starts of consecutive rows, so a
//! stride larger than the width represents padded rows. ROI slices are zero-copy
//! views into the same backing slice and retain the original stride.
//!
//! PIV works on floating point grey levels; `Frame` owns a contiguous `f32`
//! buffer and converts from the usual 8- and 16-bit camera formats.

use crate::grid::Shape2;
use crate::util::{PivError, PivResult};

#[cfg(feature = "image-io")]
pub mod io;

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> PivResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> PivResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(PivError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the image size as `(rows, cols)`.
    pub fn shape(&self) -> Shape2 {
        Shape2::new(self.height, self.width)
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y.checked_mul(self.stride)?.checked_add(x)?;
        self.data.get(idx)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width)?;
        self.data.get(start..end)
    }

    /// Returns a zero-copy ROI view into the same backing buffer.
    pub fn roi(&self, x: usize, y: usize, width: usize, height: usize) -> PivResult<ImageView<'a, T>> {
        if width == 0 || height == 0 {
            return Err(PivError::InvalidDimensions { width, height });
        }
        let fits_x = x.checked_add(width).is_some_and(|end| end <= self.width);
        if !fits_x {
            return Err(PivError::WindowLargerThanImage {
                axis: "cols",
                window: x.saturating_add(width),
                image: self.width,
            });
        }
        let fits_y = y.checked_add(height).is_some_and(|end| end <= self.height);
        if !fits_y {
            return Err(PivError::WindowLargerThanImage {
                axis: "rows",
                window: y.saturating_add(height),
                image: self.height,
            });
        }

        let start = y
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(x))
            .ok_or(PivError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })?;
        let data = self.data.get(start..).ok_or(PivError::BufferTooSmall {
            needed: start.saturating_add(1),
            got: self.data.len(),
        })?;

        ImageView::new(data, width, height, self.stride)
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> PivResult<usize> {
    if width == 0 || height == 0 {
        return Err(PivError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(PivError::InvalidStride { width, stride });
    }
    let needed = (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(PivError::InvalidDimensions { width, height })?;
    Ok(needed)
}

/// Owned contiguous grayscale frame with `f32` grey levels.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl Frame {
    /// Creates a frame from a contiguous row-major buffer.
    pub fn new(data: Vec<f32>, width: usize, height: usize) -> PivResult<Self> {
        let needed = required_len(width, height, width)?;
        if data.len() < needed {
            return Err(PivError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(PivError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Creates a frame from 8-bit grey levels.
    pub fn from_u8(data: &[u8], width: usize, height: usize) -> PivResult<Self> {
        Self::new(data.iter().map(|&v| v as f32).collect(), width, height)
    }

    /// Creates a frame from 16-bit grey levels.
    pub fn from_u16(data: &[u16], width: usize, height: usize) -> PivResult<Self> {
        Self::new(data.iter().map(|&v| v as f32).collect(), width, height)
    }

    /// Creates a frame by copying a (possibly strided) view.
    pub fn from_view(view: ImageView<'_, f32>) -> PivResult<Self> {
        let mut data = Vec::with_capacity(view.width() * view.height());
        for y in 0..view.height() {
            let row = view.row(y).ok_or(PivError::BufferTooSmall {
                needed: (y + 1) * view.stride(),
                got: view.as_slice().len(),
            })?;
            data.extend_from_slice(row);
        }
        Self::new(data, view.width(), view.height())
    }

    /// Returns the frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the frame height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the grey levels in row-major order.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns a borrowed view of the frame.
    pub fn view(&self) -> ImageView<'_, f32> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }
}
