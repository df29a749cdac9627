//! Interrogation grid geometry.
//!
//! Windows are laid out on a regular lattice with step `window - overlap` per
//! axis, starting at the top-left pixel. The number of windows per axis is
//! `floor((image - window) / (window - overlap)) + 1`. Coordinates follow the
//! image convention: origin in the top-left corner, `x` grows with the column
//! index and `y` grows with the row index.

use crate::util::{PivError, PivResult};

/// A per-axis size pair in `(rows, cols)` order.
///
/// Used for image sizes, window sizes, overlaps and search areas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Shape2 {
    /// Extent along the row (vertical) axis.
    pub rows: usize,
    /// Extent along the column (horizontal) axis.
    pub cols: usize,
}

impl Shape2 {
    /// Creates a shape from per-axis extents.
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Creates a square shape.
    pub const fn square(size: usize) -> Self {
        Self {
            rows: size,
            cols: size,
        }
    }

    /// Number of elements covered by the shape.
    pub const fn area(&self) -> usize {
        self.rows * self.cols
    }
}

impl From<usize> for Shape2 {
    fn from(size: usize) -> Self {
        Self::square(size)
    }
}

impl From<(usize, usize)> for Shape2 {
    fn from((rows, cols): (usize, usize)) -> Self {
        Self::new(rows, cols)
    }
}

/// Number of interrogation windows along each axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldShape {
    /// Windows along the row axis.
    pub rows: usize,
    /// Windows along the column axis.
    pub cols: usize,
}

impl FieldShape {
    /// Total number of windows.
    pub const fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Returns true when the field holds no windows.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major index of window `(row, col)`.
    pub const fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }
}

fn axis_count(axis: &'static str, image: usize, window: usize, overlap: usize) -> PivResult<usize> {
    if window == 0 {
        return Err(PivError::InvalidInput("window size must be positive"));
    }
    if overlap >= window {
        return Err(PivError::OverlapTooLarge {
            axis,
            window,
            overlap,
        });
    }
    if window > image {
        return Err(PivError::WindowLargerThanImage {
            axis,
            window,
            image,
        });
    }
    Ok((image - window) / (window - overlap) + 1)
}

/// Computes the number of windows per axis for an image.
///
/// Fails when the overlap is not strictly smaller than the window or when the
/// window does not fit into the image along either axis.
pub fn field_shape(image: Shape2, window: Shape2, overlap: Shape2) -> PivResult<FieldShape> {
    let rows = axis_count("rows", image.rows, window.rows, overlap.rows)?;
    let cols = axis_count("cols", image.cols, window.cols, overlap.cols)?;
    Ok(FieldShape { rows, cols })
}

/// Window-center positions along one axis.
///
/// With `center_on_field`, all positions are moved by the same integer shift
/// so that the margin before the first window and after the last window differ
/// by at most one pixel.
pub fn axis_centers(
    image: usize,
    window: usize,
    overlap: usize,
    center_on_field: bool,
) -> PivResult<Vec<f32>> {
    let n = axis_count("axis", image, window, overlap)?;
    let step = window - overlap;
    let shift = if center_on_field {
        let covered = (n - 1) * step + window - 1;
        ((image - 1 - covered) / 2) as f32
    } else {
        0.0
    };
    let half = window as f32 / 2.0;
    Ok((0..n).map(|i| (i * step) as f32 + half + shift).collect())
}

/// Window-center coordinate grids, row-major with the field shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Coordinates {
    shape: FieldShape,
    x: Vec<f32>,
    y: Vec<f32>,
}

impl Coordinates {
    fn mesh(xs: &[f32], ys: &[f32]) -> Self {
        let shape = FieldShape {
            rows: ys.len(),
            cols: xs.len(),
        };
        let mut x = Vec::with_capacity(shape.len());
        let mut y = Vec::with_capacity(shape.len());
        for &yv in ys {
            for &xv in xs {
                x.push(xv);
                y.push(yv);
            }
        }
        Self { shape, x, y }
    }

    /// Field shape of the grids.
    pub fn shape(&self) -> FieldShape {
        self.shape
    }

    /// Column coordinates of the window centers.
    pub fn x(&self) -> &[f32] {
        &self.x
    }

    /// Row coordinates of the window centers.
    pub fn y(&self) -> &[f32] {
        &self.y
    }

    /// Center of window `(row, col)` as `(x, y)`.
    pub fn at(&self, row: usize, col: usize) -> Option<(f32, f32)> {
        if row >= self.shape.rows || col >= self.shape.cols {
            return None;
        }
        let idx = self.shape.index(row, col);
        Some((self.x[idx], self.y[idx]))
    }
}

/// Window-center grids for square windows.
pub fn coordinates(
    image: Shape2,
    window: usize,
    overlap: usize,
    center_on_field: bool,
) -> PivResult<Coordinates> {
    rect_coordinates(image, Shape2::square(window), Shape2::square(overlap), center_on_field)
}

/// Window-center grids for rectangular windows and per-axis overlaps.
pub fn rect_coordinates(
    image: Shape2,
    window: Shape2,
    overlap: Shape2,
    center_on_field: bool,
) -> PivResult<Coordinates> {
    field_shape(image, window, overlap)?;
    let ys = axis_centers(image.rows, window.rows, overlap.rows, center_on_field)?;
    let xs = axis_centers(image.cols, window.cols, overlap.cols, center_on_field)?;
    Ok(Coordinates::mesh(&xs, &ys))
}
