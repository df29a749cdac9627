//! Python bindings for the fftpiv PIV library.
//!
//! This module exposes single-pass FFT cross-correlation PIV to Python via
//! PyO3. Frames are 2D `float32` numpy arrays (rows x cols).

use numpy::{IntoPyArray, PyArray2, PyArrayMethods, PyReadonlyArray2, PyUntypedArrayMethods};
use pyo3::exceptions::{PyNotImplementedError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use fftpiv::{
    field_shape, rect_coordinates, CorrelationMethod, ImageView, PivConfig, PivError,
    PivProcessor, Shape2, Sig2NoiseMethod, SubpixelMethod,
};

/// Convert a PivError to a Python exception.
fn to_py_err(err: PivError) -> PyErr {
    match err {
        PivError::NotImplemented(_) => PyNotImplementedError::new_err(err.to_string()),
        PivError::ImageIo { .. } => PyRuntimeError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

/// A size given as one integer or as a `(rows, cols)` tuple.
#[derive(FromPyObject, Clone, Copy)]
enum SizeArg {
    Square(usize),
    Rect((usize, usize)),
}

impl From<SizeArg> for Shape2 {
    fn from(value: SizeArg) -> Self {
        match value {
            SizeArg::Square(size) => Shape2::square(size),
            SizeArg::Rect((rows, cols)) => Shape2::new(rows, cols),
        }
    }
}

fn to_py_grid<'py>(
    py: Python<'py>,
    data: Vec<f32>,
    rows: usize,
    cols: usize,
) -> PyResult<Bound<'py, PyArray2<f32>>> {
    data.into_pyarray(py).reshape([rows, cols])
}

fn view_of<'a>(array: &'a PyReadonlyArray2<'_, f32>) -> PyResult<ImageView<'a, f32>> {
    let shape = array.shape();
    let data = array.as_slice()?;
    ImageView::from_slice(data, shape[1], shape[0]).map_err(to_py_err)
}

/// Displacement field of a frame pair by FFT cross-correlation.
///
/// Args:
///     frame_a: 2D float32 numpy array, first frame
///     frame_b: 2D float32 numpy array, second frame (same shape)
///     window_size: interrogation window, int or (rows, cols) (default: 32)
///     overlap: window overlap, int or (rows, cols) (default: 16)
///     dt: time between frames (default: 1.0)
///     search_area_size: must equal window_size when given (default: None)
///     correlation_method: "circular" (default); "linear" is not supported here
///     subpixel_method: "gaussian", "centroid" or "parabolic" (default: "gaussian")
///     sig2noise_method: "peak2peak", "peak2mean" or None (default: None)
///     width: half-width of the region excluded around the first peak (default: 2)
///     normalized_correlation: not supported, must be False
///     max_array_size: memory ceiling in elements for block processing (default: None)
///     parallel: process windows on the rayon pool (default: False)
///
/// Returns:
///     Tuple (u, v, sig2noise) of 2D float32 arrays with the field shape
#[pyfunction]
#[pyo3(signature = (
    frame_a,
    frame_b,
    window_size = SizeArg::Square(32),
    overlap = SizeArg::Square(16),
    dt = 1.0,
    search_area_size = None,
    correlation_method = "circular",
    subpixel_method = "gaussian",
    sig2noise_method = None,
    width = 2,
    normalized_correlation = false,
    max_array_size = None,
    parallel = false
))]
#[allow(clippy::too_many_arguments, clippy::type_complexity)]
fn extended_search_area_piv<'py>(
    py: Python<'py>,
    frame_a: PyReadonlyArray2<'py, f32>,
    frame_b: PyReadonlyArray2<'py, f32>,
    window_size: SizeArg,
    overlap: SizeArg,
    dt: f32,
    search_area_size: Option<SizeArg>,
    correlation_method: &str,
    subpixel_method: &str,
    sig2noise_method: Option<&str>,
    width: usize,
    normalized_correlation: bool,
    max_array_size: Option<usize>,
    parallel: bool,
) -> PyResult<(
    Bound<'py, PyArray2<f32>>,
    Bound<'py, PyArray2<f32>>,
    Bound<'py, PyArray2<f32>>,
)> {
    let config = PivConfig {
        window_size: window_size.into(),
        overlap: overlap.into(),
        search_area_size: search_area_size.map(Shape2::from),
        dt,
        correlation_method: correlation_method
            .parse::<CorrelationMethod>()
            .map_err(to_py_err)?,
        normalized_correlation,
        subpixel_method: subpixel_method.parse::<SubpixelMethod>().map_err(to_py_err)?,
        sig2noise_method: sig2noise_method
            .map(str::parse::<Sig2NoiseMethod>)
            .transpose()
            .map_err(to_py_err)?,
        width,
        max_array_size,
        parallel,
        center_on_field: false,
    };
    let processor = PivProcessor::new(config).map_err(to_py_err)?;

    let a = view_of(&frame_a)?;
    let b = view_of(&frame_b)?;
    let field = processor.process(a, b).map_err(to_py_err)?;

    let (rows, cols) = (field.shape.rows, field.shape.cols);
    Ok((
        to_py_grid(py, field.u, rows, cols)?,
        to_py_grid(py, field.v, rows, cols)?,
        to_py_grid(py, field.sig2noise, rows, cols)?,
    ))
}

/// Number of interrogation windows along each axis.
///
/// Args:
///     image_size: (rows, cols) of the frame
///     window_size: int or (rows, cols)
///     overlap: int or (rows, cols)
///
/// Returns:
///     Tuple (n_rows, n_cols)
#[pyfunction]
fn get_field_shape(
    image_size: (usize, usize),
    window_size: SizeArg,
    overlap: SizeArg,
) -> PyResult<(usize, usize)> {
    let shape = field_shape(
        Shape2::new(image_size.0, image_size.1),
        window_size.into(),
        overlap.into(),
    )
    .map_err(to_py_err)?;
    Ok((shape.rows, shape.cols))
}

/// Window-center coordinate grids.
///
/// Args:
///     image_size: (rows, cols) of the frame
///     window_size: int or (rows, cols)
///     overlap: int or (rows, cols)
///     center_on_field: center the grid on the image (default: False)
///
/// Returns:
///     Tuple (x, y) of 2D float32 arrays with the field shape
#[pyfunction]
#[pyo3(signature = (image_size, window_size, overlap, center_on_field = false))]
fn get_rect_coordinates<'py>(
    py: Python<'py>,
    image_size: (usize, usize),
    window_size: SizeArg,
    overlap: SizeArg,
    center_on_field: bool,
) -> PyResult<(Bound<'py, PyArray2<f32>>, Bound<'py, PyArray2<f32>>)> {
    let coords = rect_coordinates(
        Shape2::new(image_size.0, image_size.1),
        window_size.into(),
        overlap.into(),
        center_on_field,
    )
    .map_err(to_py_err)?;
    let shape = coords.shape();
    Ok((
        to_py_grid(py, coords.x().to_vec(), shape.rows, shape.cols)?,
        to_py_grid(py, coords.y().to_vec(), shape.rows, shape.cols)?,
    ))
}

/// Python module for fftpiv.
#[pymodule]
fn _fftpiv(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(extended_search_area_piv, m)?)?;
    m.add_function(wrap_pyfunction!(get_field_shape, m)?)?;
    m.add_function(wrap_pyfunction!(get_rect_coordinates, m)?)?;

    // Add version
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
