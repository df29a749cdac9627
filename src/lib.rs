//! fftpiv is a CPU-first particle image velocimetry library built on FFT
//! cross-correlation.
//!
//! Two frames are cut into a grid of overlapping interrogation windows. Every
//! window pair is correlated in the frequency domain, the correlation peak is
//! located with sub-pixel precision and its offset from the map center becomes
//! the window displacement. Per-window work runs data-parallel with the
//! optional `rayon` feature; a memory ceiling splits large grids into
//! sequential blocks.
//!
//! ```no_run
//! use fftpiv::{Frame, PivConfig, PivProcessor};
//!
//! # fn main() -> fftpiv::PivResult<()> {
//! let a = Frame::new(vec![0.0; 128 * 128], 128, 128)?;
//! let b = Frame::new(vec![0.0; 128 * 128], 128, 128)?;
//! let piv = PivProcessor::new(PivConfig::with_window(32, 16))?;
//! let field = piv.process_frames(&a, &b)?;
//! println!("{} invalid windows", field.invalid_count);
//! # Ok(())
//! # }
//! ```

pub mod correlate;
pub mod grid;
pub mod image;
pub mod peak;
pub mod piv;
pub mod refine;
pub mod snr;
pub mod spectral;
mod trace;
pub mod util;
pub mod window;

pub use correlate::{CorrelationBatch, CorrelationMap, CorrelationMethod, Correlator};
pub use grid::{coordinates, field_shape, rect_coordinates, Coordinates, FieldShape, Shape2};
pub use image::{Frame, ImageView};
pub use peak::Peak;
pub use piv::{BlockPlan, PivConfig, PivField, PivProcessor};
pub use refine::{subpixel_peak_position, SubpixelMethod};
pub use snr::{sig2noise_ratio, Sig2NoiseMethod};
pub use spectral::{RustFftTransform, SpectralPlan, SpectralTransform};
pub use util::{PivError, PivResult};
pub use window::{extract_windows, normalize_intensity, WindowBatch};
