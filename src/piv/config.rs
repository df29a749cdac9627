//! Configuration of a PIV evaluation and its up-front capability check.

use crate::correlate::CorrelationMethod;
use crate::grid::Shape2;
use crate::refine::SubpixelMethod;
use crate::snr::Sig2NoiseMethod;
use crate::util::{PivError, PivResult};

/// Parameters of a single-pass PIV evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct PivConfig {
    /// Interrogation window size in pixels, `(rows, cols)`.
    pub window_size: Shape2,
    /// Overlap between neighbouring windows in pixels.
    pub overlap: Shape2,
    /// Search area in frame B; `None` means the window size.
    pub search_area_size: Option<Shape2>,
    /// Time between the frames. Displacements are divided by it.
    pub dt: f32,
    /// Correlation method. Only `Circular` runs in the pipeline.
    pub correlation_method: CorrelationMethod,
    /// Normalized cross-correlation. Not supported in the pipeline.
    pub normalized_correlation: bool,
    /// Sub-pixel fit.
    pub subpixel_method: SubpixelMethod,
    /// Signal-to-noise measure; `None` leaves the ratio grid NaN.
    pub sig2noise_method: Option<Sig2NoiseMethod>,
    /// Half-width of the square excluded around the first peak.
    pub width: usize,
    /// Upper bound on `windows * window_area` held at once.
    pub max_array_size: Option<usize>,
    /// Run per-window work on the rayon pool (needs the `rayon` feature).
    pub parallel: bool,
    /// Shift window centers so the grid is centered on the image.
    pub center_on_field: bool,
}

impl Default for PivConfig {
    fn default() -> Self {
        Self {
            window_size: Shape2::square(32),
            overlap: Shape2::square(16),
            search_area_size: None,
            dt: 1.0,
            correlation_method: CorrelationMethod::Circular,
            normalized_correlation: false,
            subpixel_method: SubpixelMethod::Gaussian,
            sig2noise_method: None,
            width: 2,
            max_array_size: None,
            parallel: false,
            center_on_field: false,
        }
    }
}

impl PivConfig {
    /// Square windows of `window` pixels overlapping by `overlap`.
    pub fn with_window(window: usize, overlap: usize) -> Self {
        Self {
            window_size: Shape2::square(window),
            overlap: Shape2::square(overlap),
            ..Self::default()
        }
    }

    /// Checks the configuration before any computation.
    ///
    /// Rejects inconsistent geometry and every option the pipeline cannot run.
    pub fn validate(&self) -> PivResult<()> {
        let axes = [
            ("rows", self.window_size.rows, self.overlap.rows),
            ("cols", self.window_size.cols, self.overlap.cols),
        ];
        for (axis, window, overlap) in axes {
            if window == 0 {
                return Err(PivError::InvalidDimensions {
                    width: self.window_size.cols,
                    height: self.window_size.rows,
                });
            }
            if overlap >= window {
                return Err(PivError::OverlapTooLarge {
                    axis,
                    window,
                    overlap,
                });
            }
        }

        if let Some(search) = self.search_area_size {
            let axes = [
                ("rows", self.window_size.rows, search.rows),
                ("cols", self.window_size.cols, search.cols),
            ];
            for (axis, window, search) in axes {
                if search < window {
                    return Err(PivError::SearchAreaTooSmall {
                        axis,
                        window,
                        search,
                    });
                }
            }
            if search != self.window_size {
                return Err(PivError::NotImplemented(
                    "search area larger than the interrogation window",
                ));
            }
        }

        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(PivError::InvalidInput("dt must be finite and positive"));
        }
        if self.normalized_correlation {
            return Err(PivError::NotImplemented("normalized correlation"));
        }
        match self.correlation_method {
            CorrelationMethod::Circular => {}
            CorrelationMethod::Linear => {
                return Err(PivError::NotImplemented("linear correlation in the pipeline"))
            }
            CorrelationMethod::Direct => {
                return Err(PivError::NotImplemented("direct correlation in the pipeline"))
            }
        }
        if let Some(max) = self.max_array_size {
            let area = self.window_size.area();
            if max < area {
                return Err(PivError::MemoryCeilingTooSmall {
                    max_elements: max,
                    window_area: area,
                });
            }
        }
        Ok(())
    }
}
