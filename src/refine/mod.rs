//! Sub-pixel peak refinement.
//!
//! Refinement reads a five-point stencil around the integer peak (center and
//! its four axis neighbours), adds a small epsilon to every sample and fits
//! each axis independently. A peak on the map border has no complete stencil
//! and yields NaN offsets.
//!
//! The gaussian fit needs strictly positive samples. When any stencil sample is
//! not positive the window is refined with the parabolic fit instead and the
//! fallback is counted.

use std::str::FromStr;

use crate::correlate::CorrelationBatch;
use crate::grid::Shape2;
use crate::peak::{find_first_peak, Peak};
use crate::trace::{trace_span, trace_warn};
use crate::util::par::map_windows;
use crate::util::PivError;

mod estimators;

pub use estimators::{centroid_offset, gaussian_offset, parabolic_offset};

/// Added to every stencil sample before fitting.
pub const STENCIL_EPS: f32 = 1e-7;

/// Sub-pixel fitting method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubpixelMethod {
    /// Three-point gaussian fit (log-parabola).
    #[default]
    Gaussian,
    /// Three-point center of mass.
    Centroid,
    /// Three-point parabola.
    Parabolic,
}

impl SubpixelMethod {
    /// Canonical method name.
    pub fn name(self) -> &'static str {
        match self {
            SubpixelMethod::Gaussian => "gaussian",
            SubpixelMethod::Centroid => "centroid",
            SubpixelMethod::Parabolic => "parabolic",
        }
    }
}

impl FromStr for SubpixelMethod {
    type Err = PivError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gaussian" => Ok(SubpixelMethod::Gaussian),
            "centroid" => Ok(SubpixelMethod::Centroid),
            "parabolic" => Ok(SubpixelMethod::Parabolic),
            _ => Err(PivError::UnknownMethod {
                kind: "subpixel",
                name: s.to_string(),
            }),
        }
    }
}

/// Five samples around an interior peak, epsilon included.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stencil {
    /// Sample at the peak.
    pub center: f32,
    /// Sample one row above the peak.
    pub up: f32,
    /// Sample one row below the peak.
    pub down: f32,
    /// Sample one column left of the peak.
    pub left: f32,
    /// Sample one column right of the peak.
    pub right: f32,
}

impl Stencil {
    /// Reads the stencil around `peak`; `None` when the peak touches a border.
    pub fn read(map: &[f32], shape: Shape2, peak: Peak) -> Option<Self> {
        if peak.on_border(shape) || map.len() != shape.area() {
            return None;
        }
        let at = |r: usize, c: usize| map[r * shape.cols + c] + STENCIL_EPS;
        Some(Self {
            center: at(peak.row, peak.col),
            up: at(peak.row - 1, peak.col),
            down: at(peak.row + 1, peak.col),
            left: at(peak.row, peak.col - 1),
            right: at(peak.row, peak.col + 1),
        })
    }

    fn all_positive(&self) -> bool {
        self.center > 0.0 && self.up > 0.0 && self.down > 0.0 && self.left > 0.0 && self.right > 0.0
    }
}

/// Fractional offset of the true peak from the integer peak.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubpixelOffset {
    /// Row offset (NaN when undefined).
    pub d_row: f32,
    /// Column offset (NaN when undefined).
    pub d_col: f32,
    /// True when a gaussian fit was replaced by the parabolic one.
    pub fallback: bool,
}

impl SubpixelOffset {
    const UNDEFINED: SubpixelOffset = SubpixelOffset {
        d_row: f32::NAN,
        d_col: f32::NAN,
        fallback: false,
    };

    /// Returns true when both offsets are finite.
    pub fn is_finite(&self) -> bool {
        self.d_row.is_finite() && self.d_col.is_finite()
    }
}

/// Refines one peak of one map.
pub fn subpixel_offset(map: &[f32], shape: Shape2, peak: Peak, method: SubpixelMethod) -> SubpixelOffset {
    let Some(s) = Stencil::read(map, shape, peak) else {
        return SubpixelOffset::UNDEFINED;
    };
    let (fit, fallback): (fn(f32, f32, f32) -> f32, bool) = match method {
        SubpixelMethod::Gaussian if s.all_positive() => (gaussian_offset, false),
        SubpixelMethod::Gaussian => (parabolic_offset, true),
        SubpixelMethod::Centroid => (centroid_offset, false),
        SubpixelMethod::Parabolic => (parabolic_offset, false),
    };
    SubpixelOffset {
        d_row: fit(s.up, s.center, s.down),
        d_col: fit(s.left, s.center, s.right),
        fallback,
    }
}

/// Absolute fractional `(row, col)` position of the highest peak of a map.
pub fn subpixel_peak_position(map: &[f32], shape: Shape2, method: SubpixelMethod) -> (f32, f32) {
    let peak = find_first_peak(map, shape);
    let offset = subpixel_offset(map, shape, peak, method);
    (peak.row as f32 + offset.d_row, peak.col as f32 + offset.d_col)
}

/// Offsets for a whole batch plus the number of gaussian fallbacks.
#[derive(Clone, Debug, PartialEq)]
pub struct RefinedBatch {
    /// Offset per map, in batch order.
    pub offsets: Vec<SubpixelOffset>,
    /// Maps refined with the parabolic fit instead of the gaussian one.
    pub fallbacks: usize,
}

/// Refines the first peak of every map; `peaks[i]` belongs to map `i`.
pub fn refine_batch(
    batch: &CorrelationBatch,
    peaks: &[Peak],
    method: SubpixelMethod,
    parallel: bool,
) -> RefinedBatch {
    let shape = batch.shape();
    let _span = trace_span!("refine_batch", windows = batch.count(), method = method.name()).entered();

    let offsets = map_windows(batch.as_slice(), shape.area(), parallel, |idx, map| {
        match peaks.get(idx) {
            Some(&peak) => subpixel_offset(map, shape, peak, method),
            None => SubpixelOffset::UNDEFINED,
        }
    });
    let fallbacks = offsets.iter().filter(|o| o.fallback).count();
    if fallbacks > 0 {
        trace_warn!("gaussian_fallback", windows = fallbacks);
    }
    RefinedBatch { offsets, fallbacks }
}
