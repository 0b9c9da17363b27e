//! Cubic Bezier fitting and error-driven refinement of skeleton chains.
//!
//! Each topological edge gets one cubic whose end controls are pinned to the
//! node anchors. The inner controls come from a closed-form least-squares
//! solve over arc-length parametrized chain pixels; singular systems fall
//! back to a straight segment.
//!
//! [`Refiner`] then splits edges whose width-weighted RMS error exceeds the
//! configured bound at their worst pixel, re-fitting the children through a
//! work-queue until every edge fits or reaches the minimum chain length.

mod bezier;
mod error;
mod fit;
mod refine;

pub use bezier::{CubicBezier, bernstein};
pub use error::FitError;
pub use fit::{
    FittedCurve, chain_error, chord_parametrize, fit_cubic, fit_edge, max_error_index,
    width_weight,
};
pub use refine::{RefineConfig, RefineStats, RefinedGraph, Refiner};
