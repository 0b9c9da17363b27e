//! Foundational primitives for skeleton vectorization.
//!
//! ## Rasters
//! [`Raster`] is a dense row-major matrix addressed by `(x, y)` with `x`
//! running along a row. It carries the skeleton mask (`Raster<bool>`) and the
//! stroke-width map (`Raster<u32>`) that feed topology extraction.
//!
//! ## Coordinates
//! Integer pixel `(x, y)` maps to the point at the pixel center, i.e.
//! `Point2f { x: x as f32, y: y as f32 }`. Curve control points live in the
//! same frame.

mod error;
mod geom;
mod raster;

pub use error::Error;
pub use geom::{Point2f, Vec2f};
pub use raster::{NEIGHBORS_4, NEIGHBORS_8, Raster};
