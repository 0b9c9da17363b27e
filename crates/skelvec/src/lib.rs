//! Umbrella crate for the `skelvec` workspace.
//!
//! Turns a one-pixel-wide skeleton bitmap with per-pixel stroke widths into a
//! network of cubic Bezier strokes whose junctions, loops and parallel strands
//! match the drawing:
//!
//! 1. [`build_graph`] clusters node pixels and traces the chains between them
//!    into a [`TopologicalGraph`].
//! 2. [`Refiner`] fits one curve per chain and splits chains that deviate too
//!    far from their curve.
//! 3. [`HypergraphBuilder`] groups the refined edges into super-edges, one per
//!    visually continuous stroke.
//! 4. [`Vectorizer`] runs all of the above and resolves the result into a
//!    [`VectorDrawing`] for an exporter.
//!
//! The stage crates are re-exported here.

mod config;
mod error;
mod output;
mod pipeline;
mod skeleton;

pub use config::VectorizeConfig;
pub use error::VectorizeError;
pub use output::{NodeMarker, ResolvedPath, VectorDrawing, resolve};
pub use pipeline::{Vectorization, Vectorizer};
pub use skeleton::{IdentitySkeleton, Skeletonizer, StructuringParams};

pub use sv_core::*;
pub use sv_fit::*;
pub use sv_hyper::*;
pub use sv_topo::*;
