//! Topological multigraph extraction from one-pixel-wide skeletons.
//!
//! The input is a [`PixelGraph`]: a skeleton mask plus a stroke-width map.
//! - Pixels are classified by 8-neighborhood degree.
//! - Degree `!= 2` pixels are grouped into node clusters by 4-connectivity.
//! - A degree-2 pixel whose two neighbors touch each other (an "L" turn) is a
//!   [`NodeKind::Corner`] node instead of chain material.
//! - Remaining degree-2 pixels are traced into ordered chains, one edge each.
//!   Self-loops and parallel edges are kept as they are.
//! - Rings without any node get a [`NodeKind::LoopAnchor`] on the first pixel
//!   of their chain.
//!
//! Curve fitting and stroke grouping live in later stages.

mod build;
mod error;
mod graph;
mod pixel;
mod trace;

pub use build::build_graph;
pub use error::TopologyError;
pub use graph::{EdgeId, Node, NodeId, NodeKind, TopologicalEdge, TopologicalGraph};
pub use pixel::{PixelClass, PixelGraph, classify_pixels};
