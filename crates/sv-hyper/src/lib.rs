//! Super-edges: node paths through the refined topology that become single
//! drawn strokes.
//!
//! [`Hypergraph`] stores the paths and offers the four structural edits
//! (merge, split, overlap, dissociate). [`HypergraphBuilder`] applies them
//! automatically from curve continuity at each node.

mod builder;
mod error;
mod hypergraph;
mod superedge;

pub use builder::{HyperConfig, HypergraphBuilder};
pub use error::{HyperOp, HypergraphError, Violation};
pub use hypergraph::{Hypergraph, MergeReceipt, SuperEdgeId};
pub use superedge::SuperEdge;
