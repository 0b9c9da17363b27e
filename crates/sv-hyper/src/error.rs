use core::fmt;

use sv_topo::{EdgeId, NodeId};
use thiserror::Error;

use crate::SuperEdgeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HyperOp {
    Merge,
    Split,
    Overlap,
    Dissociate,
}

impl fmt::Display for HyperOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge => write!(f, "merge"),
            Self::Split => write!(f, "split"),
            Self::Overlap => write!(f, "overlap"),
            Self::Dissociate => write!(f, "dissociate"),
        }
    }
}

/// Unmet precondition of a hypergraph operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("unknown super-edge {0}")]
    UnknownSuperEdge(SuperEdgeId),
    #[error("operands are the same super-edge")]
    SameSuperEdge,
    #[error("super-edges share no endpoint")]
    NoSharedEndpoint,
    #[error("no super-edge can be joined at node {node}")]
    NoQualifyingPartner { node: NodeId },
    #[error("node {node} is already interior")]
    RevisitsInterior { node: NodeId },
    #[error("node {node} would follow itself")]
    ConsecutiveRepeat { node: NodeId },
    #[error("split index {index} outside 1..{last}")]
    SplitIndexOutOfRange { index: usize, last: usize },
    #[error("node {node} is not interior to the other super-edge")]
    NotInterior { node: NodeId },
    #[error("no extension past node {node} is shared with the other super-edge")]
    NoSharedExtension { node: NodeId },
    #[error("sequence needs at least two nodes and one edge per step")]
    MalformedSequence,
    #[error("super-edge has {found} nodes, the merge left {expected}")]
    StaleMerge { expected: usize, found: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HypergraphError {
    #[error("invalid {op} operation: {reason}")]
    InvalidHypergraphOperation { op: HyperOp, reason: Violation },
    #[error("topological edge {edge} is not covered by any super-edge")]
    CoverageViolated { edge: EdgeId },
}

impl HypergraphError {
    pub(crate) fn invalid(op: HyperOp, reason: Violation) -> Self {
        Self::InvalidHypergraphOperation { op, reason }
    }
}
