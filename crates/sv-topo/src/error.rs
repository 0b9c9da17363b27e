use thiserror::Error;

use crate::graph::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("malformed image: {reason}")]
    MalformedImage { reason: &'static str },
    #[error("degenerate chain at pixel ({x}, {y}): {reason}")]
    DegenerateChain {
        x: usize,
        y: usize,
        reason: &'static str,
    },
    #[error("dimension mismatch: mask is {mask:?}, width map is {widths:?}")]
    DimensionMismatch {
        mask: (usize, usize),
        widths: (usize, usize),
    },
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("chain has {pixels} pixels but {widths} width samples")]
    ChainWidthMismatch { pixels: usize, widths: usize },
}
