use sv_topo::{EdgeId, TopologyError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// Singular normal equations; callers recover with a straight segment.
    #[error("non-convergent fit over {samples} samples (determinant {determinant:e})")]
    NonConvergentFit { samples: usize, determinant: f64 },
    #[error("unknown edge {0}")]
    UnknownEdge(EdgeId),
    #[error(transparent)]
    Topology(#[from] TopologyError),
}
