use sv_fit::FitError;
use sv_hyper::{HypergraphError, SuperEdgeId};
use sv_topo::{EdgeId, TopologyError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorizeError {
    #[error(transparent)]
    Raster(#[from] sv_core::Error),
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error(transparent)]
    Fit(#[from] FitError),
    #[error(transparent)]
    Hypergraph(#[from] HypergraphError),
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },
    #[error("edge {edge} has no fitted curve")]
    MissingCurve { edge: EdgeId },
    #[error("super-edge {super_edge} steps along edge {edge} between nodes it does not join")]
    DetachedStep {
        super_edge: SuperEdgeId,
        edge: EdgeId,
    },
}
