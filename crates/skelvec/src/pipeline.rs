use log::info;
use sv_core::Raster;
use sv_fit::{RefinedGraph, Refiner};
use sv_hyper::{Hypergraph, HypergraphBuilder};
use sv_topo::{PixelGraph, TopologyError, build_graph};

use crate::output::resolve;
use crate::{Skeletonizer, StructuringParams, VectorDrawing, VectorizeConfig, VectorizeError};

/// Every stage's result from one run.
#[derive(Debug, Clone)]
pub struct Vectorization {
    pub refined: RefinedGraph,
    pub hypergraph: Hypergraph,
    pub drawing: VectorDrawing,
}

/// Runs topology extraction, curve refinement and stroke grouping.
///
/// Any structural failure aborts the run; no partial drawing is returned.
#[derive(Debug, Clone, Default)]
pub struct Vectorizer {
    cfg: VectorizeConfig,
}

impl Vectorizer {
    pub fn new(cfg: VectorizeConfig) -> Result<Self, VectorizeError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &VectorizeConfig {
        &self.cfg
    }

    pub fn vectorize(&self, pixels: &PixelGraph) -> Result<VectorDrawing, VectorizeError> {
        self.run(pixels).map(|v| v.drawing)
    }

    pub fn run(&self, pixels: &PixelGraph) -> Result<Vectorization, VectorizeError> {
        let graph = build_graph(pixels)?;

        let refined = Refiner::new(self.cfg.to_refine_config()).refine(graph)?;
        let hypergraph = HypergraphBuilder::new(self.cfg.to_hyper_config()).build(&refined)?;
        let drawing = resolve(&refined, &hypergraph)?;

        let stats = refined.stats;
        info!(
            "vectorized {}x{}: {} edges ({} splits, {} fallbacks, {} at floor) -> {} paths, max error {:.3}",
            drawing.width,
            drawing.height,
            refined.graph.num_edges(),
            stats.splits,
            stats.fallbacks,
            stats.floor_hits,
            drawing.paths.len(),
            refined.max_error()
        );
        Ok(Vectorization {
            refined,
            hypergraph,
            drawing,
        })
    }

    pub fn vectorize_bitmap(
        &self,
        binary: &Raster<bool>,
        widths: Option<Raster<u32>>,
        skeletonizer: &impl Skeletonizer,
    ) -> Result<VectorDrawing, VectorizeError> {
        self.run_bitmap(binary, widths, skeletonizer)
            .map(|v| v.drawing)
    }

    /// Thins `binary` with `skeletonizer`, then runs the pipeline.
    ///
    /// Without `widths` every stroke is treated as zero width.
    pub fn run_bitmap(
        &self,
        binary: &Raster<bool>,
        widths: Option<Raster<u32>>,
        skeletonizer: &impl Skeletonizer,
    ) -> Result<Vectorization, VectorizeError> {
        let params = StructuringParams {
            radius: self.cfg.structuring_radius,
        };
        let skeleton = skeletonizer.skeletonize(binary, &params);
        if !skeleton.same_dims(binary) {
            return Err(TopologyError::MalformedImage {
                reason: "skeleton dimensions differ from input",
            }
            .into());
        }
        let pixels = match widths {
            Some(w) => PixelGraph::new(skeleton, w)?,
            None => PixelGraph::from_mask(skeleton),
        };
        self.run(&pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IdentitySkeleton;

    struct Shrink;

    impl Skeletonizer for Shrink {
        fn skeletonize(&self, binary: &Raster<bool>, _: &StructuringParams) -> Raster<bool> {
            Raster::new_fill(binary.width() - 1, binary.height(), false)
        }
    }

    fn bar() -> Raster<bool> {
        Raster::from_ascii(&["..........", ".########.", ".........."])
    }

    #[test]
    fn straight_bar_is_one_path() {
        let drawing = Vectorizer::default()
            .vectorize_bitmap(&bar(), None, &IdentitySkeleton)
            .unwrap();
        assert_eq!(drawing.paths.len(), 1);
        let path = &drawing.paths[0];
        assert_eq!(path.segments.len(), 1);
        assert!(!path.closed);
        assert_eq!(path.anchors.len(), 2);
        assert_eq!(drawing.markers.len(), 2);
    }

    #[test]
    fn skeleton_size_change_is_malformed() {
        let err = Vectorizer::default()
            .vectorize_bitmap(&bar(), None, &Shrink)
            .unwrap_err();
        assert!(matches!(
            err,
            VectorizeError::Topology(TopologyError::MalformedImage { .. })
        ));
    }

    #[test]
    fn width_raster_must_match() {
        let widths = Raster::new_fill(3, 3, 1u32);
        let err = Vectorizer::default()
            .vectorize_bitmap(&bar(), Some(widths), &IdentitySkeleton)
            .unwrap_err();
        assert!(matches!(
            err,
            VectorizeError::Topology(TopologyError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let cfg = VectorizeConfig {
            min_chain_len: 0,
            ..Default::default()
        };
        assert!(matches!(
            Vectorizer::new(cfg),
            Err(VectorizeError::InvalidConfig { .. })
        ));
    }
}
