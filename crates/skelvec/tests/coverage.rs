use std::collections::HashSet;

use proptest::prelude::*;
use skelvec::{
    PixelClass, PixelGraph, Raster, TopologyError, VectorizeError, Vectorizer, build_graph,
    classify_pixels,
};

fn bitmap(width: usize, height: usize) -> impl Strategy<Value = Raster<bool>> {
    proptest::collection::vec(proptest::bool::weighted(0.3), width * height)
        .prop_map(move |data| Raster::from_vec(width, height, data).expect("sized"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn chain_pixels_have_exactly_one_owner(mask in bitmap(14, 10)) {
        let pixels = PixelGraph::from_mask(mask);
        let graph = match build_graph(&pixels) {
            Ok(graph) => graph,
            Err(TopologyError::MalformedImage { .. }) => return Ok(()),
            Err(err) => return Err(TestCaseError::fail(err.to_string())),
        };
        let classes = classify_pixels(&pixels);
        let owners = graph.chain_pixel_owner();
        for y in 0..classes.height() {
            for x in 0..classes.width() {
                let expected = usize::from(classes.get(x, y) == Some(&PixelClass::Chain));
                let got = owners.get(&(x, y)).map_or(0, Vec::len);
                prop_assert_eq!(got, expected, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn every_edge_lands_in_a_path(mask in bitmap(14, 10)) {
        let pixels = PixelGraph::from_mask(mask);
        let run = match Vectorizer::default().run(&pixels) {
            Ok(run) => run,
            Err(VectorizeError::Topology(TopologyError::MalformedImage { .. })) => return Ok(()),
            Err(err) => return Err(TestCaseError::fail(err.to_string())),
        };
        let covered: HashSet<_> = run
            .hypergraph
            .iter()
            .flat_map(|(_, s)| s.edges().to_vec())
            .collect();
        for edge in run.refined.graph.live_edges() {
            prop_assert!(covered.contains(&edge.id), "edge {} not drawn", edge.id);
        }
        for path in &run.drawing.paths {
            prop_assert_eq!(path.segments.len() + 1, path.nodes.len());
        }
    }
}
