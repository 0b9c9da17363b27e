use std::collections::HashSet;

use skelvec::{
    IdentitySkeleton, NodeKind, PixelGraph, Raster, TopologyError, VectorDrawing, VectorizeConfig,
    VectorizeError, Vectorizer,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn vectorize(rows: &[&str]) -> VectorDrawing {
    init_logger();
    let pixels = PixelGraph::from_mask(Raster::from_ascii(rows));
    Vectorizer::default()
        .vectorize(&pixels)
        .expect("vectorization succeeds")
}

fn assert_segments_follow_anchors(drawing: &VectorDrawing) {
    for path in &drawing.paths {
        assert_eq!(path.segments.len() + 1, path.nodes.len());
        assert_eq!(path.anchors.len(), path.nodes.len());
        for (k, seg) in path.segments.iter().enumerate() {
            assert!(seg.p0.distance(path.anchors[k]) < 1e-4, "path {}", path.super_edge);
            assert!(seg.p3.distance(path.anchors[k + 1]) < 1e-4, "path {}", path.super_edge);
        }
        assert_eq!(path.closed, path.nodes.first() == path.nodes.last());
    }
}

#[test]
fn loop_on_a_branch_pixel_is_one_closed_path() {
    let drawing = vectorize(&[
        "...#...", //
        "..###..",
        ".#...#.",
        ".#...#.",
        "..###..",
    ]);
    assert_eq!(drawing.markers.len(), 1);
    assert_eq!(drawing.markers[0].kind, NodeKind::Junction);
    assert_eq!(drawing.paths.len(), 1);
    let path = &drawing.paths[0];
    assert!(path.closed);
    assert_segments_follow_anchors(&drawing);
}

#[test]
fn parallel_strands_close_into_one_ring() {
    let drawing = vectorize(&[
        ".............",
        "...#######...",
        "..#.......#..",
        "##.........##",
        "..#.......#..",
        "...#######...",
    ]);
    assert_eq!(drawing.paths.len(), 1);
    let path = &drawing.paths[0];
    assert!(path.closed);
    assert!(path.segments.len() >= 2);
    assert_segments_follow_anchors(&drawing);
}

#[test]
fn tee_gives_a_through_stroke_and_a_stem() {
    let drawing = vectorize(&[
        "#########",
        "....#....",
        "....#....",
        "....#....",
    ]);
    assert_eq!(drawing.paths.len(), 2);
    let bar = drawing
        .paths
        .iter()
        .find(|p| p.nodes.len() == 3)
        .expect("bar runs through the junction");
    let xs: HashSet<i32> = [bar.anchors[0], bar.anchors[2]]
        .iter()
        .map(|p| p.x.round() as i32)
        .collect();
    assert_eq!(xs, HashSet::from([0, 8]));
    assert_segments_follow_anchors(&drawing);
}

#[test]
fn pass_through_overlap_shares_the_bar() {
    init_logger();
    let pixels = PixelGraph::from_mask(Raster::from_ascii(&[
        "#########",
        "....#....",
        "....#....",
        "....#....",
    ]));
    let cfg = VectorizeConfig {
        pass_through_overlap: true,
        ..Default::default()
    };
    let drawing = Vectorizer::new(cfg).unwrap().vectorize(&pixels).unwrap();
    assert_eq!(drawing.paths.len(), 2);
    assert!(drawing.paths.iter().all(|p| p.nodes.len() == 3));
    assert_segments_follow_anchors(&drawing);
}

#[test]
fn every_refined_edge_is_drawn() {
    init_logger();
    let pixels = PixelGraph::from_mask(Raster::from_ascii(&[
        "#.......#....",
        ".#.....#.....",
        "..#...#......",
        "...###.......",
        "...#..#......",
        "..#....####..",
        ".#.........#.",
    ]));
    let run = Vectorizer::default().run(&pixels).unwrap();
    run.hypergraph.check_coverage(&run.refined.graph).unwrap();

    let drawn: usize = run.drawing.num_segments();
    assert!(drawn >= run.refined.graph.num_edges());
    assert!(run.refined.max_error() <= 2.0 || run.refined.stats.floor_hits > 0);
    assert_segments_follow_anchors(&run.drawing);
}

#[test]
fn stroke_widths_are_accepted() {
    init_logger();
    let mask = Raster::from_ascii(&["..........", ".########.", ".........."]);
    let widths = Raster::new_fill(10, 3, 3u32);
    let drawing = Vectorizer::default()
        .vectorize_bitmap(&mask, Some(widths), &IdentitySkeleton)
        .unwrap();
    assert_eq!(drawing.paths.len(), 1);
    assert_eq!((drawing.width, drawing.height), (10, 3));
}

#[test]
fn malformed_input_produces_no_drawing() {
    init_logger();
    let blank = PixelGraph::from_mask(Raster::new_fill(5, 5, false));
    let err = Vectorizer::default().vectorize(&blank).unwrap_err();
    assert!(matches!(
        err,
        VectorizeError::Topology(TopologyError::MalformedImage { .. })
    ));
}
