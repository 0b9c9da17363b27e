use std::collections::BTreeSet;

use log::debug;
use sv_core::{NEIGHBORS_4, NEIGHBORS_8, Point2f, Raster};

use crate::TopologyError;
use crate::graph::{NodeId, NodeKind, TopologicalGraph};
use crate::pixel::{PixelClass, PixelGraph, classify_pixels};
use crate::trace::{ChainEnds, ChainTracer};

/// Extracts the topological multigraph of a skeleton.
///
/// Node clusters are grown with 4-connectivity, separately for degree `!= 2`
/// pixels and for corner pixels. Every remaining degree-2 pixel ends up in
/// exactly one edge chain.
pub fn build_graph(pixels: &PixelGraph) -> Result<TopologicalGraph, TopologyError> {
    let (width, height) = (pixels.width(), pixels.height());
    if width == 0 || height == 0 {
        return Err(TopologyError::MalformedImage {
            reason: "empty raster",
        });
    }
    if pixels.mask().count_set() == 0 {
        return Err(TopologyError::MalformedImage {
            reason: "no skeleton pixels",
        });
    }

    let classes = classify_pixels(pixels);
    let fully_disconnected = classes
        .data()
        .iter()
        .all(|c| matches!(c, PixelClass::Background | PixelClass::Node { degree: 0 }));
    if fully_disconnected {
        return Err(TopologyError::MalformedImage {
            reason: "fully disconnected skeleton",
        });
    }

    let mut graph = TopologicalGraph::new(width, height);
    let node_at = cluster_nodes(&classes, &mut graph);
    trace_chains(pixels, &classes, &node_at, &mut graph)?;
    link_adjacent_nodes(&classes, &node_at, &mut graph)?;

    debug!(
        "topology: {} nodes ({} junctions, {} ends), {} edges",
        graph.num_nodes(),
        graph.num_junctions(),
        graph.num_ends(),
        graph.num_edges()
    );

    Ok(graph)
}

fn cluster_nodes(
    classes: &Raster<PixelClass>,
    graph: &mut TopologicalGraph,
) -> Vec<Option<NodeId>> {
    let n = classes.len();
    let mut node_at = vec![None; n];
    let mut stack = Vec::new();
    let mut component = Vec::new();

    for seed in 0..n {
        let class = classes.data()[seed];
        if !class.is_node() || node_at[seed].is_some() {
            continue;
        }

        let corner = class == PixelClass::Corner;
        let id = graph.num_nodes();
        stack.clear();
        component.clear();
        node_at[seed] = Some(id);
        stack.push(seed);

        while let Some(p) = stack.pop() {
            component.push(p);
            for dir in NEIGHBORS_4 {
                let Some(nb) = classes.offset_index(p, dir) else {
                    continue;
                };
                let nb_class = classes.data()[nb];
                let same_group = nb_class.is_node() && (nb_class == PixelClass::Corner) == corner;
                if same_group && node_at[nb].is_none() {
                    node_at[nb] = Some(id);
                    stack.push(nb);
                }
            }
        }

        component.sort_unstable();
        let members: Vec<(usize, usize)> = component.iter().map(|&p| classes.coords(p)).collect();
        let kind = if corner {
            NodeKind::Corner
        } else {
            cluster_kind(classes, &component)
        };
        let anchor = anchor_pixel(&members).unwrap_or(members[0]);
        let added = graph.add_node(kind, anchor, members);
        debug_assert_eq!(added, id);
    }

    node_at
}

fn cluster_kind(classes: &Raster<PixelClass>, component: &[usize]) -> NodeKind {
    let max_degree = component
        .iter()
        .map(|&p| match classes.data()[p] {
            PixelClass::Node { degree } => degree,
            _ => 2,
        })
        .max()
        .unwrap_or(0);

    match (component.len(), max_degree) {
        (_, 0) => NodeKind::Isolated,
        (1, 1) => NodeKind::End,
        _ => NodeKind::Junction,
    }
}

/// Member pixel closest to the cluster centroid, first in row-major order on ties.
fn anchor_pixel(members: &[(usize, usize)]) -> Option<(usize, usize)> {
    if members.is_empty() {
        return None;
    }

    let inv = 1.0 / members.len() as f32;
    let centroid = members.iter().fold(Point2f::default(), |acc, &(x, y)| {
        Point2f::new(acc.x + x as f32 * inv, acc.y + y as f32 * inv)
    });

    let mut best = members[0];
    let mut best_d2 = f32::INFINITY;
    for &m in members {
        let d2 = Point2f::from_pixel(m).distance_sq(centroid);
        if d2 < best_d2 {
            best_d2 = d2;
            best = m;
        }
    }
    Some(best)
}

/// Traces every chain. A ring with no node gets a `LoopAnchor` on its first
/// traced pixel; that pixel stays at the head of the ring's chain, so the
/// curve starts and ends on it.
fn trace_chains(
    pixels: &PixelGraph,
    classes: &Raster<PixelClass>,
    node_at: &[Option<NodeId>],
    graph: &mut TopologicalGraph,
) -> Result<(), TopologyError> {
    let mut tracer = ChainTracer::new(classes, node_at);
    for seed in 0..classes.len() {
        if classes.data()[seed] != PixelClass::Chain || tracer.is_visited(seed) {
            continue;
        }

        let chain = tracer.trace(seed)?;
        let coords: Vec<(usize, usize)> =
            chain.pixels.iter().map(|&p| classes.coords(p)).collect();
        let (a, b) = match chain.ends {
            ChainEnds::Open { a, b } => (a, b),
            ChainEnds::Closed => {
                let &xy = coords.first().ok_or(TopologyError::DegenerateChain {
                    x: classes.coords(seed).0,
                    y: classes.coords(seed).1,
                    reason: "empty ring",
                })?;
                let id = graph.add_node(NodeKind::LoopAnchor, xy, vec![xy]);
                (id, id)
            }
        };

        let widths = coords
            .iter()
            .map(|&(x, y)| pixels.stroke_width(x, y))
            .collect();
        graph.add_edge(a, b, coords, widths)?;
    }
    Ok(())
}

/// Joins every pair of distinct, 8-adjacent node clusters with one empty chain.
fn link_adjacent_nodes(
    classes: &Raster<PixelClass>,
    node_at: &[Option<NodeId>],
    graph: &mut TopologicalGraph,
) -> Result<(), TopologyError> {
    let mut pairs = BTreeSet::new();
    for p in 0..classes.len() {
        let Some(a) = node_at[p] else {
            continue;
        };
        for dir in NEIGHBORS_8 {
            let Some(nb) = classes.offset_index(p, dir) else {
                continue;
            };
            if let Some(b) = node_at[nb]
                && a != b
            {
                pairs.insert((a.min(b), a.max(b)));
            }
        }
    }

    for (a, b) in pairs {
        graph.add_edge(a, b, Vec::new(), Vec::new())?;
    }
    Ok(())
}
