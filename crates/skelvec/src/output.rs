use sv_core::Point2f;
use sv_fit::{CubicBezier, RefinedGraph};
use sv_hyper::{Hypergraph, SuperEdge, SuperEdgeId};
use sv_topo::{NodeId, NodeKind, TopologyError};

use crate::VectorizeError;

/// One super-edge with everything needed to draw it as a single path.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPath {
    pub super_edge: SuperEdgeId,
    pub nodes: Vec<NodeId>,
    /// Anchor of each node in `nodes`.
    pub anchors: Vec<Point2f>,
    /// One curve per step, oriented along the direction of travel.
    pub segments: Vec<CubicBezier>,
    /// First and last node coincide.
    pub closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeMarker {
    pub node: NodeId,
    pub kind: NodeKind,
    pub anchor: Point2f,
    pub degree: usize,
}

/// Final curve network handed to an exporter.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDrawing {
    pub width: usize,
    pub height: usize,
    pub paths: Vec<ResolvedPath>,
    pub markers: Vec<NodeMarker>,
}

impl VectorDrawing {
    pub fn num_segments(&self) -> usize {
        self.paths.iter().map(|p| p.segments.len()).sum()
    }
}

/// Resolves every active super-edge, in id order, against the refined graph.
pub fn resolve(
    refined: &RefinedGraph,
    hyper: &Hypergraph,
) -> Result<VectorDrawing, VectorizeError> {
    let graph = &refined.graph;
    let paths = hyper
        .iter()
        .map(|(id, s)| resolve_path(refined, id, s))
        .collect::<Result<Vec<_>, _>>()?;
    let markers = graph
        .nodes()
        .iter()
        .map(|n| NodeMarker {
            node: n.id,
            kind: n.kind,
            anchor: n.anchor,
            degree: n.incident_edges.len(),
        })
        .collect();
    Ok(VectorDrawing {
        width: graph.width,
        height: graph.height,
        paths,
        markers,
    })
}

fn resolve_path(
    refined: &RefinedGraph,
    id: SuperEdgeId,
    s: &SuperEdge,
) -> Result<ResolvedPath, VectorizeError> {
    let graph = &refined.graph;
    let anchors = s
        .nodes()
        .iter()
        .map(|&n| {
            graph
                .node(n)
                .map(|node| node.anchor)
                .ok_or(TopologyError::UnknownNode(n))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut segments = Vec::with_capacity(s.edges().len());
    for (from, e, to) in s.steps() {
        let edge = graph.edge(e).ok_or(VectorizeError::MissingCurve { edge: e })?;
        let curve = refined
            .curve(e)
            .ok_or(VectorizeError::MissingCurve { edge: e })?;
        let bezier = if edge.a == from && edge.b == to {
            curve.bezier
        } else if edge.b == from && edge.a == to {
            curve.bezier.reversed()
        } else {
            return Err(VectorizeError::DetachedStep {
                super_edge: id,
                edge: e,
            });
        };
        segments.push(bezier);
    }

    Ok(ResolvedPath {
        super_edge: id,
        nodes: s.nodes().to_vec(),
        anchors,
        segments,
        closed: s.is_closed(),
    })
}
