use std::collections::HashMap;

use sv_core::Point2f;

use crate::TopologyError;

pub type NodeId = usize;
pub type EdgeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Pixels with no neighbors.
    Isolated,
    /// A single pixel with one neighbor.
    End,
    /// Cluster of degree `!= 2` pixels with at least one branch.
    Junction,
    /// Cluster of degree-2 pixels whose two neighbors touch each other.
    Corner,
    /// Pixel promoted to a node so that a junction-free ring has an endpoint.
    LoopAnchor,
    /// Inserted by error-driven chain splitting.
    Split,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Curve endpoint for every incident edge.
    pub anchor: Point2f,
    pub idx: (usize, usize),
    pub pixels: Vec<(usize, usize)>,
    /// Incident edge ids; a self-loop is listed once per end.
    pub incident_edges: Vec<EdgeId>,
}

#[derive(Debug, Clone)]
pub struct TopologicalEdge {
    pub id: EdgeId,
    pub a: NodeId,
    pub b: NodeId,
    /// Chain pixels ordered from `a` to `b`, node pixels excluded. A ring's
    /// loop anchor is the exception: its pixel leads the ring's own chain.
    pub pixels: Vec<(usize, usize)>,
    /// Stroke width sampled at each chain pixel.
    pub widths: Vec<u32>,
}

impl TopologicalEdge {
    pub fn is_loop(&self) -> bool {
        self.a == self.b
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = Point2f> + '_ {
        self.pixels.iter().map(|&p| Point2f::from_pixel(p))
    }

    pub fn other_end(&self, node: NodeId) -> Option<NodeId> {
        if node == self.a {
            Some(self.b)
        } else if node == self.b {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Multigraph over skeleton clusters.
///
/// Nodes and edges are addressed by handles into flat storage. Handles are
/// never reused: removing an edge leaves an empty slot so ids held elsewhere
/// keep pointing at the same thing or at nothing.
#[derive(Debug, Clone, Default)]
pub struct TopologicalGraph {
    pub width: usize,
    pub height: usize,
    nodes: Vec<Node>,
    edges: Vec<Option<TopologicalEdge>>,
}

impl TopologicalGraph {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Appends a node anchored at pixel `idx`.
    pub fn add_node(
        &mut self,
        kind: NodeKind,
        idx: (usize, usize),
        pixels: Vec<(usize, usize)>,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            id,
            kind,
            anchor: Point2f::from_pixel(idx),
            idx,
            pixels,
            incident_edges: Vec::new(),
        });
        id
    }

    pub fn add_edge(
        &mut self,
        a: NodeId,
        b: NodeId,
        pixels: Vec<(usize, usize)>,
        widths: Vec<u32>,
    ) -> Result<EdgeId, TopologyError> {
        for n in [a, b] {
            if n >= self.nodes.len() {
                return Err(TopologyError::UnknownNode(n));
            }
        }
        if pixels.len() != widths.len() {
            return Err(TopologyError::ChainWidthMismatch {
                pixels: pixels.len(),
                widths: widths.len(),
            });
        }

        let id = self.edges.len();
        self.edges.push(Some(TopologicalEdge {
            id,
            a,
            b,
            pixels,
            widths,
        }));
        self.nodes[a].incident_edges.push(id);
        self.nodes[b].incident_edges.push(id);
        Ok(id)
    }

    /// Empties the slot of `id` and detaches it from both endpoints.
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<TopologicalEdge> {
        let edge = self.edges.get_mut(id)?.take()?;
        for n in [edge.a, edge.b] {
            let incident = &mut self.nodes[n].incident_edges;
            if let Some(pos) = incident.iter().position(|&e| e == id) {
                incident.remove(pos);
            }
        }
        Some(edge)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&TopologicalEdge> {
        self.edges.get(id).and_then(Option::as_ref)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn live_edges(&self) -> impl Iterator<Item = &TopologicalEdge> {
        self.edges.iter().flatten()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.live_edges().count()
    }

    /// Number of edge slots ever allocated, live or removed.
    pub fn edge_capacity(&self) -> usize {
        self.edges.len()
    }

    pub fn node_degree(&self, id: NodeId) -> usize {
        self.nodes.get(id).map_or(0, |n| n.incident_edges.len())
    }

    pub fn num_junctions(&self) -> usize {
        self.iter_junctions().count()
    }

    pub fn num_ends(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.kind == NodeKind::End)
            .count()
    }

    pub fn iter_junctions(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Junction)
    }

    pub fn edge_endpoints(&self, id: EdgeId) -> Option<(NodeId, NodeId)> {
        self.edge(id).map(|e| (e.a, e.b))
    }

    pub fn other_end(&self, edge: EdgeId, node: NodeId) -> Option<NodeId> {
        self.edge(edge).and_then(|e| e.other_end(node))
    }

    /// Live edges owning each chain pixel, for coverage audits.
    pub fn chain_pixel_owner(&self) -> HashMap<(usize, usize), Vec<EdgeId>> {
        let mut owners: HashMap<(usize, usize), Vec<EdgeId>> = HashMap::new();
        for edge in self.live_edges() {
            for &p in &edge.pixels {
                owners.entry(p).or_default().push(edge.id);
            }
        }
        owners
    }
}

#[cfg(test)]
mod tests {
    use super::{NodeKind, TopologicalGraph};
    use crate::TopologyError;

    #[test]
    fn remove_edge_keeps_handles_stable() {
        let mut g = TopologicalGraph::new(8, 8);
        let a = g.add_node(NodeKind::End, (0, 0), vec![(0, 0)]);
        let b = g.add_node(NodeKind::End, (4, 0), vec![(4, 0)]);
        let e0 = g
            .add_edge(a, b, vec![(1, 0), (2, 0), (3, 0)], vec![1, 1, 1])
            .expect("valid edge");
        let e1 = g.add_edge(a, b, Vec::new(), Vec::new()).expect("valid edge");

        assert_eq!(g.node_degree(a), 2);
        let removed = g.remove_edge(e0).expect("edge was live");
        assert_eq!(removed.len(), 3);
        assert!(g.edge(e0).is_none());
        assert!(g.remove_edge(e0).is_none());

        assert_eq!(g.edge(e1).map(|e| e.id), Some(e1));
        assert_eq!(g.num_edges(), 1);
        assert_eq!(g.edge_capacity(), 2);
        assert_eq!(g.nodes()[a].incident_edges, vec![e1]);
    }

    #[test]
    fn self_loop_counts_both_ends() {
        let mut g = TopologicalGraph::new(4, 4);
        let a = g.add_node(NodeKind::LoopAnchor, (1, 1), vec![(1, 1)]);
        let e = g
            .add_edge(a, a, vec![(1, 1), (2, 1), (2, 2), (1, 2)], vec![0; 4])
            .expect("valid loop");

        assert!(g.edge(e).is_some_and(|e| e.is_loop()));
        assert_eq!(g.node_degree(a), 2);
        assert_eq!(g.other_end(e, a), Some(a));

        g.remove_edge(e);
        assert_eq!(g.node_degree(a), 0);
    }

    #[test]
    fn add_edge_validates_inputs() {
        let mut g = TopologicalGraph::new(4, 4);
        let a = g.add_node(NodeKind::End, (0, 0), vec![(0, 0)]);

        assert_eq!(
            g.add_edge(a, 7, Vec::new(), Vec::new()),
            Err(TopologyError::UnknownNode(7))
        );
        assert_eq!(
            g.add_edge(a, a, vec![(1, 1)], Vec::new()),
            Err(TopologyError::ChainWidthMismatch {
                pixels: 1,
                widths: 0
            })
        );
    }
}
