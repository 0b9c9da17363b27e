use log::{debug, trace};
use sv_core::Vec2f;
use sv_fit::RefinedGraph;
use sv_topo::{EdgeId, NodeId};

use crate::{Hypergraph, HypergraphError, SuperEdgeId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HyperConfig {
    /// Largest bend, in degrees, accepted when continuing through a junction.
    pub continuity_angle_deg: f32,
    /// Extend dangling super-edges one edge along a super-edge they end on.
    pub pass_through_overlap: bool,
}

impl Default for HyperConfig {
    fn default() -> Self {
        Self {
            continuity_angle_deg: 35.0,
            pass_through_overlap: false,
        }
    }
}

/// Groups refined edges into super-edges.
///
/// Chains are first joined through every degree-2 node. At nodes of degree
/// three or more, super-edge ends are then paired greedily by how straight the
/// curve continues across the node. Operations that fail are skipped; the
/// result always covers every live edge.
#[derive(Debug, Clone, Default)]
pub struct HypergraphBuilder {
    cfg: HyperConfig,
}

#[derive(Debug, Clone, Copy)]
struct EndAt {
    id: SuperEdgeId,
    /// Direction leaving the node along the super-edge.
    dir: Vec2f,
}

impl HypergraphBuilder {
    pub fn new(cfg: HyperConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &HyperConfig {
        &self.cfg
    }

    pub fn build(&self, refined: &RefinedGraph) -> Result<Hypergraph, HypergraphError> {
        let graph = &refined.graph;
        let mut hyper = Hypergraph::from_topology(graph);
        let initial = hyper.len();

        let mut through = 0usize;
        for node in graph.nodes() {
            if graph.node_degree(node.id) != 2 {
                continue;
            }
            let ends = hyper.ends_at(node.id);
            if ends.len() != 2 || ends[0] == ends[1] {
                continue;
            }
            let (c, other) = (ends[0], ends[1]);
            match hyper.merge_via(c, other, node.id) {
                Ok(_) => through += 1,
                Err(err) => debug!("node {}: {err}", node.id),
            }
        }

        let max_dev = self.cfg.continuity_angle_deg.to_radians();
        let mut paired = 0usize;
        for node in graph.nodes() {
            if graph.node_degree(node.id) < 3 {
                continue;
            }
            paired += pair_at_junction(&mut hyper, refined, node.id, max_dev);
        }

        let mut overlaps = 0usize;
        if self.cfg.pass_through_overlap {
            overlaps = extend_through(&mut hyper);
        }

        hyper.check_coverage(graph)?;
        debug!(
            "hypergraph: {initial} edges -> {} super-edges ({through} through, {paired} paired, {overlaps} overlaps)",
            hyper.len()
        );
        Ok(hyper)
    }
}

/// Pairs open super-edge ends at `node` by smallest bend, up to `max_dev`.
fn pair_at_junction(
    hyper: &mut Hypergraph,
    refined: &RefinedGraph,
    node: NodeId,
    max_dev: f32,
) -> usize {
    let ends: Vec<EndAt> = hyper
        .ends_at(node)
        .iter()
        .filter_map(|&id| {
            let s = hyper.get(id)?;
            if s.is_closed() {
                return None;
            }
            let edge = if s.first() == node {
                s.edges()[0]
            } else {
                s.edges()[s.edges().len() - 1]
            };
            let dir = leaving_direction(refined, edge, node)?;
            Some(EndAt { id, dir })
        })
        .collect();

    let mut candidates = Vec::new();
    for (i, p) in ends.iter().enumerate() {
        for q in &ends[i + 1..] {
            if p.id == q.id {
                continue;
            }
            // Straight continuation leaves in opposite directions.
            let dev = p.dir.angle_to(-q.dir);
            if dev <= max_dev {
                candidates.push((dev, p.id, q.id));
            }
        }
    }
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut used: Vec<SuperEdgeId> = Vec::new();
    let mut merged = 0;
    for (dev, p, q) in candidates {
        if used.contains(&p) || used.contains(&q) {
            continue;
        }
        match hyper.merge_via(p, q, node) {
            Ok(_) => {
                trace!("node {node}: paired {p} and {q}, bend {:.1} deg", dev.to_degrees());
                used.extend([p, q]);
                merged += 1;
            }
            Err(err) => debug!("node {node}: {err}"),
        }
    }
    merged
}

/// Direction in which `edge`'s curve leaves `node`; `None` for self-loops
/// and degenerate curves.
fn leaving_direction(refined: &RefinedGraph, edge: EdgeId, node: NodeId) -> Option<Vec2f> {
    let e = refined.graph.edge(edge)?;
    let curve = &refined.curve(edge)?.bezier;
    if e.is_loop() {
        return None;
    }
    let dir = if e.a == node {
        curve.start_tangent()
    } else if e.b == node {
        curve.end_tangent()
    } else {
        return None;
    };
    (dir.norm() > 0.0).then_some(dir)
}

/// Overlaps each super-edge with an end inside another super-edge. A
/// super-edge reversed to present that end is restored when the overlap fails.
fn extend_through(hyper: &mut Hypergraph) -> usize {
    let mut count = 0;
    for c in hyper.ids() {
        let Some((first, last)) = hyper.get(c).map(|s| (s.first(), s.last())) else {
            continue;
        };
        let (host, flip) = match (host_of(hyper, c, last), host_of(hyper, c, first)) {
            (Some(h), _) => (h, false),
            (None, Some(h)) => (h, true),
            (None, None) => continue,
        };
        if flip {
            hyper.reverse(c);
        }
        match hyper.overlap(c, host) {
            Ok(()) => count += 1,
            Err(err) => {
                debug!("super-edge {c}: {err}");
                if flip {
                    hyper.reverse(c);
                }
            }
        }
    }
    count
}

fn host_of(hyper: &Hypergraph, c: SuperEdgeId, node: NodeId) -> Option<SuperEdgeId> {
    hyper
        .iter()
        .find(|&(id, s)| id != c && s.interior_position(node).is_some())
        .map(|(id, _)| id)
}
