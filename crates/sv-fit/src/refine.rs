use std::collections::VecDeque;

use log::debug;
use sv_core::Point2f;
use sv_topo::{EdgeId, NodeKind, TopologicalGraph};

use crate::FitError;
use crate::fit::{FittedCurve, chord_parametrize, fit_edge, max_error_index};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefineConfig {
    /// Largest accepted weighted RMS deviation, in pixels.
    pub error_threshold: f32,
    /// Chains shorter than this are never split.
    pub min_chain_len: usize,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            error_threshold: 2.0,
            min_chain_len: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefineStats {
    pub initial_edges: usize,
    pub splits: usize,
    /// Edges whose final curve is the straight-line fallback.
    pub fallbacks: usize,
    /// Edges left above the error bound because they hit the length floor.
    pub floor_hits: usize,
}

/// Topology after refinement, with one curve per live edge.
#[derive(Debug, Clone)]
pub struct RefinedGraph {
    pub graph: TopologicalGraph,
    curves: Vec<Option<FittedCurve>>,
    pub stats: RefineStats,
}

impl RefinedGraph {
    pub fn curve(&self, edge: EdgeId) -> Option<&FittedCurve> {
        self.curves.get(edge).and_then(Option::as_ref)
    }

    pub fn curves(&self) -> impl Iterator<Item = &FittedCurve> {
        self.curves.iter().flatten()
    }

    /// Largest error over all curves.
    pub fn max_error(&self) -> f32 {
        self.curves().map(|c| c.error).fold(0.0, f32::max)
    }
}

/// Error-driven chain splitting over a bounded work-queue.
#[derive(Debug, Clone, Default)]
pub struct Refiner {
    cfg: RefineConfig,
}

impl Refiner {
    pub fn new(cfg: RefineConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &RefineConfig {
        &self.cfg
    }

    /// Fits every edge, then splits edges over the error bound at their worst
    /// pixel until each child fits or reaches the length floor.
    pub fn refine(&self, mut graph: TopologicalGraph) -> Result<RefinedGraph, FitError> {
        let ids: Vec<EdgeId> = graph.live_edges().map(|e| e.id).collect();
        let initial = fit_all(&graph, &ids)?;

        let mut curves: Vec<Option<FittedCurve>> = vec![None; graph.edge_capacity()];
        for fit in initial {
            let id = fit.edge;
            curves[id] = Some(fit);
        }

        let mut stats = RefineStats {
            initial_edges: ids.len(),
            ..RefineStats::default()
        };
        let mut queue: VecDeque<EdgeId> = ids.into();

        while let Some(id) = queue.pop_front() {
            let Some(error) = curves.get(id).and_then(Option::as_ref).map(|c| c.error) else {
                continue;
            };
            if error <= self.cfg.error_threshold {
                continue;
            }

            let Some(edge) = graph.edge(id) else {
                continue;
            };
            if edge.len() < self.cfg.min_chain_len.max(1) {
                stats.floor_hits += 1;
                continue;
            }

            let children = split_edge(&mut graph, &curves, id)?;
            curves[id] = None;
            stats.splits += 1;

            for child in children {
                let fit = fit_edge(&graph, child)?;
                if curves.len() <= child {
                    curves.resize(child + 1, None);
                }
                curves[child] = Some(fit);
                queue.push_back(child);
            }
        }

        stats.fallbacks = curves.iter().flatten().filter(|c| c.fallback).count();
        debug!(
            "refine: {} edges in, {} splits, {} edges out, {} fallbacks, {} at floor",
            stats.initial_edges,
            stats.splits,
            graph.num_edges(),
            stats.fallbacks,
            stats.floor_hits
        );

        Ok(RefinedGraph {
            graph,
            curves,
            stats,
        })
    }
}

/// Replaces `id` by two edges meeting at a new node on its worst pixel.
fn split_edge(
    graph: &mut TopologicalGraph,
    curves: &[Option<FittedCurve>],
    id: EdgeId,
) -> Result<[EdgeId; 2], FitError> {
    let edge = graph.edge(id).ok_or(FitError::UnknownEdge(id))?;
    let curve = curves
        .get(id)
        .and_then(Option::as_ref)
        .ok_or(FitError::UnknownEdge(id))?;

    let points: Vec<Point2f> = edge.points().collect();
    let ts = chord_parametrize(curve.bezier.p0, &points, curve.bezier.p3);
    let k = max_error_index(&curve.bezier, &points, &ts).ok_or(FitError::UnknownEdge(id))?;

    let edge = graph.remove_edge(id).ok_or(FitError::UnknownEdge(id))?;
    let px = edge.pixels[k];
    let mid = graph.add_node(NodeKind::Split, px, vec![px]);

    let left = graph.add_edge(
        edge.a,
        mid,
        edge.pixels[..k].to_vec(),
        edge.widths[..k].to_vec(),
    )?;
    let right = graph.add_edge(
        mid,
        edge.b,
        edge.pixels[k + 1..].to_vec(),
        edge.widths[k + 1..].to_vec(),
    )?;

    Ok([left, right])
}

fn fit_all(graph: &TopologicalGraph, ids: &[EdgeId]) -> Result<Vec<FittedCurve>, FitError> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        ids.par_iter().map(|&id| fit_edge(graph, id)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        ids.iter().map(|&id| fit_edge(graph, id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use sv_topo::{NodeKind, TopologicalGraph};

    use super::{RefineConfig, Refiner};

    fn chain_graph(
        start: (usize, usize),
        pixels: Vec<(usize, usize)>,
        end: (usize, usize),
    ) -> TopologicalGraph {
        let mut g = TopologicalGraph::new(64, 64);
        let a = g.add_node(NodeKind::End, start, vec![start]);
        let b = g.add_node(NodeKind::End, end, vec![end]);
        let widths = vec![0; pixels.len()];
        g.add_edge(a, b, pixels, widths).expect("valid edge");
        g
    }

    #[test]
    fn straight_chain_needs_no_split() {
        let pixels = (1..30).map(|x| (x, 5)).collect();
        let g = chain_graph((0, 5), pixels, (30, 5));

        let refined = Refiner::default().refine(g).expect("refinement succeeds");
        assert_eq!(refined.stats.splits, 0);
        assert_eq!(refined.graph.num_edges(), 1);

        let curve = refined.curve(0).expect("curve for the only edge");
        assert!(!curve.fallback);
        assert!(curve.error < 1e-3);
    }

    #[test]
    fn right_angle_splits_once_at_the_corner() {
        let mut pixels: Vec<(usize, usize)> = (1..=40).map(|x| (x, 0)).collect();
        pixels.extend((1..40).map(|y| (40, y)));
        let g = chain_graph((0, 0), pixels, (40, 40));

        let cfg = RefineConfig::default();
        let refined = Refiner::new(cfg).refine(g).expect("refinement succeeds");
        assert_eq!(refined.stats.splits, 1);
        assert_eq!(refined.graph.num_edges(), 2);

        let split = refined
            .graph
            .nodes()
            .iter()
            .find(|n| n.kind == NodeKind::Split)
            .expect("split node inserted");
        assert_eq!(split.idx, (40, 0));

        for edge in refined.graph.live_edges() {
            let curve = refined.curve(edge.id).expect("child is fitted");
            assert!(curve.error <= cfg.error_threshold);
            assert!(edge.a == split.id || edge.b == split.id);
        }
        assert!(refined.curve(0).is_none());
    }

    #[test]
    fn short_chains_hit_the_floor() {
        let g = chain_graph((0, 0), vec![(3, 9), (6, 0), (9, 9)], (12, 0));
        let refined = Refiner::new(RefineConfig {
            error_threshold: 0.5,
            min_chain_len: 4,
        })
        .refine(g)
        .expect("refinement succeeds");

        assert_eq!(refined.stats.splits, 0);
        assert_eq!(refined.stats.floor_hits, 1);
        assert_eq!(refined.graph.num_edges(), 1);
    }

    #[test]
    fn every_surviving_edge_is_within_bound_or_short() {
        // A zig-zag forces repeated splitting through the queue.
        let mut pixels = Vec::new();
        for i in 1..60 {
            let y = if (i / 10) % 2 == 0 { i % 10 } else { 10 - i % 10 };
            pixels.push((i, y + 10));
        }
        let g = chain_graph((0, 10), pixels, (60, 10));
        let cfg = RefineConfig::default();
        let refined = Refiner::new(cfg).refine(g).expect("refinement succeeds");

        assert!(refined.stats.splits >= 2);
        for edge in refined.graph.live_edges() {
            let curve = refined.curve(edge.id).expect("fitted");
            assert!(curve.error <= cfg.error_threshold || edge.len() < cfg.min_chain_len);
        }

        let total: usize = refined.graph.live_edges().map(|e| e.len()).sum();
        assert_eq!(total + refined.stats.splits, 59);
    }
}
