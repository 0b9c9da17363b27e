use std::collections::VecDeque;

use sv_core::{NEIGHBORS_8, Raster};

use crate::TopologyError;
use crate::graph::NodeId;
use crate::pixel::PixelClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChainEnds {
    Open { a: NodeId, b: NodeId },
    /// The walk came back to its seed without meeting a node.
    Closed,
}

#[derive(Debug, Clone)]
pub(crate) struct TracedChain {
    /// Linear pixel indices ordered from `a` to `b`. For a closed ring the
    /// seed comes first and the rest follow the ring.
    pub pixels: Vec<usize>,
    pub ends: ChainEnds,
}

enum Stop {
    Node(NodeId),
    Seed,
}

/// Walks runs of chain pixels between node clusters.
pub(crate) struct ChainTracer<'a> {
    classes: &'a Raster<PixelClass>,
    node_at: &'a [Option<NodeId>],
    visited: Vec<bool>,
}

impl<'a> ChainTracer<'a> {
    pub fn new(classes: &'a Raster<PixelClass>, node_at: &'a [Option<NodeId>]) -> Self {
        Self {
            classes,
            node_at,
            visited: vec![false; classes.len()],
        }
    }

    pub fn is_visited(&self, idx: usize) -> bool {
        self.visited[idx]
    }

    /// Traces the chain through `seed` in both directions.
    pub fn trace(&mut self, seed: usize) -> Result<TracedChain, TopologyError> {
        self.visit(seed)?;
        let [fwd, back] = self.chain_neighbors(seed)?;

        let mut chain = VecDeque::from([seed]);
        let (ahead, stop_ahead) = self.follow_chain(seed, seed, fwd)?;
        chain.extend(ahead);

        let b = match stop_ahead {
            Stop::Node(id) => id,
            Stop::Seed => {
                return Ok(TracedChain {
                    pixels: chain.into(),
                    ends: ChainEnds::Closed,
                });
            }
        };

        let (behind, stop_behind) = self.follow_chain(seed, seed, back)?;
        for p in behind {
            chain.push_front(p);
        }

        let a = match stop_behind {
            Stop::Node(id) => id,
            Stop::Seed => return Err(self.degenerate(seed, "ring closed on one side only")),
        };

        Ok(TracedChain {
            pixels: chain.into(),
            ends: ChainEnds::Open { a, b },
        })
    }

    fn follow_chain(
        &mut self,
        seed: usize,
        from: usize,
        to: usize,
    ) -> Result<(Vec<usize>, Stop), TopologyError> {
        let mut out = Vec::new();
        let mut prev = from;
        let mut cur = to;

        loop {
            if cur == seed {
                return Ok((out, Stop::Seed));
            }

            let class = self.classes.data()[cur];
            match class {
                PixelClass::Chain => {
                    self.visit(cur)?;
                    out.push(cur);

                    let [n0, n1] = self.chain_neighbors(cur)?;
                    let next = if n0 == prev {
                        n1
                    } else if n1 == prev {
                        n0
                    } else {
                        return Err(
                            self.degenerate(cur, "chain pixel detached from its predecessor")
                        );
                    };
                    prev = cur;
                    cur = next;
                }
                PixelClass::Corner | PixelClass::Node { .. } => {
                    let id = self.node_at[cur]
                        .ok_or_else(|| self.degenerate(cur, "node pixel without a node"))?;
                    return Ok((out, Stop::Node(id)));
                }
                PixelClass::Background => {
                    return Err(self.degenerate(cur, "chain stepped off the drawing"));
                }
            }
        }
    }

    fn visit(&mut self, idx: usize) -> Result<(), TopologyError> {
        if self.visited[idx] {
            return Err(self.degenerate(idx, "pixel visited twice"));
        }
        self.visited[idx] = true;
        Ok(())
    }

    fn chain_neighbors(&self, idx: usize) -> Result<[usize; 2], TopologyError> {
        let mut found = [0_usize; 2];
        let mut n = 0;
        for dir in NEIGHBORS_8 {
            let Some(nb) = self.classes.offset_index(idx, dir) else {
                continue;
            };
            if self.classes.data()[nb] == PixelClass::Background {
                continue;
            }
            if n == 2 {
                return Err(self.degenerate(idx, "chain pixel with more than two neighbors"));
            }
            found[n] = nb;
            n += 1;
        }

        if n != 2 {
            return Err(self.degenerate(idx, "chain pixel with fewer than two neighbors"));
        }
        Ok(found)
    }

    fn degenerate(&self, idx: usize, reason: &'static str) -> TopologyError {
        let (x, y) = self.classes.coords(idx);
        TopologyError::DegenerateChain { x, y, reason }
    }
}

#[cfg(test)]
mod tests {
    use sv_core::Raster;

    use super::{ChainEnds, ChainTracer};
    use crate::TopologyError;
    use crate::pixel::{PixelClass, PixelGraph, classify_pixels};

    fn node_ids(classes: &Raster<PixelClass>) -> Vec<Option<usize>> {
        let mut next = 0;
        classes
            .data()
            .iter()
            .map(|c| {
                c.is_node().then(|| {
                    next += 1;
                    next - 1
                })
            })
            .collect()
    }

    #[test]
    fn chain_is_ordered_between_nodes() {
        let g = PixelGraph::from_mask(Raster::from_ascii(&["######"]));
        let classes = classify_pixels(&g);
        let node_at = node_ids(&classes);
        let mut tracer = ChainTracer::new(&classes, &node_at);

        // Seed in the middle; the chain still comes out end to end.
        let chain = tracer.trace(3).expect("valid chain");
        assert_eq!(chain.pixels, vec![1, 2, 3, 4]);
        assert_eq!(chain.ends, ChainEnds::Open { a: 0, b: 1 });
        assert!((1..5).all(|i| tracer.is_visited(i)));
    }

    #[test]
    fn ring_without_nodes_is_closed() {
        let g = PixelGraph::from_mask(Raster::from_ascii(&[".#.", "#.#", ".#."]));
        let classes = classify_pixels(&g);
        let node_at = node_ids(&classes);
        let mut tracer = ChainTracer::new(&classes, &node_at);

        let chain = tracer.trace(1).expect("valid ring");
        assert_eq!(chain.ends, ChainEnds::Closed);
        assert_eq!(chain.pixels.len(), 4);
        assert_eq!(chain.pixels[0], 1);
    }

    #[test]
    fn second_trace_of_same_pixel_is_degenerate() {
        let g = PixelGraph::from_mask(Raster::from_ascii(&["####"]));
        let classes = classify_pixels(&g);
        let node_at = node_ids(&classes);
        let mut tracer = ChainTracer::new(&classes, &node_at);

        tracer.trace(1).expect("first trace");
        assert_eq!(
            tracer.trace(2).unwrap_err(),
            TopologyError::DegenerateChain {
                x: 2,
                y: 0,
                reason: "pixel visited twice"
            }
        );
    }
}
