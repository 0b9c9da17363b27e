use std::collections::{HashMap, HashSet};

use log::trace;
use sv_topo::{NodeId, TopologicalGraph};

use crate::superedge::splice;
use crate::{HyperOp, HypergraphError, SuperEdge, Violation};

pub type SuperEdgeId = usize;

/// Outcome of a merge; [`Hypergraph::unmerge`] uses it to restore both
/// operands exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeReceipt {
    /// Super-edge removed by the merge.
    pub absorbed: SuperEdgeId,
    /// Index of the shared node in the merged sequence.
    pub join: usize,
    /// Node count of the merged sequence.
    pub len: usize,
    /// The surviving super-edge forms the head `nodes[..=join]`.
    pub kept_leads: bool,
    /// The absorbed super-edge was reversed to line up.
    pub absorbed_reversed: bool,
}

/// Super-edges over a topological graph, addressed by stable ids.
///
/// Removed super-edges leave an empty slot. An index from node to the
/// super-edges ending there is kept in step with every operation; a closed
/// super-edge is listed twice under its endpoint.
#[derive(Debug, Clone, Default)]
pub struct Hypergraph {
    slots: Vec<Option<SuperEdge>>,
    ends: HashMap<NodeId, Vec<SuperEdgeId>>,
}

impl Hypergraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// One single-edge super-edge per live topological edge, in edge order.
    pub fn from_topology(graph: &TopologicalGraph) -> Self {
        let mut hyper = Self::new();
        for edge in graph.live_edges() {
            hyper.insert(SuperEdge::single(edge.a, edge.b, edge.id));
        }
        hyper
    }

    pub fn insert(&mut self, edge: SuperEdge) -> SuperEdgeId {
        let id = self.slots.len();
        self.slots.push(Some(edge));
        self.index(id);
        id
    }

    pub fn get(&self, id: SuperEdgeId) -> Option<&SuperEdge> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    /// Active super-edges in id order.
    pub fn iter(&self) -> impl Iterator<Item = (SuperEdgeId, &SuperEdge)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, s)| s.as_ref().map(|s| (id, s)))
    }

    pub fn ids(&self) -> Vec<SuperEdgeId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Number of active super-edges.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Super-edges with an endpoint at `node`.
    pub fn ends_at(&self, node: NodeId) -> &[SuperEdgeId] {
        self.ends.get(&node).map_or(&[], Vec::as_slice)
    }

    /// Joins `other` onto `c` at a shared endpoint; `other` is removed.
    ///
    /// The end of `c` is tried before its start. `c` keeps its direction.
    pub fn merge(
        &mut self,
        c: SuperEdgeId,
        other: SuperEdgeId,
    ) -> Result<MergeReceipt, HypergraphError> {
        let (a, b) = self.pair(HyperOp::Merge, c, other)?;
        let at = [a.last(), a.first()]
            .into_iter()
            .find(|&x| b.has_endpoint(x))
            .ok_or(HypergraphError::invalid(HyperOp::Merge, Violation::NoSharedEndpoint))?;
        self.merge_via(c, other, at)
    }

    /// Joins `other` onto `c` at the endpoint `at` shared by both.
    pub fn merge_via(
        &mut self,
        c: SuperEdgeId,
        other: SuperEdgeId,
        at: NodeId,
    ) -> Result<MergeReceipt, HypergraphError> {
        let (a, b) = self.pair(HyperOp::Merge, c, other)?;
        let spliced = splice(a, b, at).map_err(|r| HypergraphError::invalid(HyperOp::Merge, r))?;
        let receipt = MergeReceipt {
            absorbed: other,
            join: spliced.join,
            len: spliced.merged.len(),
            kept_leads: spliced.a_leads,
            absorbed_reversed: spliced.b_reversed,
        };
        trace!("merge {c} + {other} at node {at}");
        self.unindex(c);
        self.unindex(other);
        self.slots[other] = None;
        self.slots[c] = Some(spliced.merged);
        self.index(c);
        Ok(receipt)
    }

    /// Merges `c` with the first other super-edge ending at `x` that can be
    /// joined there.
    pub fn merge_at(
        &mut self,
        c: SuperEdgeId,
        x: NodeId,
    ) -> Result<MergeReceipt, HypergraphError> {
        let invalid = |r| HypergraphError::invalid(HyperOp::Merge, r);
        let a = self.get(c).ok_or(invalid(Violation::UnknownSuperEdge(c)))?;
        if !a.has_endpoint(x) {
            return Err(invalid(Violation::NoSharedEndpoint));
        }
        let mut first_failure = None;
        let mut partner = None;
        for &other in self.ends_at(x) {
            if other == c {
                continue;
            }
            let Some(b) = self.get(other) else { continue };
            match splice(a, b, x) {
                Ok(_) => {
                    partner = Some(other);
                    break;
                }
                Err(reason) => {
                    first_failure.get_or_insert(reason);
                }
            }
        }
        let Some(other) = partner else {
            return Err(invalid(
                first_failure.unwrap_or(Violation::NoQualifyingPartner { node: x }),
            ));
        };
        self.merge_via(c, other, x)
    }

    /// Flips the travel direction of `c`; its endpoints stay indexed.
    pub(crate) fn reverse(&mut self, c: SuperEdgeId) -> bool {
        match self.slots.get_mut(c).and_then(Option::as_mut) {
            Some(s) => {
                *s = s.reversed();
                true
            }
            None => false,
        }
    }

    /// Cuts `c` at interior index `i`; `c` keeps `nodes[..=i]` and the new
    /// super-edge returned gets `nodes[i..]`.
    pub fn split(&mut self, c: SuperEdgeId, i: usize) -> Result<SuperEdgeId, HypergraphError> {
        let invalid = |r| HypergraphError::invalid(HyperOp::Split, r);
        let len = self.get(c).ok_or(invalid(Violation::UnknownSuperEdge(c)))?.len();
        if i == 0 || i + 1 >= len {
            return Err(invalid(Violation::SplitIndexOutOfRange {
                index: i,
                last: len - 1,
            }));
        }
        self.unindex(c);
        let tail = match self.slots[c].as_mut() {
            Some(s) => s.split_off(i),
            None => return Err(invalid(Violation::UnknownSuperEdge(c))),
        };
        self.index(c);
        let id = self.insert(tail);
        trace!("split {c} at {i} -> {id}");
        Ok(id)
    }

    /// Splits `c` at the join recorded by `receipt`, undoing that merge.
    ///
    /// `c` gets back its own nodes and the returned super-edge holds the
    /// absorbed sequence, both in their pre-merge direction.
    pub fn unmerge(
        &mut self,
        c: SuperEdgeId,
        receipt: &MergeReceipt,
    ) -> Result<SuperEdgeId, HypergraphError> {
        let invalid = |r| HypergraphError::invalid(HyperOp::Split, r);
        let len = self.get(c).ok_or(invalid(Violation::UnknownSuperEdge(c)))?.len();
        if len != receipt.len {
            return Err(invalid(Violation::StaleMerge {
                expected: receipt.len,
                found: len,
            }));
        }
        let i = receipt.join;
        if i == 0 || i + 1 >= len {
            return Err(invalid(Violation::SplitIndexOutOfRange {
                index: i,
                last: len - 1,
            }));
        }

        self.unindex(c);
        let Some(mut head) = self.slots[c].take() else {
            return Err(invalid(Violation::UnknownSuperEdge(c)));
        };
        let tail = head.split_off(i);
        let (kept, mut absorbed) = if receipt.kept_leads {
            (head, tail)
        } else {
            (tail, head)
        };
        if receipt.absorbed_reversed {
            absorbed = absorbed.reversed();
        }
        self.slots[c] = Some(kept);
        self.index(c);
        let id = self.insert(absorbed);
        trace!("unmerge {c} at {i} -> {id}");
        Ok(id)
    }

    /// Extends `c` by one edge of `other` past `c`'s last node, which must be
    /// interior to `other`. `other` is left unchanged.
    ///
    /// `c` keeps travelling the way it entered `other`: if the node before
    /// its end is `other`'s successor of the shared node, the extension goes
    /// to the predecessor, otherwise to the successor.
    pub fn overlap(&mut self, c: SuperEdgeId, other: SuperEdgeId) -> Result<(), HypergraphError> {
        let invalid = |r| HypergraphError::invalid(HyperOp::Overlap, r);
        let (a, b) = self.pair(HyperOp::Overlap, c, other)?;
        let x = a.last();
        let j = b
            .interior_position(x)
            .ok_or(invalid(Violation::NotInterior { node: x }))?;
        let prev = a.nodes()[a.len() - 2];
        let (edge, node) = if prev == b.nodes()[j + 1] {
            (b.edges()[j - 1], b.nodes()[j - 1])
        } else {
            (b.edges()[j], b.nodes()[j + 1])
        };

        let mut extended = a.clone();
        extended.push(edge, node);
        if let Some(n) = extended.consecutive_repeat() {
            return Err(invalid(Violation::ConsecutiveRepeat { node: n }));
        }
        if let Some(n) = extended.revisited_interior() {
            return Err(invalid(Violation::RevisitsInterior { node: n }));
        }
        trace!("overlap {c} past node {x} along {other}");
        self.unindex(c);
        self.slots[c] = Some(extended);
        self.index(c);
        Ok(())
    }

    /// Cuts `c` back to `x` where its tail past `x` runs along `other`.
    ///
    /// `x` must be interior to `other` and the removed tail must match
    /// `other` walked from `x` in either direction. Undoes [`Self::overlap`].
    pub fn dissociate(
        &mut self,
        c: SuperEdgeId,
        other: SuperEdgeId,
        x: NodeId,
    ) -> Result<(), HypergraphError> {
        let invalid = |r| HypergraphError::invalid(HyperOp::Dissociate, r);
        let (a, b) = self.pair(HyperOp::Dissociate, c, other)?;
        let j = b
            .interior_position(x)
            .ok_or(invalid(Violation::NotInterior { node: x }))?;
        let no_extension = invalid(Violation::NoSharedExtension { node: x });
        let k = a.nodes()[..a.len() - 1]
            .iter()
            .rposition(|&n| n == x)
            .ok_or(no_extension)?;
        // A cut at the start would leave no edge.
        if k == 0 {
            return Err(no_extension);
        }
        let tail_nodes = &a.nodes()[k + 1..];
        let tail_edges = &a.edges()[k..];
        let forward = tail_nodes.iter().zip(tail_edges).enumerate().all(|(s, (&n, &e))| {
            b.nodes().get(j + 1 + s) == Some(&n) && b.edges().get(j + s) == Some(&e)
        });
        let backward = tail_nodes.iter().zip(tail_edges).enumerate().all(|(s, (&n, &e))| {
            j > s && b.nodes()[j - 1 - s] == n && b.edges()[j - 1 - s] == e
        });
        if !forward && !backward {
            return Err(no_extension);
        }
        trace!("dissociate {c} from {other} at node {x}");
        self.unindex(c);
        if let Some(s) = self.slots[c].as_mut() {
            s.truncate(k + 1);
        }
        self.index(c);
        Ok(())
    }

    /// Fails on the first live topological edge no super-edge contains.
    pub fn check_coverage(&self, graph: &TopologicalGraph) -> Result<(), HypergraphError> {
        let covered: HashSet<_> = self
            .iter()
            .flat_map(|(_, s)| s.edges().iter().copied())
            .collect();
        match graph.live_edges().find(|e| !covered.contains(&e.id)) {
            Some(edge) => Err(HypergraphError::CoverageViolated { edge: edge.id }),
            None => Ok(()),
        }
    }

    fn pair(
        &self,
        op: HyperOp,
        c: SuperEdgeId,
        other: SuperEdgeId,
    ) -> Result<(&SuperEdge, &SuperEdge), HypergraphError> {
        if c == other {
            return Err(HypergraphError::invalid(op, Violation::SameSuperEdge));
        }
        let a = self
            .get(c)
            .ok_or(HypergraphError::invalid(op, Violation::UnknownSuperEdge(c)))?;
        let b = self
            .get(other)
            .ok_or(HypergraphError::invalid(op, Violation::UnknownSuperEdge(other)))?;
        Ok((a, b))
    }

    fn index(&mut self, id: SuperEdgeId) {
        if let Some((first, last)) = self.get(id).map(|s| (s.first(), s.last())) {
            self.ends.entry(first).or_default().push(id);
            self.ends.entry(last).or_default().push(id);
        }
    }

    fn unindex(&mut self, id: SuperEdgeId) {
        let Some((first, last)) = self.get(id).map(|s| (s.first(), s.last())) else {
            return;
        };
        for node in [first, last] {
            if let Some(list) = self.ends.get_mut(&node) {
                if let Some(pos) = list.iter().position(|&s| s == id) {
                    list.swap_remove(pos);
                }
                if list.is_empty() {
                    self.ends.remove(&node);
                }
            }
        }
    }
}
