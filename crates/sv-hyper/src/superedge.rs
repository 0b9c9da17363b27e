use sv_topo::{EdgeId, NodeId};

use crate::Violation;

/// Node path through the topology, one edge per consecutive node pair.
///
/// `edges[k]` connects `nodes[k]` and `nodes[k + 1]`, so a super-edge with
/// `n` nodes always carries `n - 1` edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperEdge {
    nodes: Vec<NodeId>,
    edges: Vec<EdgeId>,
}

impl SuperEdge {
    /// Super-edge spanning exactly one topological edge.
    pub fn single(a: NodeId, b: NodeId, edge: EdgeId) -> Self {
        Self {
            nodes: vec![a, b],
            edges: vec![edge],
        }
    }

    pub fn from_parts(nodes: Vec<NodeId>, edges: Vec<EdgeId>) -> Result<Self, Violation> {
        if nodes.len() < 2 || edges.len() + 1 != nodes.len() {
            return Err(Violation::MalformedSequence);
        }
        Ok(Self { nodes, edges })
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn first(&self) -> NodeId {
        self.nodes[0]
    }

    pub fn last(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.first() == self.last()
    }

    /// Nodes strictly between the two endpoints.
    pub fn interior(&self) -> &[NodeId] {
        &self.nodes[1..self.nodes.len() - 1]
    }

    /// Position of `node` among the interior nodes, as an index into `nodes`.
    pub fn interior_position(&self, node: NodeId) -> Option<usize> {
        self.interior().iter().position(|&n| n == node).map(|i| i + 1)
    }

    pub fn has_endpoint(&self, node: NodeId) -> bool {
        self.first() == node || self.last() == node
    }

    pub fn reversed(&self) -> Self {
        let mut nodes = self.nodes.clone();
        let mut edges = self.edges.clone();
        nodes.reverse();
        edges.reverse();
        Self { nodes, edges }
    }

    /// Consecutive (node, edge, node) steps along the path.
    pub fn steps(&self) -> impl Iterator<Item = (NodeId, EdgeId, NodeId)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .map(|(k, &e)| (self.nodes[k], e, self.nodes[k + 1]))
    }

    pub(crate) fn push(&mut self, edge: EdgeId, node: NodeId) {
        self.edges.push(edge);
        self.nodes.push(node);
    }

    pub(crate) fn truncate(&mut self, nodes: usize) {
        self.nodes.truncate(nodes);
        self.edges.truncate(nodes - 1);
    }

    /// First node that directly follows itself, if any.
    pub(crate) fn consecutive_repeat(&self) -> Option<NodeId> {
        self.nodes.windows(2).find(|w| w[0] == w[1]).map(|w| w[0])
    }

    /// First interior node that occurs more than once along the path.
    pub(crate) fn revisited_interior(&self) -> Option<NodeId> {
        self.interior()
            .iter()
            .copied()
            .find(|&n| self.nodes.iter().filter(|&&m| m == n).count() > 1)
    }

    /// Cuts at `index`; `self` keeps `nodes[..=index]`, the tail is returned.
    pub(crate) fn split_off(&mut self, index: usize) -> Self {
        let tail_edges = self.edges.split_off(index);
        let tail_nodes = self.nodes[index..].to_vec();
        self.nodes.truncate(index + 1);
        Self {
            nodes: tail_nodes,
            edges: tail_edges,
        }
    }
}

/// Result of [`splice`], with the orientation choices needed to undo it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spliced {
    pub merged: SuperEdge,
    /// Index of the shared node in `merged`.
    pub join: usize,
    /// `a` forms `merged[..=join]`; otherwise it forms `merged[join..]`.
    pub a_leads: bool,
    /// `b` appears in `merged` against its own direction.
    pub b_reversed: bool,
}

/// Joins `b` onto `a` at the shared endpoint `at`.
///
/// The concatenation keeps `a`'s direction: it starts with `a` when `a` ends
/// at `at` and ends with `a` otherwise.
pub(crate) fn splice(a: &SuperEdge, b: &SuperEdge, at: NodeId) -> Result<Spliced, Violation> {
    let (head, tail, a_leads, b_reversed) = if a.last() == at {
        let (b, flipped) = orient_from(b, at)?;
        (a.clone(), b, true, flipped)
    } else if a.first() == at {
        let (b, flipped) = orient_from(b, at)?;
        (b.reversed(), a.clone(), false, !flipped)
    } else {
        return Err(Violation::NoSharedEndpoint);
    };

    let join = head.len() - 1;
    let mut nodes = head.nodes;
    nodes.extend_from_slice(&tail.nodes[1..]);
    let mut edges = head.edges;
    edges.extend_from_slice(&tail.edges);
    let merged = SuperEdge { nodes, edges };
    if let Some(node) = merged.consecutive_repeat() {
        return Err(Violation::ConsecutiveRepeat { node });
    }
    if let Some(node) = merged.revisited_interior() {
        return Err(Violation::RevisitsInterior { node });
    }
    Ok(Spliced {
        merged,
        join,
        a_leads,
        b_reversed,
    })
}

/// `s` oriented to start at `at`, and whether that took a reversal.
fn orient_from(s: &SuperEdge, at: NodeId) -> Result<(SuperEdge, bool), Violation> {
    if s.first() == at {
        Ok((s.clone(), false))
    } else if s.last() == at {
        Ok((s.reversed(), true))
    } else {
        Err(Violation::NoSharedEndpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(nodes: &[NodeId]) -> SuperEdge {
        let edges = (0..nodes.len() - 1)
            .map(|k| 100 + nodes[k] * 10 + nodes[k + 1])
            .collect();
        SuperEdge::from_parts(nodes.to_vec(), edges).unwrap()
    }

    #[test]
    fn from_parts_checks_lengths() {
        assert_eq!(SuperEdge::from_parts(vec![1], vec![]), Err(Violation::MalformedSequence));
        assert_eq!(SuperEdge::from_parts(vec![1, 2], vec![]), Err(Violation::MalformedSequence));
        assert!(SuperEdge::from_parts(vec![1, 2], vec![7]).is_ok());
    }

    #[test]
    fn splice_appends_and_prepends() {
        let c = path(&[1, 2, 3]);
        let d = path(&[3, 4, 5]);
        let s = splice(&c, &d, 3).unwrap();
        assert_eq!(s.merged.nodes(), &[1, 2, 3, 4, 5]);
        assert_eq!(s.merged.edges(), &[112, 123, 134, 145]);
        assert_eq!(s.join, 2);
        assert!(s.a_leads && !s.b_reversed);

        let e = path(&[5, 4, 1]);
        let s = splice(&c, &e, 1).unwrap();
        assert_eq!(s.merged.nodes(), &[5, 4, 1, 2, 3]);
        assert_eq!(s.merged.edges(), &[154, 141, 112, 123]);
        assert_eq!(s.join, 2);
        assert!(!s.a_leads && !s.b_reversed);
    }

    #[test]
    fn splice_reverses_partner_as_needed() {
        let c = path(&[1, 2, 3]);
        let d = path(&[5, 4, 3]);
        let s = splice(&c, &d, 3).unwrap();
        assert_eq!(s.merged.nodes(), &[1, 2, 3, 4, 5]);
        assert_eq!(s.merged.edges(), &[112, 123, 143, 154]);
        assert!(s.b_reversed);

        let e = path(&[1, 6]);
        let s = splice(&c, &e, 1).unwrap();
        assert_eq!(s.merged.nodes(), &[6, 1, 2, 3]);
        assert!(!s.a_leads && s.b_reversed);
    }

    #[test]
    fn splice_rejects_interior_revisit_but_allows_closing() {
        let c = path(&[1, 2, 3]);
        let back = path(&[3, 4, 2]);
        assert_eq!(
            splice(&c, &back, 3).map(|s| s.join),
            Err(Violation::RevisitsInterior { node: 2 })
        );
        let onto_first = path(&[3, 1, 5]);
        assert_eq!(
            splice(&c, &onto_first, 3).map(|s| s.join),
            Err(Violation::RevisitsInterior { node: 1 })
        );
        let close = path(&[3, 4, 1]);
        let s = splice(&c, &close, 3).unwrap();
        assert!(s.merged.is_closed());
    }

    #[test]
    fn splice_rejects_self_loops() {
        let c = path(&[1, 2]);
        let lp = SuperEdge::single(2, 2, 9);
        assert_eq!(
            splice(&c, &lp, 2).map(|s| s.join),
            Err(Violation::ConsecutiveRepeat { node: 2 })
        );
    }

    #[test]
    fn split_off_shares_the_cut_node() {
        let mut c = path(&[1, 2, 3, 4]);
        let tail = c.split_off(2);
        assert_eq!(c.nodes(), &[1, 2, 3]);
        assert_eq!(c.edges(), &[112, 123]);
        assert_eq!(tail.nodes(), &[3, 4]);
        assert_eq!(tail.edges(), &[134]);
    }
}
