//! Rank-priority conflict resolvers.
//!
//! Both resolvers scan a node's candidate edges once, most trusted first
//! (highest rank, then lowest edge id), and compare each candidate's
//! descendant leaves with those of the edges already kept. No combinations
//! are searched.
//!
//! # Invariants
//!
//! - Leaf comparison uses the edge's exclusive leaves when it carries them,
//!   but the synthesized subtrees of the kept children never share a node.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use tracing::trace;

use arbor_graph::GraphView;
use arbor_types::{CandidateEdge, EdgeId, EdgeKind, IdSet};

use crate::error::{SelectError, SelectResult};
use crate::strategy::{NodeInput, NodeSelection, NodeSelectionStrategy};

/// How a candidate's leaves relate to a kept edge's leaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictType {
    NoConflict,
    /// The candidate covers part of (or exactly) the kept edge's leaves.
    CandidateSubsetOfKept,
    /// The candidate covers strictly more than the kept edge.
    KeptSubsetOfCandidate,
    /// The two overlap and neither contains the other.
    Incompatible,
}

impl ConflictType {
    pub fn between(candidate: &IdSet, kept: &IdSet) -> Self {
        if !candidate.intersects(kept) {
            Self::NoConflict
        } else if candidate.is_subset(kept) {
            Self::CandidateSubsetOfKept
        } else if kept.is_subset(candidate) {
            Self::KeptSubsetOfCandidate
        } else {
            Self::Incompatible
        }
    }
}

/// Leaves attributed to `edge`: the child's descendants, narrowed to the
/// edge's exclusive leaves when a source-tree edge carries them.
fn attributed_leaves<G: GraphView + ?Sized>(graph: &G, edge: &CandidateEdge) -> SelectResult<IdSet> {
    let all = graph
        .descendant_ids(edge.child)
        .filter(|ids| !ids.is_empty())
        .ok_or(SelectError::MissingDescendants(edge.child))?;
    if edge.kind == EdgeKind::SourceTree && !edge.exclusive_descendant_ids.is_empty() {
        Ok(all.intersection(&edge.exclusive_descendant_ids))
    } else {
        Ok(all.clone())
    }
}

/// A candidate edge with what it is compared on.
struct Scanned<'a> {
    edge: &'a CandidateEdge,
    leaves: IdSet,
    /// Included ids of the child's synthesized subtree.
    nodes: &'a IdSet,
}

impl Scanned<'_> {
    fn shares_nodes(&self, other: &Scanned<'_>) -> bool {
        self.nodes.intersects(other.nodes)
    }
}

fn scan_order<'a>(input: &NodeInput<'a>) -> SelectResult<Vec<Scanned<'a>>> {
    let mut ordered = input.incoming.clone();
    ordered.sort_by_key(|e| (Reverse(e.rank), e.id));
    ordered
        .into_iter()
        .map(|edge| {
            let leaves = attributed_leaves(input.graph, edge)?;
            let nodes = input.child_subtree(edge.child)?.included_ids();
            Ok(Scanned { edge, leaves, nodes })
        })
        .collect()
}

/// Keep each candidate whose leaves and subtree are disjoint from every
/// kept edge's.
///
/// Returns the kept edges in scan order.
pub fn resolve_strict<'a>(input: &NodeInput<'a>) -> SelectResult<Vec<&'a CandidateEdge>> {
    let mut kept: Vec<Scanned<'a>> = Vec::new();
    for candidate in scan_order(input)? {
        let clear = kept
            .iter()
            .all(|k| !k.leaves.intersects(&candidate.leaves) && !k.shares_nodes(&candidate));
        if clear {
            kept.push(candidate);
        } else {
            trace!(edge = %candidate.edge.id, "discarded overlapping candidate");
        }
    }
    Ok(kept.into_iter().map(|k| k.edge).collect())
}

/// Like [`resolve_strict`], but a candidate that strictly contains kept
/// edges displaces them.
///
/// Displaced edges still take part in the leaf comparisons of later
/// candidates and are removed once the scan is over. A candidate that is
/// rejected displaces nothing.
pub fn resolve_inferred_path<'a>(input: &NodeInput<'a>) -> SelectResult<Vec<&'a CandidateEdge>> {
    let mut kept: Vec<Scanned<'a>> = Vec::new();
    let mut displaced: BTreeSet<EdgeId> = BTreeSet::new();

    'scan: for candidate in scan_order(input)? {
        let mut marks = Vec::new();
        for k in &kept {
            match ConflictType::between(&candidate.leaves, &k.leaves) {
                ConflictType::NoConflict => {}
                ConflictType::KeptSubsetOfCandidate => marks.push(k.edge.id),
                conflict @ (ConflictType::CandidateSubsetOfKept | ConflictType::Incompatible) => {
                    trace!(edge = %candidate.edge.id, kept = %k.edge.id, ?conflict, "discarded candidate");
                    continue 'scan;
                }
            }
        }
        let clash = kept.iter().find(|k| {
            !displaced.contains(&k.edge.id)
                && !marks.contains(&k.edge.id)
                && k.shares_nodes(&candidate)
        });
        if let Some(k) = clash {
            trace!(
                edge = %candidate.edge.id,
                kept = %k.edge.id,
                "discarded candidate sharing subtree nodes"
            );
            continue;
        }
        displaced.extend(marks);
        kept.push(candidate);
    }

    Ok(kept
        .into_iter()
        .filter(|k| !displaced.contains(&k.edge.id))
        .map(|k| k.edge)
        .collect())
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Rank-greedy selection keeping only leaf-disjoint edges.
#[derive(Clone, Copy, Debug, Default)]
pub struct RankPriority;

impl NodeSelectionStrategy for RankPriority {
    fn name(&self) -> &str {
        "rank-priority"
    }

    fn description(&self) -> String {
        "Keeps incoming edges in rank order, skipping any edge whose descendant \
         leaves overlap an edge already kept."
            .to_string()
    }

    fn select(&self, input: &NodeInput<'_>) -> SelectResult<NodeSelection> {
        let kept = resolve_strict(input)?;
        input.complete_selection(&kept)
    }
}

/// Rank-greedy selection that lets more inclusive edges displace the edges
/// they contain.
#[derive(Clone, Copy, Debug, Default)]
pub struct RankPriorityInferredPath;

impl NodeSelectionStrategy for RankPriorityInferredPath {
    fn name(&self) -> &str {
        "rank-priority-inferred-path"
    }

    fn description(&self) -> String {
        "Keeps incoming edges in rank order; an edge strictly containing kept \
         edges replaces them, other overlaps are discarded."
            .to_string()
    }

    fn select(&self, input: &NodeInput<'_>) -> SelectResult<NodeSelection> {
        let kept = resolve_inferred_path(input)?;
        input.complete_selection(&kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::Fixture;
    use arbor_types::{NodeId, Rank, SourceEdgeId};

    fn n(id: u64) -> NodeId {
        NodeId(id)
    }

    fn ids(v: &[u64]) -> IdSet {
        v.iter().copied().collect()
    }

    /// Children of 20, each with the given leaves and edge rank.
    fn build_children(children: &[(u64, &[u64], Rank)]) -> Fixture {
        let mut nodes: Vec<u64> = vec![20];
        for (child, leaves, _) in children {
            nodes.push(*child);
            nodes.extend(leaves.iter().copied());
        }
        nodes.sort();
        nodes.dedup();
        let mut fx = Fixture::new(&nodes);
        for (i, (child, leaves, rank)) in children.iter().enumerate() {
            for leaf in *leaves {
                fx.stree(*leaf, *child, 1, 1000 + *leaf);
            }
            fx.stree(*child, 20, *rank, i as u64 + 1);
        }
        fx
    }

    fn picked(fx: &mut Fixture, strategy: &dyn NodeSelectionStrategy) -> Vec<u64> {
        let result = fx.run(20, strategy).unwrap();
        fx.children(&result[&n(20)])
    }

    // ----------------------------------------------------------
    // ConflictType
    // ----------------------------------------------------------

    #[test]
    fn conflict_types() {
        assert_eq!(ConflictType::between(&ids(&[1]), &ids(&[2])), ConflictType::NoConflict);
        assert_eq!(
            ConflictType::between(&ids(&[1]), &ids(&[1, 2])),
            ConflictType::CandidateSubsetOfKept
        );
        assert_eq!(
            ConflictType::between(&ids(&[1, 2]), &ids(&[1])),
            ConflictType::KeptSubsetOfCandidate
        );
        assert_eq!(
            ConflictType::between(&ids(&[1, 2]), &ids(&[2, 3])),
            ConflictType::Incompatible
        );
    }

    #[test]
    fn equal_leaf_sets_keep_the_earlier_edge() {
        assert_eq!(
            ConflictType::between(&ids(&[1, 2]), &ids(&[1, 2])),
            ConflictType::CandidateSubsetOfKept
        );
    }

    // ----------------------------------------------------------
    // Strict
    // ----------------------------------------------------------

    #[test]
    fn strict_keeps_rank_greedy_disjoint_edges() {
        let mut fx = build_children(&[(10, &[1, 2], 3), (11, &[2, 3], 2), (12, &[3, 4], 1)]);
        assert_eq!(picked(&mut fx, &RankPriority), vec![10, 12]);
    }

    #[test]
    fn strict_breaks_rank_ties_by_edge_id() {
        let mut fx = build_children(&[(10, &[1, 2], 1), (11, &[2, 3], 1)]);
        assert_eq!(picked(&mut fx, &RankPriority), vec![10]);
    }

    /// 10 = {1,2} on rank 2. Graph-wise 11 subtends {2,3}, but its own
    /// selection keeps only leaf 3 (12 = {2,3} loses to the rank-2 leaf),
    /// and its edge to 20 claims only leaf 3.
    fn build_narrowed() -> Fixture {
        let mut fx = Fixture::new(&[1, 2, 3, 10, 11, 12, 20]);
        fx.stree(1, 10, 1, 1);
        fx.stree(2, 10, 1, 2);
        fx.stree(2, 12, 1, 3);
        fx.stree(3, 12, 1, 4);
        fx.stree(3, 11, 2, 5);
        fx.stree(12, 11, 1, 6);
        fx.stree(10, 20, 2, 100);
        let narrowed = CandidateEdge::source_tree(EdgeId(50), n(11), n(20), 1, SourceEdgeId(101))
            .with_exclusive(ids(&[3]));
        fx.graph.add_edge(narrowed).unwrap();
        fx
    }

    #[test]
    fn exclusive_leaves_narrow_the_comparison() {
        let mut fx = build_narrowed();
        let result = fx.run(20, &RankPriority).unwrap();
        assert_eq!(fx.children(&result[&n(11)]), vec![3]);
        assert_eq!(fx.children(&result[&n(20)]), vec![10, 11]);
    }

    /// 10 = {1,2} and 11 = {2,3}; the edge from 11 claims only leaf 3, but
    /// node 2 sits in both synthesized subtrees.
    fn build_shared_node() -> Fixture {
        let mut fx = Fixture::new(&[1, 2, 3, 10, 11, 20]);
        fx.stree(1, 10, 1, 1);
        fx.stree(2, 10, 1, 2);
        fx.stree(2, 11, 1, 3);
        fx.stree(3, 11, 1, 4);
        fx.stree(10, 20, 2, 100);
        let narrowed = CandidateEdge::source_tree(EdgeId(50), n(11), n(20), 1, SourceEdgeId(101))
            .with_exclusive(ids(&[3]));
        fx.graph.add_edge(narrowed).unwrap();
        fx
    }

    #[test]
    fn narrowed_edges_still_need_disjoint_subtrees() {
        let mut fx = build_shared_node();
        assert_eq!(picked(&mut fx, &RankPriority), vec![10]);
        let mut fx = build_shared_node();
        assert_eq!(picked(&mut fx, &RankPriorityInferredPath), vec![10]);
    }

    #[test]
    fn missing_descendants_are_fatal() {
        let mut fx = Fixture::new(&[1, 2]);
        fx.stree(1, 2, 1, 1);
        let input = fx.input(n(2));
        let err = resolve_strict(&input).unwrap_err();
        assert!(matches!(err, SelectError::MissingDescendants(id) if id == n(1)));
    }

    // ----------------------------------------------------------
    // Inferred path
    // ----------------------------------------------------------

    #[test]
    fn inferred_path_prefers_containing_edge() {
        // 10 = {1,2} is contained by 11 = {1,2,3}; 12 = {3,4} is incompatible.
        let mut fx = build_children(&[(10, &[1, 2], 3), (11, &[1, 2, 3], 2), (12, &[3, 4], 1)]);
        assert_eq!(picked(&mut fx, &RankPriorityInferredPath), vec![11]);
    }

    #[test]
    fn inferred_path_drops_contained_candidates() {
        let mut fx = build_children(&[(10, &[1, 2], 2), (11, &[1], 1), (12, &[3], 1)]);
        assert_eq!(picked(&mut fx, &RankPriorityInferredPath), vec![10, 12]);
    }

    #[test]
    fn rejected_candidate_displaces_nothing() {
        // 12 = {1,2,3,5} contains 10 but clashes with 11 = {3,4}.
        let mut fx = build_children(&[(10, &[1, 2], 3), (11, &[3, 4], 3), (12, &[1, 2, 3, 5], 1)]);
        assert_eq!(picked(&mut fx, &RankPriorityInferredPath), vec![10, 11]);
    }
}
