//! Subtree provenance records.
//!
//! A [`SubtreeInfo`] describes one synthesized subtree: which graph nodes it
//! contains and which source-tree elements (branches by source edge id, tips
//! by exclusive leaf set) it represents, grouped by source rank. Selection
//! compares records to decide whether candidate subtrees can coexist under a
//! parent and which of two alternatives is preferable.
//!
//! # Invariants
//!
//! - A record is mutable until [`SubtreeInfo::complete`] and frozen after.
//! - A completed record's included ids contain its root exactly once.
//! - Records of sibling edges selected together have pairwise disjoint
//!   included ids.
//!
//! [`SubtreeTable`] holds completed records while some parent of their root
//! may still need them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::trace;

use arbor_graph::GraphView;
use arbor_types::{CandidateEdge, EdgeKind, IdSet, NodeId, Rank, SourceEdgeId};

use crate::error::{SelectError, SelectResult};

/// Provenance of one synthesized subtree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtreeInfo {
    root: NodeId,
    included_ids: IdSet,
    edge_ids_by_rank: BTreeMap<Rank, BTreeSet<SourceEdgeId>>,
    tip_sets_by_rank: BTreeMap<Rank, Vec<IdSet>>,
    tip_ids: IdSet,
    completed: bool,
}

impl SubtreeInfo {
    /// An empty, open record rooted at `root`.
    pub fn new(root: NodeId) -> Self {
        Self {
            root,
            included_ids: IdSet::new(),
            edge_ids_by_rank: BTreeMap::new(),
            tip_sets_by_rank: BTreeMap::new(),
            tip_ids: IdSet::new(),
            completed: false,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Graph node ids in the subtree.
    pub fn included_ids(&self) -> &IdSet {
        &self.included_ids
    }

    /// Synthesized leaf ids below the root.
    pub fn tip_ids(&self) -> &IdSet {
        &self.tip_ids
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Source edge ids represented at `rank`.
    pub fn edge_ids_at(&self, rank: Rank) -> Option<&BTreeSet<SourceEdgeId>> {
        self.edge_ids_by_rank.get(&rank)
    }

    /// Exclusive tip sets represented at `rank`.
    pub fn tip_sets_at(&self, rank: Rank) -> &[IdSet] {
        self.tip_sets_by_rank
            .get(&rank)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn edge_count_at(&self, rank: Rank) -> usize {
        self.edge_ids_by_rank.get(&rank).map_or(0, BTreeSet::len)
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Fold a finished child subtree into this record.
    ///
    /// `edges` must be every candidate edge from `child` to this record's
    /// root; each contributes its provenance (tip edges their exclusive leaf
    /// set, other edges their source edge id) at its rank.
    pub fn include<G: GraphView + ?Sized>(
        &mut self,
        child: NodeId,
        edges: &[&CandidateEdge],
        child_info: &SubtreeInfo,
        graph: &G,
    ) -> SelectResult<()> {
        if self.completed {
            return Err(SelectError::FrozenSubtree(self.root));
        }
        if edges.is_empty() {
            return Err(SelectError::NoConnectingEdge {
                child,
                parent: self.root,
            });
        }
        if !child_info.completed {
            return Err(SelectError::IncompleteSubtree(child));
        }

        for edge in edges {
            if edge.parent != self.root || edge.child != child {
                return Err(SelectError::ForeignEdge {
                    edge: edge.id,
                    parent: self.root,
                });
            }
            if edge.is_tip {
                let tips = graph
                    .exclusive_descendant_ids(edge)
                    .ok_or(SelectError::MissingDescendants(child))?;
                push_unique(self.tip_sets_by_rank.entry(edge.rank).or_default(), tips);
            } else {
                self.edge_ids_by_rank
                    .entry(edge.rank)
                    .or_default()
                    .insert(edge.source_edge_id);
            }
        }
        self.accumulate(child_info);
        Ok(())
    }

    /// Union every set and map of `other` into this record.
    pub fn accumulate(&mut self, other: &SubtreeInfo) {
        self.included_ids.union_with(&other.included_ids);
        self.tip_ids.union_with(&other.tip_ids);
        for (rank, ids) in &other.edge_ids_by_rank {
            self.edge_ids_by_rank
                .entry(*rank)
                .or_default()
                .extend(ids.iter().copied());
        }
        for (rank, sets) in &other.tip_sets_by_rank {
            let mine = self.tip_sets_by_rank.entry(*rank).or_default();
            for set in sets {
                push_unique(mine, set);
            }
        }
    }

    /// Freeze the record and add the root to its included ids. A root with
    /// no tips below it is itself a tip.
    pub fn complete(&mut self) {
        self.completed = true;
        self.included_ids.insert(self.root.get());
        if self.tip_ids.is_empty() {
            self.tip_ids.insert(self.root.get());
        }
        trace!(
            root = %self.root,
            nodes = self.included_ids.len(),
            tips = self.tip_ids.len(),
            "completed subtree"
        );
    }

    // ---------------------------------------------------------------
    // Comparison
    // ---------------------------------------------------------------

    /// Whether the two subtrees cannot both be children of one parent: they
    /// share a graph node, or represent a common source element at a rank of
    /// at least `working_rank`.
    pub fn overlaps_with(&self, that: &SubtreeInfo, working_rank: Rank) -> bool {
        self.included_ids.intersects(&that.included_ids)
            || self.contains_any_stree_elements_of(that, working_rank)
    }

    /// Whether this subtree represents any source branch or source tip of
    /// `that` at a rank of at least `working_rank`.
    pub fn contains_any_stree_elements_of(&self, that: &SubtreeInfo, working_rank: Rank) -> bool {
        let shared_edge = self
            .edge_ids_by_rank
            .range(working_rank..)
            .any(|(rank, mine)| {
                that.edge_ids_by_rank
                    .get(rank)
                    .is_some_and(|theirs| !mine.is_disjoint(theirs))
            });
        if shared_edge {
            return true;
        }
        self.tip_sets_by_rank
            .range(working_rank..)
            .any(|(rank, mine)| {
                that.tip_sets_by_rank.get(rank).is_some_and(|theirs| {
                    theirs
                        .iter()
                        .any(|t| mine.iter().any(|m| m.intersects(t)))
                })
            })
    }

    /// Whether this subtree represents every source branch of `that` at
    /// ranks of at least `working_rank`, and touches every one of its tip
    /// sets at those ranks.
    pub fn contains_all_stree_elements_of(&self, that: &SubtreeInfo, working_rank: Rank) -> bool {
        let all_edges = that
            .edge_ids_by_rank
            .range(working_rank..)
            .all(|(rank, theirs)| {
                self.edge_ids_by_rank
                    .get(rank)
                    .is_some_and(|mine| theirs.is_subset(mine))
            });
        all_edges
            && that
                .tip_sets_by_rank
                .range(working_rank..)
                .all(|(_, sets)| sets.iter().all(|t| self.included_ids.intersects(t)))
    }

    /// Whether this subtree is preferable to `that` when deciding at
    /// `test_rank`.
    ///
    /// Compares the number of represented source branches rank by rank from
    /// `test_rank` down to 1, then the number of included nodes. Taxonomy
    /// (rank 0) does not take part. A complete tie keeps `that`.
    pub fn improves_upon(&self, that: &SubtreeInfo, test_rank: Rank) -> bool {
        for rank in (1..=test_rank).rev() {
            let mine = self.edge_count_at(rank);
            let theirs = that.edge_count_at(rank);
            if mine != theirs {
                return mine > theirs;
            }
        }
        self.included_ids.len() > that.included_ids.len()
    }
}

fn push_unique(sets: &mut Vec<IdSet>, set: &IdSet) {
    if !sets.contains(set) {
        sets.push(set.clone());
    }
}

// ---------------------------------------------------------------------------
// SubtreeTable
// ---------------------------------------------------------------------------

/// Completed subtree records available to parents still being decided.
///
/// A record is evicted once every possible parent of its root has been
/// finished, so the table only holds the frontier of the traversal.
#[derive(Clone, Debug, Default)]
pub struct SubtreeTable {
    available: BTreeMap<NodeId, SubtreeInfo>,
    finished: BTreeSet<NodeId>,
    peak: usize,
    evicted: usize,
}

impl SubtreeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: NodeId) -> Option<&SubtreeInfo> {
        self.available.get(&node)
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.available.len()
    }

    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }

    pub fn is_finished(&self, node: NodeId) -> bool {
        self.finished.contains(&node)
    }

    /// Largest number of records held at once.
    pub fn peak_len(&self) -> usize {
        self.peak
    }

    /// Number of records evicted so far.
    pub fn evicted(&self) -> usize {
        self.evicted
    }

    /// Seed a completed record produced by an earlier run.
    pub fn preserve(&mut self, info: SubtreeInfo) -> SelectResult<()> {
        if !info.is_complete() {
            return Err(SelectError::IncompleteSubtree(info.root()));
        }
        self.finished.insert(info.root());
        self.available.insert(info.root(), info);
        self.peak = self.peak.max(self.available.len());
        Ok(())
    }

    /// Store the completed record of a just-decided node and evict every
    /// child whose parents are now all finished. Returns the evicted ids.
    pub fn finish<G: GraphView + ?Sized>(
        &mut self,
        info: SubtreeInfo,
        graph: &G,
        kinds: &[EdgeKind],
    ) -> SelectResult<Vec<NodeId>> {
        let node = info.root();
        self.preserve(info)?;

        let mut evicted = Vec::new();
        for edge in graph.children_of(node, kinds) {
            let child = edge.child;
            if !self.available.contains_key(&child) {
                continue;
            }
            let all_parents_finished = graph
                .parents_of(child, kinds)
                .iter()
                .all(|e| self.finished.contains(&e.parent));
            if all_parents_finished {
                self.available.remove(&child);
                evicted.push(child);
            }
        }
        self.evicted += evicted.len();
        if !evicted.is_empty() {
            trace!(node = %node, evicted = evicted.len(), "evicted finished subtrees");
        }
        Ok(evicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_graph::{MemoryGraph, NodeRecord};
    use arbor_types::EdgeId;
    use proptest::prelude::*;

    fn n(id: u64) -> NodeId {
        NodeId(id)
    }

    fn leaf(id: u64) -> SubtreeInfo {
        let mut info = SubtreeInfo::new(n(id));
        info.complete();
        info
    }

    fn ids(v: &[u64]) -> IdSet {
        v.iter().copied().collect()
    }

    /// Build a record directly, bypassing the graph.
    fn record(root: u64, nodes: &[u64], edges: &[(Rank, u64)], tips: &[(Rank, &[u64])]) -> SubtreeInfo {
        let mut info = SubtreeInfo::new(n(root));
        info.included_ids = ids(nodes);
        for (rank, e) in edges {
            info.edge_ids_by_rank
                .entry(*rank)
                .or_default()
                .insert(SourceEdgeId(*e));
        }
        for (rank, t) in tips {
            info.tip_sets_by_rank.entry(*rank).or_default().push(ids(t));
        }
        info
    }

    fn graph_for_include() -> MemoryGraph {
        let mut g = MemoryGraph::new();
        for id in [1, 2, 10] {
            g.add_node(NodeRecord::new(n(id))).unwrap();
        }
        g.add_edge(
            CandidateEdge::source_tree(EdgeId(1), n(1), n(10), 2, SourceEdgeId(100)).tip(),
        )
        .unwrap();
        g.add_edge(CandidateEdge::source_tree(EdgeId(2), n(1), n(10), 1, SourceEdgeId(200)))
            .unwrap();
        g.add_edge(CandidateEdge::taxonomy(EdgeId(3), n(2), n(10))).unwrap();
        g.fill_descendant_ids(&EdgeKind::ALL).unwrap();
        g
    }

    // ----------------------------------------------------------
    // include / complete
    // ----------------------------------------------------------

    #[test]
    fn include_records_every_parallel_edge() {
        let g = graph_for_include();
        let edges = g.parents_of(n(1), &EdgeKind::ALL);
        let mut info = SubtreeInfo::new(n(10));
        info.include(n(1), &edges, &leaf(1), &g).unwrap();

        assert_eq!(info.tip_sets_at(2), &[ids(&[1])]);
        assert!(info.edge_ids_at(1).unwrap().contains(&SourceEdgeId(200)));
        assert_eq!(info.included_ids().to_vec(), vec![1]);
        assert_eq!(info.tip_ids().to_vec(), vec![1]);
    }

    #[test]
    fn include_rejects_missing_edges_and_frozen_records() {
        let g = graph_for_include();
        let mut info = SubtreeInfo::new(n(10));
        assert!(matches!(
            info.include(n(1), &[], &leaf(1), &g),
            Err(SelectError::NoConnectingEdge { .. })
        ));

        info.complete();
        let edges = g.parents_of(n(1), &EdgeKind::ALL);
        assert!(matches!(
            info.include(n(1), &edges, &leaf(1), &g),
            Err(SelectError::FrozenSubtree(_))
        ));
    }

    #[test]
    fn include_rejects_open_child_record() {
        let g = graph_for_include();
        let edges = g.parents_of(n(1), &EdgeKind::ALL);
        let mut info = SubtreeInfo::new(n(10));
        let open = SubtreeInfo::new(n(1));
        assert!(matches!(
            info.include(n(1), &edges, &open, &g),
            Err(SelectError::IncompleteSubtree(_))
        ));
    }

    #[test]
    fn include_rejects_edges_to_other_parents() {
        let g = graph_for_include();
        let edges = g.parents_of(n(2), &EdgeKind::ALL);
        let mut info = SubtreeInfo::new(n(1));
        assert!(matches!(
            info.include(n(2), &edges, &leaf(2), &g),
            Err(SelectError::ForeignEdge { .. })
        ));
    }

    #[test]
    fn complete_adds_root_once() {
        let mut info = record(10, &[1, 2], &[], &[]);
        info.tip_ids = ids(&[1, 2]);
        info.complete();
        assert_eq!(info.included_ids().to_vec(), vec![1, 2, 10]);
        assert_eq!(info.tip_ids().to_vec(), vec![1, 2]);
        assert!(info.is_complete());
    }

    #[test]
    fn leaf_is_its_own_tip() {
        let info = leaf(7);
        assert_eq!(info.tip_ids().to_vec(), vec![7]);
        assert_eq!(info.included_ids().to_vec(), vec![7]);
    }

    // ----------------------------------------------------------
    // overlap / containment
    // ----------------------------------------------------------

    #[test]
    fn shared_node_overlaps_at_any_rank() {
        let a = record(10, &[1, 2], &[], &[]);
        let b = record(10, &[2, 3], &[], &[]);
        assert!(a.overlaps_with(&b, 5));
    }

    #[test]
    fn shared_branch_counts_only_at_or_above_working_rank() {
        let a = record(10, &[1], &[(2, 100)], &[]);
        let b = record(10, &[3], &[(2, 100)], &[]);
        assert!(a.overlaps_with(&b, 2));
        assert!(a.overlaps_with(&b, 1));
        assert!(!a.overlaps_with(&b, 3));
    }

    #[test]
    fn shared_tip_sets_overlap() {
        let a = record(10, &[1], &[], &[(2, &[5, 6])]);
        let b = record(10, &[3], &[], &[(2, &[6])]);
        let c = record(10, &[4], &[], &[(1, &[6])]);
        assert!(a.contains_any_stree_elements_of(&b, 2));
        // Same leaves at different ranks are not a shared element.
        assert!(!a.contains_any_stree_elements_of(&c, 1));
    }

    #[test]
    fn contains_all_needs_every_branch_and_touches_every_tip_set() {
        let big = record(10, &[1, 2, 3, 4], &[(2, 100), (2, 101)], &[]);
        let small = record(10, &[1, 2], &[(2, 100)], &[(2, &[2, 9])]);
        assert!(big.contains_all_stree_elements_of(&small, 2));

        let missing_tip = record(10, &[1, 2], &[(2, 100)], &[(2, &[9])]);
        assert!(!big.contains_all_stree_elements_of(&missing_tip, 2));

        let missing_branch = record(10, &[1], &[(2, 102)], &[]);
        assert!(!big.contains_all_stree_elements_of(&missing_branch, 2));
        // Below the working rank nothing is required.
        assert!(big.contains_all_stree_elements_of(&missing_branch, 3));
    }

    // ----------------------------------------------------------
    // improves_upon
    // ----------------------------------------------------------

    #[test]
    fn higher_rank_dominates_lower_rank_counts() {
        let x = record(10, &[1], &[(3, 1), (1, 10), (1, 11), (1, 12)], &[]);
        let y = record(10, &[1], &[(3, 1), (3, 2)], &[]);
        assert!(y.improves_upon(&x, 3));
        assert!(!x.improves_upon(&y, 3));
    }

    #[test]
    fn test_rank_bounds_the_comparison() {
        let x = record(10, &[1], &[(3, 1), (3, 2), (1, 10)], &[]);
        let y = record(10, &[1], &[(1, 10), (1, 11)], &[]);
        // Deciding at rank 1, the rank-3 edges are not compared.
        assert!(y.improves_upon(&x, 1));
    }

    #[test]
    fn node_count_breaks_rank_ties() {
        let x = record(10, &[1, 2, 3], &[(2, 1)], &[]);
        let y = record(10, &[1, 2], &[(2, 1)], &[]);
        assert!(x.improves_upon(&y, 2));
        assert!(!y.improves_upon(&x, 2));
    }

    #[test]
    fn full_tie_keeps_incumbent() {
        let x = record(10, &[1, 2], &[(2, 1)], &[]);
        let y = record(10, &[3, 4], &[(2, 7)], &[]);
        assert!(!x.improves_upon(&y, 2));
        assert!(!y.improves_upon(&x, 2));
    }

    #[test]
    fn taxonomy_rank_is_not_compared() {
        let x = record(10, &[1], &[(0, 1), (0, 2)], &[]);
        let y = record(10, &[1], &[], &[]);
        assert!(!x.improves_upon(&y, 0));
    }

    // ----------------------------------------------------------
    // SubtreeTable
    // ----------------------------------------------------------

    #[test]
    fn table_evicts_children_once_all_parents_finish() {
        // 1 has parents 10 and 20.
        let mut g = MemoryGraph::new();
        for id in [1, 10, 20] {
            g.add_node(NodeRecord::new(n(id))).unwrap();
        }
        g.add_edge(CandidateEdge::source_tree(EdgeId(1), n(1), n(10), 1, SourceEdgeId(1)))
            .unwrap();
        g.add_edge(CandidateEdge::source_tree(EdgeId(2), n(1), n(20), 1, SourceEdgeId(2)))
            .unwrap();

        let mut table = SubtreeTable::new();
        table.finish(leaf(1), &g, &EdgeKind::ALL).unwrap();
        assert!(table.finish(leaf(10), &g, &EdgeKind::ALL).unwrap().is_empty());
        assert!(table.get(n(1)).is_some());

        let evicted = table.finish(leaf(20), &g, &EdgeKind::ALL).unwrap();
        assert_eq!(evicted, vec![n(1)]);
        assert!(table.get(n(1)).is_none());
        assert!(table.is_finished(n(1)));
        assert_eq!(table.peak_len(), 3);
        assert_eq!(table.evicted(), 1);
    }

    #[test]
    fn table_refuses_open_records() {
        let mut table = SubtreeTable::new();
        let err = table.preserve(SubtreeInfo::new(n(1))).unwrap_err();
        assert!(matches!(err, SelectError::IncompleteSubtree(_)));
    }

    // ----------------------------------------------------------
    // Properties
    // ----------------------------------------------------------

    fn arb_record() -> impl Strategy<Value = SubtreeInfo> {
        (
            prop::collection::vec(1u64..20, 0..6),
            prop::collection::vec((1u32..=3, 1u64..10), 0..8),
        )
            .prop_map(|(nodes, edges)| record(100, &nodes, &edges, &[]))
    }

    proptest! {
        #[test]
        fn improvement_is_asymmetric(x in arb_record(), y in arb_record(), rank in 0u32..=3) {
            prop_assert!(!(x.improves_upon(&y, rank) && y.improves_upon(&x, rank)));
        }

        #[test]
        fn more_branches_at_the_test_rank_always_win(x in arb_record(), y in arb_record()) {
            let mine = x.edge_ids_at(3).map_or(0, |s| s.len());
            let theirs = y.edge_ids_at(3).map_or(0, |s| s.len());
            prop_assume!(mine > theirs);
            prop_assert!(x.improves_upon(&y, 3));
        }
    }
}
