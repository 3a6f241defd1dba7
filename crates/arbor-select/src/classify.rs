//! Grouping a node's incoming edges for selection.
//!
//! Incoming edges of a node fall into two pools:
//!
//! - **Edge sets**: every edge carrying the same `(rank, source_edge_id)`
//!   represents one branch of one source tree, so the edges of a set are
//!   substitutes for each other. Sets are grouped by rank.
//! - **Singletons**: taxonomy edges from graph leaves. They are held back and
//!   only attached at the end when nothing already selected covers them.
//!
//! [`CandidateRelSet`] is the working selection built from these pools.

use std::collections::{BTreeMap, BTreeSet};

use arbor_types::{CandidateEdge, EdgeId, NodeId, Rank, SourceEdgeId};

use crate::error::{SelectError, SelectResult};
use crate::provenance::SubtreeInfo;
use crate::strategy::{NodeInput, NodeSelection};

// ---------------------------------------------------------------------------
// EdgeSet
// ---------------------------------------------------------------------------

/// Candidate edges mapped to one source branch, all pointing at one parent.
#[derive(Clone, Debug)]
pub struct EdgeSet<'a> {
    pub parent: NodeId,
    pub rank: Rank,
    pub source_edge_id: SourceEdgeId,
    /// Members in ascending edge-id order.
    pub members: Vec<&'a CandidateEdge>,
    /// Combined provenance of every member's child.
    pub info: SubtreeInfo,
}

impl<'a> EdgeSet<'a> {
    fn new(parent: NodeId, rank: Rank, source_edge_id: SourceEdgeId) -> Self {
        Self {
            parent,
            rank,
            source_edge_id,
            members: Vec::new(),
            info: SubtreeInfo::new(parent),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// A node's incoming edges, sorted into edge sets and deferred singletons.
#[derive(Clone, Debug)]
pub struct Classification<'a> {
    pub node: NodeId,
    /// Edge sets by rank; within a rank, by source edge id.
    pub edge_sets: BTreeMap<Rank, Vec<EdgeSet<'a>>>,
    /// Taxonomy edges from graph leaves, by edge id.
    pub singletons: Vec<&'a CandidateEdge>,
    immediate: BTreeMap<NodeId, SubtreeInfo>,
}

impl<'a> Classification<'a> {
    /// Ranks that carry at least one edge set, highest first.
    pub fn ranks_descending(&self) -> Vec<Rank> {
        self.edge_sets.keys().rev().copied().collect()
    }

    /// Every distinct child of the node.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.immediate.keys().copied()
    }

    /// Provenance of `child` attached alone under the node.
    pub fn immediate(&self, child: NodeId) -> SelectResult<&SubtreeInfo> {
        self.immediate
            .get(&child)
            .ok_or(SelectError::MissingSubtree(child))
    }

    /// Remove and return the edge sets at `rank`.
    pub fn take_rank(&mut self, rank: Rank) -> Vec<EdgeSet<'a>> {
        self.edge_sets.remove(&rank).unwrap_or_default()
    }
}

/// Sort the incoming edges of `input.node`.
pub fn classify<'a>(input: &NodeInput<'a>) -> SelectResult<Classification<'a>> {
    let mut immediate = BTreeMap::new();
    let mut grouped: BTreeMap<(Rank, SourceEdgeId), EdgeSet<'a>> = BTreeMap::new();
    let mut singletons = Vec::new();

    for edge in &input.incoming {
        if !immediate.contains_key(&edge.child) {
            immediate.insert(edge.child, input.immediate_info(edge.child)?);
        }
        if edge.is_taxonomy() && input.is_leaf(edge.child) {
            singletons.push(*edge);
            continue;
        }
        grouped
            .entry((edge.rank, edge.source_edge_id))
            .or_insert_with(|| EdgeSet::new(input.node, edge.rank, edge.source_edge_id))
            .members
            .push(*edge);
    }

    let mut edge_sets: BTreeMap<Rank, Vec<EdgeSet<'a>>> = BTreeMap::new();
    for ((rank, _), mut set) in grouped {
        let mut seen = BTreeSet::new();
        for member in &set.members {
            if seen.insert(member.child) {
                if let Some(info) = immediate.get(&member.child) {
                    set.info.accumulate(info);
                }
            }
        }
        edge_sets.entry(rank).or_default().push(set);
    }

    Ok(Classification {
        node: input.node,
        edge_sets,
        singletons,
        immediate,
    })
}

// ---------------------------------------------------------------------------
// CandidateRelSet
// ---------------------------------------------------------------------------

/// A working selection of edges into one parent, with the combined
/// provenance of their children.
#[derive(Clone, Debug)]
pub struct CandidateRelSet<'a> {
    parent: NodeId,
    edges: Vec<&'a CandidateEdge>,
    info: SubtreeInfo,
    disjoint: bool,
}

impl<'a> CandidateRelSet<'a> {
    pub fn new(parent: NodeId) -> Self {
        Self {
            parent,
            edges: Vec::new(),
            info: SubtreeInfo::new(parent),
            disjoint: true,
        }
    }

    /// Add an edge together with the immediate provenance of its child.
    /// Returns `false` if the edge was already present.
    pub fn add(&mut self, edge: &'a CandidateEdge, immediate: &SubtreeInfo) -> SelectResult<bool> {
        if edge.parent != self.parent {
            return Err(SelectError::ForeignEdge {
                edge: edge.id,
                parent: self.parent,
            });
        }
        if self.edges.iter().any(|e| e.id == edge.id) {
            return Ok(false);
        }
        if self.info.included_ids().intersects(immediate.included_ids()) {
            self.disjoint = false;
        }
        self.info.accumulate(immediate);
        self.edges.push(edge);
        Ok(true)
    }

    pub fn parent(&self) -> NodeId {
        self.parent
    }

    pub fn edges(&self) -> &[&'a CandidateEdge] {
        &self.edges
    }

    pub fn info(&self) -> &SubtreeInfo {
        &self.info
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn contains(&self, id: EdgeId) -> bool {
        self.edges.iter().any(|e| e.id == id)
    }

    /// Whether no two member children share a graph node.
    pub fn is_internally_disjoint(&self) -> bool {
        self.disjoint
    }

    /// Member ids in ascending order.
    pub fn edge_ids(&self) -> Vec<EdgeId> {
        let mut ids: Vec<EdgeId> = self.edges.iter().map(|e| e.id).collect();
        ids.sort();
        ids
    }

    /// Complete the provenance record and hand back the decision.
    pub fn into_selection(self) -> NodeSelection {
        let edges = self.edge_ids();
        let mut info = self.info;
        info.complete();
        NodeSelection { edges, info }
    }
}
