//! Candidate edges proposed by source hierarchies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::{EdgeId, NodeId, Rank, SourceEdgeId, TAXONOMY_RANK};
use crate::idset::IdSet;

/// The source family an edge comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// An edge mapped from a ranked source tree.
    SourceTree,
    /// An edge of the backbone taxonomy.
    Taxonomy,
}

impl EdgeKind {
    /// Both kinds, in the order synthesis traverses them by default.
    pub const ALL: [EdgeKind; 2] = [EdgeKind::SourceTree, EdgeKind::Taxonomy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SourceTree => "source_tree",
            Self::Taxonomy => "taxonomy",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "source_tree" | "source-tree" | "stree" => Ok(Self::SourceTree),
            "taxonomy" | "tax" => Ok(Self::Taxonomy),
            other => Err(TypeError::UnknownEdgeKind(other.to_string())),
        }
    }
}

/// A directed child→parent relation proposed by one source hierarchy.
///
/// Candidate edges are read-only inputs to synthesis. Many edges may run in
/// parallel between the same pair of nodes, one per source that proposes the
/// relation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEdge {
    pub id: EdgeId,
    pub child: NodeId,
    pub parent: NodeId,
    pub kind: EdgeKind,
    /// Priority of the proposing source. Taxonomy edges carry rank 0.
    #[serde(default)]
    pub rank: Rank,
    /// Identity of the original branch. Taxonomy edges use their own id.
    pub source_edge_id: SourceEdgeId,
    /// Whether the child is a leaf of the proposing source.
    #[serde(default)]
    pub is_tip: bool,
    /// Leaf ids attributable to the mapped branch. Empty means the child's
    /// full descendant set applies.
    #[serde(default)]
    pub exclusive_descendant_ids: IdSet,
    /// Name of the proposing source, used when ranks are assigned from
    /// source metadata.
    #[serde(default)]
    pub source: Option<String>,
}

impl CandidateEdge {
    /// A source-tree edge with the given rank and source branch.
    pub fn source_tree(
        id: EdgeId,
        child: NodeId,
        parent: NodeId,
        rank: Rank,
        source_edge_id: SourceEdgeId,
    ) -> Self {
        Self {
            id,
            child,
            parent,
            kind: EdgeKind::SourceTree,
            rank,
            source_edge_id,
            is_tip: false,
            exclusive_descendant_ids: IdSet::new(),
            source: None,
        }
    }

    /// A taxonomy edge. Its source branch id is its own edge id.
    pub fn taxonomy(id: EdgeId, child: NodeId, parent: NodeId) -> Self {
        Self {
            id,
            child,
            parent,
            kind: EdgeKind::Taxonomy,
            rank: TAXONOMY_RANK,
            source_edge_id: SourceEdgeId(id.get()),
            is_tip: false,
            exclusive_descendant_ids: IdSet::new(),
            source: None,
        }
    }

    /// Mark the edge as ending in a leaf of its source.
    pub fn tip(mut self) -> Self {
        self.is_tip = true;
        self
    }

    /// Attach the exclusive leaf set of the mapped branch.
    pub fn with_exclusive(mut self, ids: IdSet) -> Self {
        self.exclusive_descendant_ids = ids;
        self
    }

    /// Attach the proposing source's name.
    pub fn with_source(mut self, name: impl Into<String>) -> Self {
        self.source = Some(name.into());
        self
    }

    pub fn is_taxonomy(&self) -> bool {
        self.kind == EdgeKind::Taxonomy
    }
}
