//! The pluggable node-selection seam.
//!
//! The synthesis engine hands each visited node to a
//! [`NodeSelectionStrategy`] together with a [`NodeInput`] giving access to
//! the node's incoming candidate edges, the candidate graph, and the finished
//! subtrees of its children. The strategy answers with the edges to keep and
//! the completed provenance record of the node.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use arbor_graph::GraphView;
use arbor_mwis::MwisConfig;
use arbor_types::{CandidateEdge, EdgeId, EdgeKind, NodeId};

use crate::augment::RankedAugmentingSearch;
use crate::error::{SelectError, SelectResult};
use crate::mwis_only::MwisOnly;
use crate::provenance::{SubtreeInfo, SubtreeTable};
use crate::resolve::{RankPriority, RankPriorityInferredPath};

// ---------------------------------------------------------------------------
// NodeInput
// ---------------------------------------------------------------------------

/// Everything a strategy may read while deciding one node.
pub struct NodeInput<'a> {
    pub node: NodeId,
    /// Non-excluded incoming edges of the traversable kinds, by edge id.
    pub incoming: Vec<&'a CandidateEdge>,
    pub graph: &'a dyn GraphView,
    pub subtrees: &'a SubtreeTable,
    pub kinds: &'a [EdgeKind],
    /// Edges left out of the traversal.
    pub excluded: &'a BTreeSet<EdgeId>,
}

impl<'a> NodeInput<'a> {
    /// Gather the input for `node`, skipping `excluded` edges.
    pub fn new(
        node: NodeId,
        graph: &'a dyn GraphView,
        subtrees: &'a SubtreeTable,
        kinds: &'a [EdgeKind],
        excluded: &'a BTreeSet<EdgeId>,
    ) -> Self {
        let incoming = graph
            .children_of(node, kinds)
            .into_iter()
            .filter(|e| !excluded.contains(&e.id))
            .collect();
        Self {
            node,
            incoming,
            graph,
            subtrees,
            kinds,
            excluded,
        }
    }

    /// Whether `node` has no non-excluded incoming edges of the traversable
    /// kinds.
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.graph
            .children_of(node, self.kinds)
            .iter()
            .all(|e| self.excluded.contains(&e.id))
    }

    /// The finished subtree record of a child.
    pub fn child_subtree(&self, child: NodeId) -> SelectResult<&'a SubtreeInfo> {
        self.subtrees
            .get(child)
            .ok_or(SelectError::MissingSubtree(child))
    }

    /// Provenance of attaching `child` alone under this node, through every
    /// candidate edge between them.
    pub fn immediate_info(&self, child: NodeId) -> SelectResult<SubtreeInfo> {
        let parallel: Vec<&CandidateEdge> = self
            .graph
            .parents_of(child, self.kinds)
            .into_iter()
            .filter(|e| e.parent == self.node && !self.excluded.contains(&e.id))
            .collect();
        let mut info = SubtreeInfo::new(self.node);
        info.include(child, &parallel, self.child_subtree(child)?, self.graph)?;
        Ok(info)
    }

    /// Complete the node's record from a chosen edge list.
    pub fn complete_selection(&self, chosen: &[&CandidateEdge]) -> SelectResult<NodeSelection> {
        let mut info = SubtreeInfo::new(self.node);
        let mut seen = BTreeSet::new();
        for edge in chosen {
            if seen.insert(edge.child) {
                info.accumulate(&self.immediate_info(edge.child)?);
            }
        }
        info.complete();
        let mut edges: Vec<EdgeId> = chosen.iter().map(|e| e.id).collect();
        edges.sort();
        Ok(NodeSelection { edges, info })
    }
}

/// A strategy's decision for one node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeSelection {
    /// Chosen incoming edges in ascending id order.
    pub edges: Vec<EdgeId>,
    /// Completed provenance of the node's synthesized subtree.
    pub info: SubtreeInfo,
}

// ---------------------------------------------------------------------------
// NodeSelectionStrategy
// ---------------------------------------------------------------------------

/// Decides which incoming edges of a node are kept.
///
/// Implementations must keep the chosen edges' child subtrees pairwise
/// disjoint.
pub trait NodeSelectionStrategy: Send + Sync {
    /// Short identifier used in reports and configuration.
    fn name(&self) -> &str;

    /// Human-readable explanation of how the strategy decides.
    fn description(&self) -> String;

    /// Decide one node.
    fn select(&self, input: &NodeInput<'_>) -> SelectResult<NodeSelection>;
}

/// The built-in strategies, as named in configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    #[default]
    RankedAugmentingSearch,
    RankPriority,
    RankPriorityInferredPath,
    MwisOnly,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        Self::RankedAugmentingSearch,
        Self::RankPriority,
        Self::RankPriorityInferredPath,
        Self::MwisOnly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RankedAugmentingSearch => "ranked-augmenting-search",
            Self::RankPriority => "rank-priority",
            Self::RankPriorityInferredPath => "rank-priority-inferred-path",
            Self::MwisOnly => "mwis-only",
        }
    }

    /// Instantiate the strategy.
    pub fn build(self, mwis: &MwisConfig, max_product_size: u64) -> Box<dyn NodeSelectionStrategy> {
        match self {
            Self::RankedAugmentingSearch => Box::new(RankedAugmentingSearch::new(
                max_product_size,
                mwis.clone(),
            )),
            Self::RankPriority => Box::new(RankPriority),
            Self::RankPriorityInferredPath => Box::new(RankPriorityInferredPath),
            Self::MwisOnly => Box::new(MwisOnly::new(mwis.clone())),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ranked-augmenting-search" | "ranked" => Ok(Self::RankedAugmentingSearch),
            "rank-priority" | "strict" => Ok(Self::RankPriority),
            "rank-priority-inferred-path" | "inferred-path" => Ok(Self::RankPriorityInferredPath),
            "mwis-only" | "mwis" => Ok(Self::MwisOnly),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}
