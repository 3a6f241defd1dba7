//! Destinations for per-node decisions, and the in-memory synthesized tree.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use arbor_graph::GraphView;
use arbor_types::{CandidateEdge, EdgeId, IdSet, NodeId, Rank};

use crate::error::{SynthError, SynthResult};

/// Receives the edges kept for each node as synthesis decides it.
///
/// Nodes arrive leaves first. A node decided again (by a later run over the
/// same graph) replaces its earlier record.
pub trait SelectionSink {
    fn record_selected_edges(&mut self, node: NodeId, edges: &[&CandidateEdge]) -> SynthResult<()>;
}

// ---------------------------------------------------------------------------
// SynthesizedTree
// ---------------------------------------------------------------------------

/// One kept edge, seen from its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeLink {
    pub edge: EdgeId,
    pub child: NodeId,
    pub rank: Rank,
}

/// The synthesized hierarchy: for every node with kept edges, the links to
/// its children in ascending edge-id order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedTree {
    links: BTreeMap<NodeId, Vec<TreeLink>>,
}

impl SynthesizedTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Links recorded under `node`.
    pub fn links(&self, node: NodeId) -> &[TreeLink] {
        self.links.get(&node).map(Vec::as_slice).unwrap_or_default()
    }

    /// Children of `node` in ascending edge-id order.
    pub fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.links(node).iter().map(|l| l.child).collect()
    }

    /// Nodes that have at least one kept edge.
    pub fn parents(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.links.keys().copied()
    }

    pub fn edge_count(&self) -> usize {
        self.links.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn to_json(&self) -> SynthResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SynthError::Serialization(e.to_string()))
    }

    pub fn from_json(text: &str) -> SynthResult<Self> {
        serde_json::from_str(text).map_err(|e| SynthError::Serialization(e.to_string()))
    }

    /// Check that the part of the tree hanging below `root` is a single
    /// hierarchy over edges of `graph`.
    ///
    /// Returns every defect found; an empty list means the tree is sound.
    pub fn verify(&self, graph: &dyn GraphView, root: NodeId) -> Vec<TreeDefect> {
        let mut defects = Vec::new();
        let mut visited = BTreeSet::from([root]);
        let mut preorder = Vec::new();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            preorder.push(node);
            for link in self.links(node) {
                match graph.edge(link.edge) {
                    None => defects.push(TreeDefect::UnknownEdge {
                        parent: node,
                        edge: link.edge,
                    }),
                    Some(e) if e.parent != node || e.child != link.child => {
                        defects.push(TreeDefect::MismatchedEdge {
                            parent: node,
                            edge: link.edge,
                        })
                    }
                    Some(_) => {}
                }
                if visited.insert(link.child) {
                    stack.push(link.child);
                } else {
                    defects.push(TreeDefect::ReachedTwice(link.child));
                }
            }
        }

        // Synthesized leaves below each node, children before parents.
        let mut tips: BTreeMap<NodeId, IdSet> = BTreeMap::new();
        for node in preorder.iter().rev() {
            let children = self.links(*node);
            let set = if children.is_empty() {
                IdSet::singleton(node.get())
            } else {
                let mut union = IdSet::new();
                for link in children {
                    if let Some(child_tips) = tips.get(&link.child) {
                        union.union_with(child_tips);
                    }
                }
                union
            };
            tips.insert(*node, set);
        }

        for node in &preorder {
            let children = self.links(*node);
            for (i, left) in children.iter().enumerate() {
                for right in &children[i + 1..] {
                    if left.child == right.child {
                        continue;
                    }
                    let overlap = match (tips.get(&left.child), tips.get(&right.child)) {
                        (Some(a), Some(b)) => a.intersects(b),
                        _ => false,
                    };
                    if overlap {
                        defects.push(TreeDefect::OverlappingSiblings {
                            parent: *node,
                            left: left.child,
                            right: right.child,
                        });
                    }
                }
            }
        }
        defects
    }
}

impl SelectionSink for SynthesizedTree {
    fn record_selected_edges(&mut self, node: NodeId, edges: &[&CandidateEdge]) -> SynthResult<()> {
        let mut links: Vec<TreeLink> = edges
            .iter()
            .map(|e| TreeLink {
                edge: e.id,
                child: e.child,
                rank: e.rank,
            })
            .collect();
        links.sort_by_key(|l| l.edge);
        if links.is_empty() {
            self.links.remove(&node);
        } else {
            self.links.insert(node, links);
        }
        Ok(())
    }
}

/// A structural problem found by [`SynthesizedTree::verify`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeDefect {
    /// A link names an edge the graph does not have.
    UnknownEdge { parent: NodeId, edge: EdgeId },
    /// A link's edge does not run from its child to its parent.
    MismatchedEdge { parent: NodeId, edge: EdgeId },
    /// A node hangs below more than one parent, or below itself.
    ReachedTwice(NodeId),
    /// Two children of one node share synthesized leaves.
    OverlappingSiblings {
        parent: NodeId,
        left: NodeId,
        right: NodeId,
    },
}

impl fmt::Display for TreeDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownEdge { parent, edge } => {
                write!(f, "{parent}: edge {edge} is not in the graph")
            }
            Self::MismatchedEdge { parent, edge } => {
                write!(f, "{parent}: edge {edge} does not connect the recorded child")
            }
            Self::ReachedTwice(node) => write!(f, "{node} is reached more than once"),
            Self::OverlappingSiblings {
                parent,
                left,
                right,
            } => write!(f, "{parent}: children {left} and {right} share leaves"),
        }
    }
}
