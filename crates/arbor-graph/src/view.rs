//! The read interface synthesis consumes.

use arbor_types::{CandidateEdge, EdgeId, EdgeKind, IdSet, NodeId};

/// Read access to a candidate graph.
///
/// Index construction and persistent storage live behind this trait; the
/// synthesis engine never mutates the graph. Edge lists are returned in
/// ascending edge-id order so every traversal is deterministic.
pub trait GraphView {
    /// Returns `true` if the node exists.
    fn contains_node(&self, node: NodeId) -> bool;

    /// All node ids in ascending order.
    fn node_ids(&self) -> Vec<NodeId>;

    /// Look up an edge by id.
    fn edge(&self, id: EdgeId) -> Option<&CandidateEdge>;

    /// Edges of the given kinds whose parent is `node` (edges from its
    /// children).
    fn children_of(&self, node: NodeId, kinds: &[EdgeKind]) -> Vec<&CandidateEdge>;

    /// Edges of the given kinds whose child is `node` (edges to its
    /// possible parents).
    fn parents_of(&self, node: NodeId, kinds: &[EdgeKind]) -> Vec<&CandidateEdge>;

    /// The persisted descendant-leaf set of a node.
    fn descendant_ids(&self, node: NodeId) -> Option<&IdSet>;

    /// The leaf set attributable to an edge: its exclusive set when it
    /// carries one, otherwise the child's full descendant set.
    fn exclusive_descendant_ids<'a>(&'a self, edge: &'a CandidateEdge) -> Option<&'a IdSet> {
        if edge.exclusive_descendant_ids.is_empty() {
            self.descendant_ids(edge.child)
        } else {
            Some(&edge.exclusive_descendant_ids)
        }
    }
}
