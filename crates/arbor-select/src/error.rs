//! Error types for node selection.

use arbor_mwis::MwisError;
use arbor_types::{EdgeId, NodeId};

/// Errors that can occur while selecting edges for a node.
///
/// Every variant signals malformed input or a broken traversal order; none
/// is expected during a well-formed run.
#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    /// A child was visited before its subtree was finished or after it was
    /// evicted.
    #[error("no finished subtree for node {0:?}")]
    MissingSubtree(NodeId),

    /// A node carries no descendant-leaf data.
    #[error("missing descendant ids for node {0:?}")]
    MissingDescendants(NodeId),

    /// A finished subtree record was modified.
    #[error("subtree rooted at {0:?} is already complete")]
    FrozenSubtree(NodeId),

    /// A child record was folded in before it was completed.
    #[error("subtree rooted at {0:?} is not complete")]
    IncompleteSubtree(NodeId),

    /// No candidate edge connects the child to the subtree root.
    #[error("no edge connects child {child:?} to {parent:?}")]
    NoConnectingEdge { child: NodeId, parent: NodeId },

    /// An edge does not point at the node being decided.
    #[error("edge {edge:?} does not point at {parent:?}")]
    ForeignEdge { edge: EdgeId, parent: NodeId },

    /// The independent-set solver rejected its input.
    #[error(transparent)]
    Mwis(#[from] MwisError),
}

/// Convenience alias for selection results.
pub type SelectResult<T> = Result<T, SelectError>;
