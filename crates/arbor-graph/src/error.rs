//! Error types for candidate graph operations.

use arbor_types::{EdgeId, NodeId};

/// Errors that can occur while building or traversing the candidate graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A referenced node was not found in the graph.
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// A referenced edge was not found in the graph.
    #[error("edge not found: {0:?}")]
    EdgeNotFound(EdgeId),

    /// Attempted to add a node with an id that already exists.
    #[error("duplicate node: {0:?}")]
    DuplicateNode(NodeId),

    /// Attempted to add an edge with an id that already exists.
    #[error("duplicate edge: {0:?}")]
    DuplicateEdge(EdgeId),

    /// An edge endpoint refers to a node that does not exist.
    #[error("dangling edge: {edge:?} references missing node {node:?}")]
    DanglingEdge {
        /// The edge containing the bad reference.
        edge: EdgeId,
        /// The missing endpoint.
        node: NodeId,
    },

    /// A cycle was found while ordering nodes.
    #[error("cycle detected involving node {0:?}")]
    CycleDetected(NodeId),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for graph results.
pub type GraphResult<T> = Result<T, GraphError>;
