use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("unknown edge kind: {0}")]
    UnknownEdgeKind(String),

    #[error("cannot compare property values of different types: {left} vs {right}")]
    IncomparableValues { left: String, right: String },
}
