//! Error types for synthesis runs, configuration, and source ranking.

use std::path::PathBuf;

use arbor_graph::GraphError;
use arbor_select::SelectError;
use arbor_types::{NodeId, TypeError};

/// Errors that can occur during a synthesis run.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// The graph could not be traversed (cycles, missing nodes).
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A node could not be decided.
    #[error(transparent)]
    Select(#[from] SelectError),

    /// Source ranks could not be assigned.
    #[error(transparent)]
    Ranking(#[from] RankingError),

    /// The configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The requested root is not a node of the graph.
    #[error("root node not found: {0:?}")]
    RootNotFound(NodeId),

    /// A selection sink refused a record.
    #[error("sink error: {0}")]
    Sink(String),

    /// A synthesized tree could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Errors raised while loading or validating a [`SynthesisConfig`].
///
/// [`SynthesisConfig`]: crate::SynthesisConfig
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot encode configuration: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised while ordering sources by a property.
#[derive(Debug, thiserror::Error)]
pub enum RankingError {
    /// Two sources carry values of different types for the ranking property.
    #[error("property {property:?}: {source}")]
    IncomparableValues {
        property: String,
        #[source]
        source: TypeError,
    },

    /// Two sources share a name, so ranks cannot be keyed by name.
    #[error("duplicate source name: {0}")]
    DuplicateSource(String),
}

impl SynthError {
    /// Create a sink error from any displayable value.
    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }
}

/// Convenience alias for synthesis results.
pub type SynthResult<T> = Result<T, SynthError>;

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Convenience alias for ranking results.
pub type RankingResult<T> = Result<T, RankingError>;
