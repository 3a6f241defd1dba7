//! Error types for MWIS solving.

use arbor_types::EdgeId;

/// Errors that can occur while solving an independent-set problem.
#[derive(Debug, thiserror::Error)]
pub enum MwisError {
    /// A candidate weight was negative, infinite or NaN.
    #[error("invalid weight {weight} for candidate {id:?}")]
    InvalidWeight { id: EdgeId, weight: f64 },

    /// The exact solver was handed more candidates than a bitmask can hold.
    #[error("exact search supports at most {max} candidates, got {actual}")]
    TooManyCandidates { max: usize, actual: usize },
}

/// Convenience alias for MWIS results.
pub type MwisResult<T> = Result<T, MwisError>;
