//! Foundation types for Arbor.
//!
//! Every other Arbor crate depends on `arbor-types`. The types here describe
//! the candidate graph that hierarchy synthesis runs over: nodes, the ranked
//! candidate edges proposed by source hierarchies, and the compressed leaf-id
//! sets used for every overlap test.
//!
//! # Key Types
//!
//! - [`NodeId`] / [`EdgeId`] — Opaque identifiers in the candidate graph
//! - [`SourceEdgeId`] — Identity of an original branch within one source tree
//! - [`Rank`] — Source priority; taxonomy is rank 0, higher is preferred
//! - [`IdSet`] — Compressed bitset of leaf or node ids
//! - [`CandidateEdge`] — A child→parent relation proposed by one source
//! - [`PropertyValue`] — Source metadata value used for rank assignment

pub mod edge;
pub mod error;
pub mod ids;
pub mod idset;
pub mod property;

pub use edge::{CandidateEdge, EdgeKind};
pub use error::TypeError;
pub use ids::{EdgeId, NodeId, Rank, SourceEdgeId, TAXONOMY_RANK};
pub use idset::IdSet;
pub use property::PropertyValue;
