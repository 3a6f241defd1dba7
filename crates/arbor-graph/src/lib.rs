//! Candidate graph access for Arbor.
//!
//! Synthesis reads the candidate graph only through the [`GraphView`] trait.
//! This crate provides that trait, an in-memory implementation used by tests
//! and the CLI, the leaf-to-root [`TopologicalOrder`] every synthesis run is
//! driven by, and strongly-connected-component analysis for optional cycle
//! breaking before traversal.

pub mod document;
pub mod error;
pub mod memory;
pub mod order;
pub mod scc;
pub mod view;

pub use document::{GraphDocument, SourceRecord};
pub use error::{GraphError, GraphResult};
pub use memory::{MemoryGraph, NodeRecord};
pub use order::TopologicalOrder;
pub use scc::{break_cycles, TarjanScc};
pub use view::GraphView;
