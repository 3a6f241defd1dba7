//! Per-node edge selection.
//!
//! Synthesis visits nodes leaf-to-root and, at each node, chooses which of
//! its incoming candidate edges survive. This crate holds everything that
//! decision needs:
//!
//! - [`SubtreeInfo`] records what a finished synthesized subtree contains
//!   (nodes, source branches, tip sets by rank) and compares records.
//! - [`classify`] groups a node's incoming edges into rank-keyed
//!   [`EdgeSet`]s and deferred taxonomy singletons.
//! - [`PrunableProduct`] and [`UnionFind`] drive the combinatorial search.
//! - [`NodeSelectionStrategy`] is the pluggable decision; four strategies
//!   ship: [`RankedAugmentingSearch`], [`RankPriority`],
//!   [`RankPriorityInferredPath`], and [`MwisOnly`].

pub mod augment;
pub mod classify;
pub mod error;
#[cfg(test)]
mod fixture;
pub mod mwis_only;
pub mod product;
pub mod provenance;
pub mod resolve;
pub mod strategy;
pub mod union_find;

pub use augment::{RankedAugmentingSearch, DEFAULT_MAX_PRODUCT_SIZE};
pub use classify::{classify, CandidateRelSet, Classification, EdgeSet};
pub use error::{SelectError, SelectResult};
pub use mwis_only::MwisOnly;
pub use product::PrunableProduct;
pub use provenance::{SubtreeInfo, SubtreeTable};
pub use resolve::{
    resolve_inferred_path, resolve_strict, ConflictType, RankPriority, RankPriorityInferredPath,
};
pub use strategy::{NodeInput, NodeSelection, NodeSelectionStrategy, StrategyKind};
pub use union_find::UnionFind;
