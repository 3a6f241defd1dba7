//! Maximum-weight independent set (MWIS) solvers.
//!
//! Given candidate edges that each cover a set of ids, pick a pairwise
//! non-conflicting subset of maximum total weight. Two candidates conflict
//! when their constituent sets intersect.
//!
//! [`solve`] dispatches between three paths:
//!
//! - **No conflict**: when the candidates' tip sets are already pairwise
//!   disjoint every candidate is returned without searching.
//! - **Exact** ([`BruteWeightedIs`]): branch-and-bound enumeration of
//!   conflict-free subsets, used up to [`MwisConfig::exact_threshold`]
//!   candidates.
//! - **Greedy** ([`GreedyWeightedIs`]): repeatedly take the heaviest
//!   remaining candidate, used above the threshold.

pub mod bitmask;
pub mod brute;
pub mod candidate;
pub mod error;
pub mod greedy;
pub mod solve;

pub use bitmask::BitMask;
pub use brute::BruteWeightedIs;
pub use candidate::{MwisSolution, SolveMethod, WeightedCandidate};
pub use error::{MwisError, MwisResult};
pub use greedy::GreedyWeightedIs;
pub use solve::{solve, MwisConfig, WeightedIndependentSet};
