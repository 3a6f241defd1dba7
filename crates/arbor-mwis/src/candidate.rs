//! Solver inputs and outputs.

use std::fmt;

use serde::{Deserialize, Serialize};

use arbor_types::{EdgeId, IdSet};

use crate::error::{MwisError, MwisResult};

/// One candidate of an independent-set problem.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedCandidate {
    pub id: EdgeId,
    pub weight: f64,
    /// Ids covered by the candidate; overlapping constituents conflict.
    pub constituents: IdSet,
    /// Leaf ids covered by the candidate; used by the no-conflict test.
    pub tips: IdSet,
}

impl WeightedCandidate {
    pub fn new(id: EdgeId, weight: f64, constituents: IdSet, tips: IdSet) -> Self {
        Self {
            id,
            weight,
            constituents,
            tips,
        }
    }

    pub fn conflicts_with(&self, other: &WeightedCandidate) -> bool {
        self.constituents.intersects(&other.constituents)
    }
}

/// Which path produced a solution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveMethod {
    NoConflict,
    Exact,
    Greedy,
}

impl fmt::Display for SolveMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoConflict => "no-conflict",
            Self::Exact => "exact",
            Self::Greedy => "greedy",
        })
    }
}

/// A pairwise non-conflicting selection.
#[derive(Clone, Debug, PartialEq)]
pub struct MwisSolution {
    /// Chosen candidate ids, in input order.
    pub chosen: Vec<EdgeId>,
    pub total_weight: f64,
    pub method: SolveMethod,
}

impl MwisSolution {
    /// Build a solution from chosen input positions.
    pub(crate) fn from_positions(
        candidates: &[WeightedCandidate],
        positions: impl IntoIterator<Item = usize>,
        method: SolveMethod,
    ) -> Self {
        let mut chosen = Vec::new();
        let mut total_weight = 0.0;
        for pos in positions {
            chosen.push(candidates[pos].id);
            total_weight += candidates[pos].weight;
        }
        Self {
            chosen,
            total_weight,
            method,
        }
    }
}

/// Reject weights the solvers cannot order.
pub(crate) fn check_weights(candidates: &[WeightedCandidate]) -> MwisResult<()> {
    for c in candidates {
        if !c.weight.is_finite() || c.weight < 0.0 {
            return Err(MwisError::InvalidWeight {
                id: c.id,
                weight: c.weight,
            });
        }
    }
    Ok(())
}
