//! Solver trait and dispatcher.

use serde::{Deserialize, Serialize};
use tracing::debug;

use arbor_types::IdSet;

use crate::brute::BruteWeightedIs;
use crate::candidate::{check_weights, MwisSolution, SolveMethod, WeightedCandidate};
use crate::error::MwisResult;
use crate::greedy::GreedyWeightedIs;

/// A maximum-weight independent-set solver.
pub trait WeightedIndependentSet {
    /// Short solver name for diagnostics.
    fn name(&self) -> &str;

    /// Choose a pairwise non-conflicting subset of `candidates`.
    fn solve(&self, candidates: &[WeightedCandidate]) -> MwisResult<MwisSolution>;
}

/// Dispatcher configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MwisConfig {
    /// Largest candidate count solved exactly; larger inputs go greedy.
    pub exact_threshold: usize,
}

impl Default for MwisConfig {
    fn default() -> Self {
        Self {
            exact_threshold: 25,
        }
    }
}

/// Returns `true` when no two candidates share a tip.
pub fn tips_are_disjoint(candidates: &[WeightedCandidate]) -> bool {
    let mut union = IdSet::new();
    let mut total = 0u64;
    for c in candidates {
        total += c.tips.len();
        union.union_with(&c.tips);
    }
    total == union.len()
}

/// Solve with the no-conflict fast path, then exact or greedy search.
pub fn solve(candidates: &[WeightedCandidate], config: &MwisConfig) -> MwisResult<MwisSolution> {
    check_weights(candidates)?;

    if tips_are_disjoint(candidates) {
        debug!(candidates = candidates.len(), "no conflicts, taking every candidate");
        return Ok(MwisSolution::from_positions(
            candidates,
            0..candidates.len(),
            SolveMethod::NoConflict,
        ));
    }

    let solver: &dyn WeightedIndependentSet = if candidates.len() <= config.exact_threshold {
        &BruteWeightedIs
    } else {
        &GreedyWeightedIs
    };
    debug!(
        candidates = candidates.len(),
        solver = solver.name(),
        "solving independent set"
    );
    solver.solve(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_types::EdgeId;
    use proptest::prelude::*;

    fn cand(id: u64, weight: f64, ids: &[u64]) -> WeightedCandidate {
        let set: IdSet = ids.iter().copied().collect();
        WeightedCandidate::new(EdgeId(id), weight, set.clone(), set)
    }

    fn pairwise_disjoint(candidates: &[WeightedCandidate], chosen: &[EdgeId]) -> bool {
        let picked: Vec<&WeightedCandidate> = candidates
            .iter()
            .filter(|c| chosen.contains(&c.id))
            .collect();
        picked
            .iter()
            .enumerate()
            .all(|(i, a)| picked[i + 1..].iter().all(|b| !a.conflicts_with(b)))
    }

    #[test]
    fn disjoint_input_takes_fast_path() {
        let cands = vec![cand(1, 1.0, &[1]), cand(2, 1.0, &[2, 3]), cand(3, 9.0, &[4])];
        let sol = solve(&cands, &MwisConfig::default()).unwrap();
        assert_eq!(sol.method, SolveMethod::NoConflict);
        assert_eq!(sol.chosen.len(), 3);
    }

    #[test]
    fn small_conflicting_input_is_exact() {
        let cands = vec![cand(1, 3.0, &[1, 2, 3]), cand(2, 1.0, &[1]), cand(3, 2.5, &[2, 3])];
        let sol = solve(&cands, &MwisConfig::default()).unwrap();
        assert_eq!(sol.method, SolveMethod::Exact);
        assert_eq!(sol.chosen, vec![EdgeId(2), EdgeId(3)]);
    }

    #[test]
    fn threshold_routes_to_greedy() {
        let cands = vec![cand(1, 3.0, &[1, 2, 3]), cand(2, 1.0, &[1]), cand(3, 2.5, &[2, 3])];
        let config = MwisConfig { exact_threshold: 2 };
        let sol = solve(&cands, &config).unwrap();
        assert_eq!(sol.method, SolveMethod::Greedy);
        assert_eq!(sol.chosen, vec![EdgeId(1)]);
    }

    #[test]
    fn negative_weight_rejected_before_fast_path() {
        let err = solve(&[cand(1, -1.0, &[1])], &MwisConfig::default()).unwrap_err();
        assert!(matches!(err, crate::MwisError::InvalidWeight { .. }));
    }

    fn arb_candidates() -> impl Strategy<Value = Vec<WeightedCandidate>> {
        proptest::collection::vec(
            (1u32..20, proptest::collection::btree_set(0u64..16, 1..5)),
            0..12,
        )
        .prop_map(|items| {
            items
                .into_iter()
                .enumerate()
                .map(|(i, (w, ids))| {
                    let set: IdSet = ids.into_iter().collect();
                    WeightedCandidate::new(EdgeId(i as u64), w as f64, set.clone(), set)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn exact_never_loses_to_greedy(cands in arb_candidates()) {
            let exact = BruteWeightedIs.solve(&cands).unwrap();
            let greedy = GreedyWeightedIs.solve(&cands).unwrap();
            prop_assert!(exact.total_weight >= greedy.total_weight);
        }

        #[test]
        fn every_solution_is_conflict_free(cands in arb_candidates()) {
            let config = MwisConfig { exact_threshold: 6 };
            let sol = solve(&cands, &config).unwrap();
            prop_assert!(pairwise_disjoint(&cands, &sol.chosen));
        }

        #[test]
        fn fast_path_returns_everything_when_disjoint(n in 0usize..20) {
            let cands: Vec<_> = (0..n as u64).map(|i| cand(i, 1.0, &[i * 2, i * 2 + 1])).collect();
            let sol = solve(&cands, &MwisConfig::default()).unwrap();
            prop_assert_eq!(sol.chosen.len(), n);
            prop_assert_eq!(sol.method, SolveMethod::NoConflict);
        }
    }
}
