//! Exact branch-and-bound MWIS.

use tracing::trace;

use arbor_types::IdSet;

use crate::bitmask::BitMask;
use crate::candidate::{check_weights, MwisSolution, SolveMethod, WeightedCandidate};
use crate::error::{MwisError, MwisResult};
use crate::solve::WeightedIndependentSet;

/// Exact solver: enumerates conflict-free subsets by growing a bitmask one
/// position at a time, always extending with positions after the last one
/// added.
///
/// A branch is only extended while the running union of constituents stays
/// disjoint from the next candidate, and is abandoned once its weight plus
/// every remaining weight cannot beat the best score. Only a strictly
/// heavier subset replaces the best, so among equal-weight subsets the first
/// one enumerated wins.
#[derive(Clone, Copy, Debug, Default)]
pub struct BruteWeightedIs;

struct Search<'a> {
    candidates: &'a [WeightedCandidate],
    /// `suffix[i]` is the total weight of candidates `i..`.
    suffix: Vec<f64>,
    best: BitMask,
    best_weight: f64,
    explored: u64,
}

impl Search<'_> {
    fn grow(&mut self, start: usize, mask: BitMask, union: &IdSet, weight: f64) {
        self.explored += 1;
        if weight > self.best_weight {
            self.best = mask;
            self.best_weight = weight;
        }
        for i in start..self.candidates.len() {
            if weight + self.suffix[i] <= self.best_weight {
                break;
            }
            let candidate = &self.candidates[i];
            if candidate.constituents.intersects(union) {
                continue;
            }
            let mut extended = union.clone();
            extended.union_with(&candidate.constituents);
            self.grow(i + 1, mask.with(i), &extended, weight + candidate.weight);
        }
    }
}

impl WeightedIndependentSet for BruteWeightedIs {
    fn name(&self) -> &str {
        "exact"
    }

    fn solve(&self, candidates: &[WeightedCandidate]) -> MwisResult<MwisSolution> {
        check_weights(candidates)?;
        if candidates.len() > BitMask::CAPACITY {
            return Err(MwisError::TooManyCandidates {
                max: BitMask::CAPACITY,
                actual: candidates.len(),
            });
        }

        let mut suffix = vec![0.0; candidates.len() + 1];
        for i in (0..candidates.len()).rev() {
            suffix[i] = suffix[i + 1] + candidates[i].weight;
        }
        let mut search = Search {
            candidates,
            suffix,
            best: BitMask::empty(),
            best_weight: 0.0,
            explored: 0,
        };
        search.grow(0, BitMask::empty(), &IdSet::new(), 0.0);

        trace!(
            candidates = candidates.len(),
            explored = search.explored,
            best = search.best_weight,
            "exact search finished"
        );
        Ok(MwisSolution::from_positions(
            candidates,
            search.best.positions(),
            SolveMethod::Exact,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_types::EdgeId;

    fn cand(id: u64, weight: f64, ids: &[u64]) -> WeightedCandidate {
        let set: IdSet = ids.iter().copied().collect();
        WeightedCandidate::new(EdgeId(id), weight, set.clone(), set)
    }

    #[test]
    fn prefers_two_light_over_one_heavy() {
        // {1,2,3} weighs 3; {1} + {2,3} weigh 1 + 2.5.
        let cands = vec![cand(1, 3.0, &[1, 2, 3]), cand(2, 1.0, &[1]), cand(3, 2.5, &[2, 3])];
        let sol = BruteWeightedIs.solve(&cands).unwrap();
        assert_eq!(sol.chosen, vec![EdgeId(2), EdgeId(3)]);
        assert_eq!(sol.total_weight, 3.5);
        assert_eq!(sol.method, SolveMethod::Exact);
    }

    #[test]
    fn ties_keep_first_enumerated() {
        let cands = vec![cand(1, 2.0, &[1, 2]), cand(2, 2.0, &[2, 3])];
        let sol = BruteWeightedIs.solve(&cands).unwrap();
        assert_eq!(sol.chosen, vec![EdgeId(1)]);
    }

    #[test]
    fn empty_input_yields_empty_solution() {
        let sol = BruteWeightedIs.solve(&[]).unwrap();
        assert!(sol.chosen.is_empty());
        assert_eq!(sol.total_weight, 0.0);
    }

    #[test]
    fn rejects_nan_weight() {
        let err = BruteWeightedIs.solve(&[cand(1, f64::NAN, &[1])]).unwrap_err();
        assert!(matches!(err, MwisError::InvalidWeight { .. }));
    }

    #[test]
    fn rejects_oversized_input() {
        let cands: Vec<_> = (0..65).map(|i| cand(i, 1.0, &[i])).collect();
        let err = BruteWeightedIs.solve(&cands).unwrap_err();
        assert!(matches!(err, MwisError::TooManyCandidates { actual: 65, .. }));
    }
}
