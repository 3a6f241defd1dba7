//! Greedy approximate MWIS.

use tracing::trace;

use crate::candidate::{check_weights, MwisSolution, SolveMethod, WeightedCandidate};
use crate::error::MwisResult;
use crate::solve::WeightedIndependentSet;

/// Greedy solver: repeatedly takes the heaviest remaining candidate (the
/// earliest one on ties) and discards everything conflicting with it.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedyWeightedIs;

impl WeightedIndependentSet for GreedyWeightedIs {
    fn name(&self) -> &str {
        "greedy"
    }

    fn solve(&self, candidates: &[WeightedCandidate]) -> MwisResult<MwisSolution> {
        check_weights(candidates)?;

        let mut remaining: Vec<usize> = (0..candidates.len()).collect();
        let mut chosen = Vec::new();
        while !remaining.is_empty() {
            let mut pick = remaining[0];
            for &i in &remaining[1..] {
                if candidates[i].weight > candidates[pick].weight {
                    pick = i;
                }
            }
            chosen.push(pick);
            remaining.retain(|&i| i != pick && !candidates[i].conflicts_with(&candidates[pick]));
        }
        chosen.sort_unstable();

        trace!(
            candidates = candidates.len(),
            chosen = chosen.len(),
            "greedy selection finished"
        );
        Ok(MwisSolution::from_positions(
            candidates,
            chosen,
            SolveMethod::Greedy,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_types::{EdgeId, IdSet};

    fn cand(id: u64, weight: f64, ids: &[u64]) -> WeightedCandidate {
        let set: IdSet = ids.iter().copied().collect();
        WeightedCandidate::new(EdgeId(id), weight, set.clone(), set)
    }

    #[test]
    fn takes_heaviest_first() {
        let cands = vec![cand(1, 1.0, &[1]), cand(2, 3.0, &[1, 2, 3]), cand(3, 2.5, &[2, 3])];
        let sol = GreedyWeightedIs.solve(&cands).unwrap();
        assert_eq!(sol.chosen, vec![EdgeId(2)]);
        assert_eq!(sol.method, SolveMethod::Greedy);
    }

    #[test]
    fn output_keeps_input_order() {
        let cands = vec![cand(7, 1.0, &[1]), cand(3, 5.0, &[2]), cand(5, 2.0, &[3])];
        let sol = GreedyWeightedIs.solve(&cands).unwrap();
        assert_eq!(sol.chosen, vec![EdgeId(7), EdgeId(3), EdgeId(5)]);
        assert_eq!(sol.total_weight, 8.0);
    }

    #[test]
    fn ties_go_to_earliest() {
        let cands = vec![cand(1, 2.0, &[1, 2]), cand(2, 2.0, &[2, 3])];
        let sol = GreedyWeightedIs.solve(&cands).unwrap();
        assert_eq!(sol.chosen, vec![EdgeId(1)]);
    }
}
