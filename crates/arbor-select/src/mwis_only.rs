//! Node-count maximisation without rank priority.

use std::collections::BTreeMap;

use tracing::debug;

use arbor_mwis::{solve, MwisConfig, WeightedCandidate};
use arbor_types::{CandidateEdge, IdSet, NodeId};

use crate::error::SelectResult;
use crate::strategy::{NodeInput, NodeSelection, NodeSelectionStrategy};

/// Chooses the children whose subtrees cover the most graph nodes.
///
/// Children carrying a single synthesized tip are set aside and attached
/// afterwards when their tip is not already covered. Every other child is
/// represented by its lowest-id edge and weighted by its subtree's node
/// count.
#[derive(Clone, Debug, Default)]
pub struct MwisOnly {
    config: MwisConfig,
}

impl MwisOnly {
    pub fn new(config: MwisConfig) -> Self {
        Self { config }
    }
}

impl NodeSelectionStrategy for MwisOnly {
    fn name(&self) -> &str {
        "mwis-only"
    }

    fn description(&self) -> String {
        format!(
            "Maximises the number of nodes under each node with a weighted \
             independent set over its children (exact up to {} children, \
             greedy above), ignoring source rank.",
            self.config.exact_threshold
        )
    }

    fn select(&self, input: &NodeInput<'_>) -> SelectResult<NodeSelection> {
        // First edge per child, by edge id.
        let mut first_edge: BTreeMap<NodeId, &CandidateEdge> = BTreeMap::new();
        for edge in &input.incoming {
            first_edge.entry(edge.child).or_insert(*edge);
        }
        let mut representatives: Vec<&CandidateEdge> = first_edge.into_values().collect();
        representatives.sort_by_key(|e| e.id);

        let mut candidates = Vec::new();
        let mut singletons = Vec::new();
        for edge in representatives {
            let subtree = input.child_subtree(edge.child)?;
            if subtree.tip_ids().len() == 1 {
                singletons.push((edge, subtree));
                continue;
            }
            candidates.push((
                edge,
                WeightedCandidate::new(
                    edge.id,
                    subtree.included_ids().len() as f64,
                    subtree.included_ids().clone(),
                    subtree.tip_ids().clone(),
                ),
            ));
        }

        let weighted: Vec<WeightedCandidate> = candidates.iter().map(|(_, c)| c.clone()).collect();
        let solution = solve(&weighted, &self.config)?;
        debug!(
            node = %input.node,
            candidates = weighted.len(),
            chosen = solution.chosen.len(),
            method = %solution.method,
            "solved node by weight"
        );

        let mut chosen: Vec<&CandidateEdge> = candidates
            .iter()
            .filter(|(edge, _)| solution.chosen.contains(&edge.id))
            .map(|(edge, _)| *edge)
            .collect();
        let mut covered = IdSet::new();
        for (_, candidate) in candidates.iter().filter(|(e, _)| solution.chosen.contains(&e.id)) {
            covered.union_with(&candidate.constituents);
        }
        for (edge, subtree) in singletons {
            if !subtree.included_ids().intersects(&covered) {
                covered.union_with(subtree.included_ids());
                chosen.push(edge);
            }
        }

        input.complete_selection(&chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::Fixture;

    fn n(id: u64) -> NodeId {
        NodeId(id)
    }

    #[test]
    fn picks_heaviest_compatible_children() {
        // 10 = {1,2} and 11 = {2,3,4} conflict; 11 is heavier. Leaf 1 and
        // the single-tip node 12 = {5} come back afterwards.
        let mut fx = Fixture::new(&[1, 2, 3, 4, 5, 10, 11, 12, 20]);
        fx.stree(1, 10, 5, 1);
        fx.stree(2, 10, 5, 2);
        fx.stree(2, 11, 1, 3);
        fx.stree(3, 11, 1, 4);
        fx.stree(4, 11, 1, 5);
        fx.stree(5, 12, 1, 6);
        fx.stree(10, 20, 5, 100);
        fx.stree(11, 20, 1, 101);
        fx.stree(12, 20, 1, 102);
        fx.tax(1, 20);

        let result = fx.run(20, &MwisOnly::default()).unwrap();
        assert_eq!(fx.children(&result[&n(20)]), vec![1, 11, 12]);
    }

    #[test]
    fn disjoint_children_are_all_kept() {
        let mut fx = Fixture::new(&[1, 2, 3, 4, 10, 11, 20]);
        fx.stree(1, 10, 1, 1);
        fx.stree(2, 10, 1, 2);
        fx.stree(3, 11, 1, 3);
        fx.stree(4, 11, 1, 4);
        fx.stree(10, 20, 1, 100);
        fx.stree(11, 20, 1, 101);

        let result = fx.run(20, &MwisOnly::default()).unwrap();
        let root = &result[&n(20)];
        assert_eq!(fx.children(root), vec![10, 11]);
        assert_eq!(root.info.tip_ids().to_vec(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn parallel_edges_collapse_to_one() {
        let mut fx = Fixture::new(&[1, 2, 10, 20]);
        fx.stree(1, 10, 1, 1);
        fx.stree(2, 10, 1, 2);
        let first = fx.stree(10, 20, 1, 100);
        fx.stree(10, 20, 2, 200);

        let result = fx.run(20, &MwisOnly::default()).unwrap();
        assert_eq!(result[&n(20)].edges, vec![first]);
    }
}
