//! Strongly connected components and cycle breaking.
//!
//! Candidate graphs built from conflicting sources can contain cycles
//! (source A places X inside Y, source B places Y inside X). Traversal
//! rejects them; this module finds them with Tarjan's algorithm and, when
//! asked, chooses edges to exclude so traversal can proceed.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::warn;

use arbor_types::{EdgeId, EdgeKind, NodeId};

use crate::view::GraphView;

/// Strongly connected components of a candidate graph.
#[derive(Clone, Debug, Default)]
pub struct TarjanScc {
    components: Vec<Vec<NodeId>>,
    cyclic: Vec<usize>,
}

impl TarjanScc {
    /// Compute the components over edges of `kinds`, ignoring `excluded`.
    pub fn compute<G: GraphView + ?Sized>(
        graph: &G,
        kinds: &[EdgeKind],
        excluded: &BTreeSet<EdgeId>,
    ) -> Self {
        let successors = |node: NodeId| -> Vec<NodeId> {
            graph
                .parents_of(node, kinds)
                .into_iter()
                .filter(|e| !excluded.contains(&e.id))
                .map(|e| e.parent)
                .collect()
        };

        let mut index_of: HashMap<NodeId, usize> = HashMap::new();
        let mut low: HashMap<NodeId, usize> = HashMap::new();
        let mut on_stack: HashSet<NodeId> = HashSet::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut components = Vec::new();
        let mut next_index = 0usize;

        for root in graph.node_ids() {
            if index_of.contains_key(&root) {
                continue;
            }
            index_of.insert(root, next_index);
            low.insert(root, next_index);
            next_index += 1;
            stack.push(root);
            on_stack.insert(root);
            let mut calls: Vec<(NodeId, Vec<NodeId>, usize)> = vec![(root, successors(root), 0)];

            while let Some((node, succ, pos)) = calls.last_mut() {
                let node = *node;
                if *pos < succ.len() {
                    let w = succ[*pos];
                    *pos += 1;
                    if let Some(&w_index) = index_of.get(&w) {
                        if on_stack.contains(&w) {
                            let l = low[&node].min(w_index);
                            low.insert(node, l);
                        }
                    } else {
                        index_of.insert(w, next_index);
                        low.insert(w, next_index);
                        next_index += 1;
                        stack.push(w);
                        on_stack.insert(w);
                        calls.push((w, successors(w), 0));
                    }
                    continue;
                }

                calls.pop();
                if let Some((caller, _, _)) = calls.last() {
                    let l = low[caller].min(low[&node]);
                    low.insert(*caller, l);
                }
                if low[&node] == index_of[&node] {
                    let mut component = Vec::new();
                    while let Some(member) = stack.pop() {
                        on_stack.remove(&member);
                        component.push(member);
                        if member == node {
                            break;
                        }
                    }
                    component.sort();
                    components.push(component);
                }
            }
        }

        let cyclic = components
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                c.len() > 1
                    || graph
                        .parents_of(c[0], kinds)
                        .iter()
                        .any(|e| e.parent == c[0] && !excluded.contains(&e.id))
            })
            .map(|(i, _)| i)
            .collect();

        Self { components, cyclic }
    }

    /// Every component, singletons included.
    pub fn components(&self) -> &[Vec<NodeId>] {
        &self.components
    }

    /// Components that contain a cycle: more than one node, or a self-loop.
    pub fn cycles(&self) -> impl Iterator<Item = &Vec<NodeId>> {
        self.cyclic.iter().map(|i| &self.components[*i])
    }

    pub fn is_acyclic(&self) -> bool {
        self.cyclic.is_empty()
    }
}

/// Choose edges to exclude so that edges of `kinds` form no cycle.
///
/// Repeatedly takes each cyclic component and excludes its least trusted
/// internal edge (lowest rank, then highest edge id) together with every
/// edge parallel to it, until no cycle remains.
pub fn break_cycles<G: GraphView + ?Sized>(graph: &G, kinds: &[EdgeKind]) -> BTreeSet<EdgeId> {
    let mut excluded = BTreeSet::new();
    loop {
        let scc = TarjanScc::compute(graph, kinds, &excluded);
        if scc.is_acyclic() {
            return excluded;
        }
        for component in scc.cycles() {
            let members: BTreeSet<NodeId> = component.iter().copied().collect();
            let victim = component
                .iter()
                .flat_map(|node| graph.parents_of(*node, kinds))
                .filter(|e| !excluded.contains(&e.id) && members.contains(&e.parent))
                .min_by_key(|e| (e.rank, std::cmp::Reverse(e.id)));
            let Some(victim) = victim else {
                continue;
            };
            let (child, parent) = (victim.child, victim.parent);
            let parallel: Vec<EdgeId> = graph
                .parents_of(child, kinds)
                .into_iter()
                .filter(|e| e.parent == parent)
                .map(|e| e.id)
                .collect();
            warn!(
                child = %child,
                parent = %parent,
                edges = parallel.len(),
                "excluding edges to break cycle"
            );
            excluded.extend(parallel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryGraph, NodeRecord};
    use crate::order::TopologicalOrder;
    use arbor_types::{CandidateEdge, Rank, SourceEdgeId};

    fn n(id: u64) -> NodeId {
        NodeId(id)
    }

    fn graph_with(nodes: &[u64], edges: &[(u64, u64, u64, Rank)]) -> MemoryGraph {
        let mut g = MemoryGraph::new();
        for id in nodes {
            g.add_node(NodeRecord::new(n(*id))).unwrap();
        }
        for (id, child, parent, rank) in edges {
            g.add_edge(CandidateEdge::source_tree(
                EdgeId(*id),
                n(*child),
                n(*parent),
                *rank,
                SourceEdgeId(*id),
            ))
            .unwrap();
        }
        g
    }

    #[test]
    fn acyclic_graph_has_only_singletons() {
        let g = graph_with(&[1, 2, 3], &[(1, 1, 2, 1), (2, 2, 3, 1)]);
        let scc = TarjanScc::compute(&g, &EdgeKind::ALL, &BTreeSet::new());
        assert_eq!(scc.components().len(), 3);
        assert!(scc.is_acyclic());
    }

    #[test]
    fn three_cycle_is_one_component() {
        let g = graph_with(
            &[1, 2, 3, 4],
            &[(1, 1, 2, 1), (2, 2, 3, 1), (3, 3, 1, 1), (4, 3, 4, 1)],
        );
        let scc = TarjanScc::compute(&g, &EdgeKind::ALL, &BTreeSet::new());
        let cycles: Vec<_> = scc.cycles().collect();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0], &vec![n(1), n(2), n(3)]);
    }

    #[test]
    fn self_loop_counts_as_cycle() {
        let g = graph_with(&[1, 2], &[(1, 1, 1, 1), (2, 1, 2, 1)]);
        let scc = TarjanScc::compute(&g, &EdgeKind::ALL, &BTreeSet::new());
        assert_eq!(scc.cycles().count(), 1);
    }

    #[test]
    fn breaker_drops_lowest_rank_edge() {
        // 1 -> 2 (rank 3), 2 -> 1 (rank 1): the rank-1 edge goes.
        let g = graph_with(&[1, 2, 3], &[(1, 1, 2, 3), (2, 2, 1, 1), (3, 2, 3, 2)]);
        let excluded = break_cycles(&g, &EdgeKind::ALL);
        assert_eq!(excluded, BTreeSet::from([EdgeId(2)]));
        let order = TopologicalOrder::whole_graph(&g, &EdgeKind::ALL)
            .excluding(&excluded)
            .build();
        assert!(order.is_ok());
    }

    #[test]
    fn breaker_removes_parallel_edges_together() {
        let g = graph_with(
            &[1, 2],
            &[(1, 1, 2, 5), (2, 2, 1, 1), (3, 2, 1, 4)],
        );
        let excluded = break_cycles(&g, &EdgeKind::ALL);
        assert_eq!(excluded, BTreeSet::from([EdgeId(2), EdgeId(3)]));
    }

    #[test]
    fn breaker_handles_nested_cycles() {
        // Two cycles sharing node 2: 1<->2 and 2<->3.
        let g = graph_with(
            &[1, 2, 3],
            &[(1, 1, 2, 2), (2, 2, 1, 1), (3, 2, 3, 2), (4, 3, 2, 1)],
        );
        let excluded = break_cycles(&g, &EdgeKind::ALL);
        let scc = TarjanScc::compute(&g, &EdgeKind::ALL, &excluded);
        assert!(scc.is_acyclic());
    }
}
