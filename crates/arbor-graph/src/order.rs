//! Leaf-to-root topological ordering.
//!
//! Synthesis decides a node only after every one of its children has been
//! decided, so it consumes nodes in the order produced here: each node
//! appears after all nodes reachable from it by descending incoming edges.
//!
//! The traversal is a three-colour depth-first search run on an explicit
//! stack, so deep hierarchies cannot overflow the call stack. Re-entering a
//! node that is still in progress means the chosen edge kinds contain a
//! cycle, and the whole ordering fails.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use arbor_types::{EdgeId, EdgeKind, NodeId};

use crate::error::{GraphError, GraphResult};
use crate::view::GraphView;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

enum Start {
    Root(NodeId),
    WholeGraph,
}

/// Builder for a leaf-to-root node ordering.
pub struct TopologicalOrder<'g, G: GraphView + ?Sized> {
    graph: &'g G,
    kinds: Vec<EdgeKind>,
    start: Start,
    excluded: BTreeSet<EdgeId>,
    validator: Option<Box<dyn Fn(NodeId) -> bool + 'g>>,
}

impl<'g, G: GraphView + ?Sized> TopologicalOrder<'g, G> {
    /// Order the nodes reachable from `root` by descending incoming edges
    /// of `kinds`. The root itself comes last.
    pub fn from_root(graph: &'g G, root: NodeId, kinds: &[EdgeKind]) -> Self {
        Self {
            graph,
            kinds: kinds.to_vec(),
            start: Start::Root(root),
            excluded: BTreeSet::new(),
            validator: None,
        }
    }

    /// Order every node of the graph.
    pub fn whole_graph(graph: &'g G, kinds: &[EdgeKind]) -> Self {
        Self {
            graph,
            kinds: kinds.to_vec(),
            start: Start::WholeGraph,
            excluded: BTreeSet::new(),
            validator: None,
        }
    }

    /// Ignore the given edges while traversing.
    pub fn excluding(mut self, edges: &BTreeSet<EdgeId>) -> Self {
        self.excluded.extend(edges.iter().copied());
        self
    }

    /// Skip nodes failing `predicate`: they are neither emitted nor
    /// descended into. The root of a rooted ordering is never skipped.
    pub fn validate_with(mut self, predicate: impl Fn(NodeId) -> bool + 'g) -> Self {
        self.validator = Some(Box::new(predicate));
        self
    }

    /// Child nodes of `node` in ascending edge-id order, without repeats.
    fn children(&self, node: NodeId) -> Vec<NodeId> {
        let mut seen = BTreeSet::new();
        self.graph
            .children_of(node, &self.kinds)
            .into_iter()
            .filter(|e| !self.excluded.contains(&e.id))
            .map(|e| e.child)
            .filter(|c| seen.insert(*c))
            .collect()
    }

    fn accepts(&self, node: NodeId) -> bool {
        self.validator.as_ref().map_or(true, |v| v(node))
    }

    /// Run the traversal.
    pub fn build(self) -> GraphResult<Vec<NodeId>> {
        let starts = match &self.start {
            Start::Root(root) => {
                if !self.graph.contains_node(*root) {
                    return Err(GraphError::NodeNotFound(*root));
                }
                vec![*root]
            }
            Start::WholeGraph => self
                .graph
                .node_ids()
                .into_iter()
                .filter(|n| self.accepts(*n))
                .collect(),
        };

        let mut marks: HashMap<NodeId, Mark> = HashMap::new();
        let mut order = Vec::new();

        for start in starts {
            if marks.contains_key(&start) {
                continue;
            }
            marks.insert(start, Mark::InProgress);
            let mut stack: Vec<(NodeId, Vec<NodeId>, usize)> =
                vec![(start, self.children(start), 0)];

            while let Some((node, children, next)) = stack.last_mut() {
                if *next < children.len() {
                    let child = children[*next];
                    *next += 1;
                    match marks.get(&child) {
                        Some(Mark::Done) => {}
                        Some(Mark::InProgress) => {
                            debug!(node = %child, "cycle found during topological order");
                            return Err(GraphError::CycleDetected(child));
                        }
                        None => {
                            if !self.accepts(child) {
                                marks.insert(child, Mark::Done);
                                continue;
                            }
                            marks.insert(child, Mark::InProgress);
                            let grandchildren = self.children(child);
                            stack.push((child, grandchildren, 0));
                        }
                    }
                } else {
                    let done = *node;
                    stack.pop();
                    marks.insert(done, Mark::Done);
                    order.push(done);
                }
            }
        }

        debug!(nodes = order.len(), "built topological order");
        Ok(order)
    }
}
