//! In-memory candidate graph.
//!
//! [`MemoryGraph`] keeps nodes and edges in ordered maps and maintains
//! per-node incoming and outgoing edge indexes sorted by edge id.
//!
//! # Invariants
//!
//! - Node and edge ids are unique.
//! - Every edge endpoint resolves to an existing node.
//! - Index lists are sorted ascending and contain no duplicates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use arbor_types::{CandidateEdge, EdgeId, EdgeKind, IdSet, NodeId, Rank};

use crate::document::{GraphDocument, SourceRecord};
use crate::error::{GraphError, GraphResult};
use crate::order::TopologicalOrder;
use crate::view::GraphView;

/// A vertex of the candidate graph together with its persisted data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    /// Human-readable label (taxon name, OTU label).
    #[serde(default)]
    pub name: Option<String>,
    /// Leaf ids subtended by this node.
    #[serde(default)]
    pub descendant_ids: IdSet,
}

impl NodeRecord {
    /// A node with no name and no descendant data yet.
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            name: None,
            descendant_ids: IdSet::new(),
        }
    }

    pub fn named(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(id)
        }
    }
}

/// The in-memory candidate graph.
#[derive(Clone, Debug, Default)]
pub struct MemoryGraph {
    nodes: BTreeMap<NodeId, NodeRecord>,
    edges: BTreeMap<EdgeId, CandidateEdge>,
    /// parent -> edges from its children.
    incoming: BTreeMap<NodeId, Vec<EdgeId>>,
    /// child -> edges to its parents.
    outgoing: BTreeMap<NodeId, Vec<EdgeId>>,
    sources: Vec<SourceRecord>,
}

impl MemoryGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Add a node. Fails if the id already exists.
    pub fn add_node(&mut self, node: NodeRecord) -> GraphResult<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.nodes.insert(node.id, node);
        Ok(())
    }

    /// Add an edge. Both endpoints must already exist.
    pub fn add_edge(&mut self, edge: CandidateEdge) -> GraphResult<()> {
        if self.edges.contains_key(&edge.id) {
            return Err(GraphError::DuplicateEdge(edge.id));
        }
        for endpoint in [edge.child, edge.parent] {
            if !self.nodes.contains_key(&endpoint) {
                return Err(GraphError::DanglingEdge {
                    edge: edge.id,
                    node: endpoint,
                });
            }
        }

        insert_sorted(self.incoming.entry(edge.parent).or_default(), edge.id);
        insert_sorted(self.outgoing.entry(edge.child).or_default(), edge.id);

        debug!(
            edge = %edge.id,
            child = %edge.child,
            parent = %edge.parent,
            kind = %edge.kind,
            rank = edge.rank,
            "added candidate edge"
        );
        self.edges.insert(edge.id, edge);
        Ok(())
    }

    /// Register source metadata used for rank assignment.
    pub fn add_source(&mut self, source: SourceRecord) {
        self.sources.push(source);
    }

    pub fn sources(&self) -> &[SourceRecord] {
        &self.sources
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(&id)
    }

    /// All edges in ascending id order.
    pub fn edges(&self) -> impl Iterator<Item = &CandidateEdge> {
        self.edges.values()
    }

    /// Replace a node's descendant set.
    pub fn set_descendant_ids(&mut self, id: NodeId, ids: IdSet) -> GraphResult<()> {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))?;
        node.descendant_ids = ids;
        Ok(())
    }

    /// Derive missing descendant sets from the graph structure.
    ///
    /// Leaves (nodes without incoming edges of `kinds`) subtend their own
    /// id; every other node with an empty set gets the union of its
    /// children's sets. Nodes that already carry a set keep it. Fails on
    /// cycles.
    pub fn fill_descendant_ids(&mut self, kinds: &[EdgeKind]) -> GraphResult<()> {
        let order = TopologicalOrder::whole_graph(&*self, kinds).build()?;
        let mut filled = 0usize;
        for id in order {
            let has_set = self
                .nodes
                .get(&id)
                .is_some_and(|n| !n.descendant_ids.is_empty());
            if has_set {
                continue;
            }
            let children = self.children_of(id, kinds);
            let computed = if children.is_empty() {
                IdSet::singleton(id.get())
            } else {
                let mut union = IdSet::new();
                for edge in children {
                    if let Some(ids) = self.descendant_ids(edge.child) {
                        union.union_with(ids);
                    }
                }
                union
            };
            self.set_descendant_ids(id, computed)?;
            filled += 1;
        }
        debug!(filled, "filled descendant sets");
        Ok(())
    }

    /// Rewrite the rank of every source-tree edge whose source appears in
    /// `ranks`. Returns the number of edges updated.
    pub fn apply_ranks(&mut self, ranks: &BTreeMap<String, Rank>) -> usize {
        let mut updated = 0;
        for edge in self.edges.values_mut() {
            if edge.kind != EdgeKind::SourceTree {
                continue;
            }
            if let Some(rank) = edge.source.as_ref().and_then(|s| ranks.get(s)) {
                edge.rank = *rank;
                updated += 1;
            }
        }
        debug!(updated, "applied source ranks");
        updated
    }

    // ---------------------------------------------------------------
    // Documents
    // ---------------------------------------------------------------

    /// Build a graph from a document, validating every reference.
    pub fn from_document(doc: GraphDocument) -> GraphResult<Self> {
        let mut graph = Self::new();
        for node in doc.nodes {
            graph.add_node(node)?;
        }
        for edge in doc.edges {
            graph.add_edge(edge)?;
        }
        graph.sources = doc.sources;
        Ok(graph)
    }

    /// Snapshot the graph as a document.
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
            sources: self.sources.clone(),
        }
    }

    fn resolve(&self, ids: Option<&Vec<EdgeId>>, kinds: &[EdgeKind]) -> Vec<&CandidateEdge> {
        ids.map(|ids| {
            ids.iter()
                .filter_map(|id| self.edges.get(id))
                .filter(|e| kinds.contains(&e.kind))
                .collect()
        })
        .unwrap_or_default()
    }
}

impl GraphView for MemoryGraph {
    fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    fn edge(&self, id: EdgeId) -> Option<&CandidateEdge> {
        self.edges.get(&id)
    }

    fn children_of(&self, node: NodeId, kinds: &[EdgeKind]) -> Vec<&CandidateEdge> {
        self.resolve(self.incoming.get(&node), kinds)
    }

    fn parents_of(&self, node: NodeId, kinds: &[EdgeKind]) -> Vec<&CandidateEdge> {
        self.resolve(self.outgoing.get(&node), kinds)
    }

    fn descendant_ids(&self, node: NodeId) -> Option<&IdSet> {
        self.nodes.get(&node).map(|n| &n.descendant_ids)
    }
}

fn insert_sorted(list: &mut Vec<EdgeId>, id: EdgeId) {
    if let Err(pos) = list.binary_search(&id) {
        list.insert(pos, id);
    }
}
