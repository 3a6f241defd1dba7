//! Graph builder shared by the unit tests of this crate.

use std::collections::{BTreeMap, BTreeSet};

use arbor_graph::{GraphView, MemoryGraph, NodeRecord, TopologicalOrder};
use arbor_types::{CandidateEdge, EdgeId, EdgeKind, IdSet, NodeId, Rank, SourceEdgeId};

use crate::error::SelectResult;
use crate::provenance::{SubtreeInfo, SubtreeTable};
use crate::strategy::{NodeInput, NodeSelection, NodeSelectionStrategy};

pub(crate) struct Fixture {
    pub graph: MemoryGraph,
    pub table: SubtreeTable,
    next_edge: u64,
    excluded: BTreeSet<EdgeId>,
}

impl Fixture {
    pub fn new(nodes: &[u64]) -> Self {
        let mut graph = MemoryGraph::new();
        for id in nodes {
            graph.add_node(NodeRecord::new(NodeId(*id))).unwrap();
        }
        Self {
            graph,
            table: SubtreeTable::new(),
            next_edge: 1,
            excluded: BTreeSet::new(),
        }
    }

    fn push(&mut self, edge: CandidateEdge) -> EdgeId {
        let id = edge.id;
        self.graph.add_edge(edge).unwrap();
        self.next_edge += 1;
        id
    }

    fn next_id(&self) -> EdgeId {
        EdgeId(self.next_edge)
    }

    pub fn stree(&mut self, child: u64, parent: u64, rank: Rank, seid: u64) -> EdgeId {
        let edge = CandidateEdge::source_tree(
            self.next_id(),
            NodeId(child),
            NodeId(parent),
            rank,
            SourceEdgeId(seid),
        );
        self.push(edge)
    }

    /// A source-tree tip edge whose exclusive leaves are `exclusive`.
    pub fn tip(&mut self, child: u64, parent: u64, rank: Rank, seid: u64, exclusive: &[u64]) -> EdgeId {
        let edge = CandidateEdge::source_tree(
            self.next_id(),
            NodeId(child),
            NodeId(parent),
            rank,
            SourceEdgeId(seid),
        )
        .tip()
        .with_exclusive(exclusive.iter().copied().collect::<IdSet>());
        self.push(edge)
    }

    pub fn tax(&mut self, child: u64, parent: u64) -> EdgeId {
        let edge = CandidateEdge::taxonomy(self.next_id(), NodeId(child), NodeId(parent));
        self.push(edge)
    }

    /// Leave `edge` out of every later input, as cycle breaking would.
    pub fn exclude(&mut self, edge: EdgeId) {
        self.excluded.insert(edge);
    }

    fn refresh(&mut self) {
        self.graph.fill_descendant_ids(&EdgeKind::ALL).unwrap();
    }

    /// Record finished leaf subtrees for `ids`.
    pub fn finish_leaves(&mut self, ids: &[u64]) {
        self.refresh();
        for id in ids {
            let mut info = SubtreeInfo::new(NodeId(*id));
            info.complete();
            self.table.preserve(info).unwrap();
        }
    }

    pub fn input(&self, node: NodeId) -> NodeInput<'_> {
        NodeInput::new(node, &self.graph, &self.table, &EdgeKind::ALL, &self.excluded)
    }

    /// Decide one node and store its record.
    pub fn decide_with(
        &mut self,
        node: NodeId,
        strategy: &dyn NodeSelectionStrategy,
    ) -> SelectResult<NodeSelection> {
        self.refresh();
        let selection = strategy.select(&self.input(node))?;
        self.table
            .finish(selection.info.clone(), &self.graph, &EdgeKind::ALL)?;
        Ok(selection)
    }

    /// Decide every node below `root`, leaves first.
    pub fn run(
        &mut self,
        root: u64,
        strategy: &dyn NodeSelectionStrategy,
    ) -> SelectResult<BTreeMap<NodeId, NodeSelection>> {
        self.refresh();
        let order = TopologicalOrder::from_root(&self.graph, NodeId(root), &EdgeKind::ALL)
            .build()
            .unwrap();
        let mut out = BTreeMap::new();
        for node in order {
            out.insert(node, self.decide_with(node, strategy)?);
        }
        Ok(out)
    }

    /// Child nodes of the chosen edges.
    pub fn children(&self, selection: &NodeSelection) -> Vec<u64> {
        let mut ids: Vec<u64> = selection
            .edges
            .iter()
            .filter_map(|e| self.graph.edge(*e))
            .map(|e| e.child.get())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}
