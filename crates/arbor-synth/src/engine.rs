//! The synthesis driver.
//!
//! [`SynthesisEngine`] walks the candidate graph from the leaves up to a
//! root and asks its [`NodeSelectionStrategy`] to decide every node once all
//! of the node's children are decided. Decisions stream into a
//! [`SelectionSink`] as they are made.
//!
//! # Invariants
//!
//! - The traversal order is computed in full before the first decision, so a
//!   cyclic graph fails without anything being recorded.
//! - A node whose finished record is already held (seeded with
//!   [`SynthesisEngine::preserve`] or left by an earlier run) is neither
//!   revisited nor descended into; its record is reused.
//! - Every iteration order is deterministic, so re-running an unchanged
//!   graph records the same edges.

use std::collections::BTreeSet;
use std::time::Instant;

use tracing::{debug, info, trace};

use arbor_graph::{break_cycles, GraphView, TopologicalOrder};
use arbor_select::{NodeInput, NodeSelectionStrategy, SelectError, SubtreeInfo, SubtreeTable};
use arbor_types::{CandidateEdge, EdgeId, NodeId};

use crate::config::SynthesisConfig;
use crate::error::{SynthError, SynthResult};
use crate::report::SynthesisReport;
use crate::sink::SelectionSink;

// ---------------------------------------------------------------------------
// SynthesisRun
// ---------------------------------------------------------------------------

/// The outcome of synthesizing below one root.
#[derive(Clone, Debug)]
pub struct SynthesisRun {
    /// Completed provenance of the root's synthesized subtree.
    pub root_info: SubtreeInfo,
    pub report: SynthesisReport,
}

impl SynthesisRun {
    pub fn root(&self) -> NodeId {
        self.root_info.root()
    }
}

// ---------------------------------------------------------------------------
// SynthesisEngine
// ---------------------------------------------------------------------------

/// Drives leaf-to-root synthesis with a pluggable selection strategy.
///
/// Finished subtree records persist across calls, which is what lets
/// [`Self::synthesize_subproblems`] build a large hierarchy from smaller
/// runs.
pub struct SynthesisEngine {
    config: SynthesisConfig,
    strategy: Box<dyn NodeSelectionStrategy>,
    table: SubtreeTable,
}

impl SynthesisEngine {
    /// Create an engine running the strategy named in `config`.
    pub fn new(config: SynthesisConfig) -> Self {
        let strategy = config.build_strategy();
        Self {
            config,
            strategy,
            table: SubtreeTable::new(),
        }
    }

    /// Replace the configured strategy with a custom one.
    pub fn with_strategy(mut self, strategy: Box<dyn NodeSelectionStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    pub fn strategy(&self) -> &dyn NodeSelectionStrategy {
        self.strategy.as_ref()
    }

    /// The finished record of `node`, if one is still held.
    pub fn subtree(&self, node: NodeId) -> Option<&SubtreeInfo> {
        self.table.get(node)
    }

    /// Seed a completed subtree from an earlier run. The subtree's root will
    /// be treated as already decided.
    pub fn preserve(&mut self, info: SubtreeInfo) -> SynthResult<()> {
        self.table.preserve(info)?;
        Ok(())
    }

    /// Edges to leave out of the traversal.
    fn excluded_edges(&self, graph: &dyn GraphView) -> BTreeSet<EdgeId> {
        if self.config.break_cycles {
            break_cycles(graph, &self.config.edge_kinds)
        } else {
            BTreeSet::new()
        }
    }

    /// Decide every node below `root`, leaves first, and record each
    /// decision in `sink`.
    pub fn synthesize(
        &mut self,
        graph: &dyn GraphView,
        root: NodeId,
        sink: &mut dyn SelectionSink,
    ) -> SynthResult<SynthesisRun> {
        let start = Instant::now();
        if !graph.contains_node(root) {
            return Err(SynthError::RootNotFound(root));
        }

        let kinds = self.config.edge_kinds.clone();
        let excluded = self.excluded_edges(graph);
        let order = {
            let table = &self.table;
            TopologicalOrder::from_root(graph, root, &kinds)
                .excluding(&excluded)
                .validate_with(move |node| table.get(node).is_none())
                .build()?
        };
        debug!(
            root = %root,
            nodes = order.len(),
            excluded = excluded.len(),
            "computed traversal order"
        );

        let evicted_before = self.table.evicted();
        let mut edges_considered = 0;
        let mut edges_selected = 0;
        let mut root_info = None;

        for node in &order {
            let selection = {
                let input = NodeInput::new(*node, graph, &self.table, &kinds, &excluded);
                edges_considered += input.incoming.len();
                self.strategy.select(&input)?
            };
            let chosen: Vec<&CandidateEdge> = selection
                .edges
                .iter()
                .filter_map(|id| graph.edge(*id))
                .collect();
            sink.record_selected_edges(*node, &chosen)?;
            edges_selected += chosen.len();
            trace!(node = %node, selected = chosen.len(), "decided node");

            if *node == root {
                root_info = Some(selection.info.clone());
            }
            self.table.finish(selection.info, graph, &kinds)?;
        }

        let root_info = root_info.ok_or(SelectError::MissingSubtree(root))?;
        let report = SynthesisReport {
            strategy: self.strategy.name().to_string(),
            description: self.strategy.description(),
            root,
            nodes_visited: order.len(),
            edges_considered,
            edges_selected,
            edges_excluded: excluded.len(),
            tips: root_info.tip_ids().len(),
            peak_subtrees: self.table.peak_len(),
            evicted_subtrees: self.table.evicted() - evicted_before,
            elapsed: start.elapsed(),
        };
        info!(
            root = %root,
            strategy = %report.strategy,
            nodes = report.nodes_visited,
            selected = report.edges_selected,
            tips = report.tips,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "synthesis finished"
        );
        Ok(SynthesisRun { root_info, report })
    }

    /// Synthesize a set of subproblem roots, deepest first.
    ///
    /// Each run reuses the finished records of the subproblems below it
    /// instead of deciding their nodes again. Returns one run per root, in
    /// the order they were run.
    pub fn synthesize_subproblems(
        &mut self,
        graph: &dyn GraphView,
        roots: &[NodeId],
        sink: &mut dyn SelectionSink,
    ) -> SynthResult<Vec<SynthesisRun>> {
        if let Some(missing) = roots.iter().find(|r| !graph.contains_node(**r)) {
            return Err(SynthError::RootNotFound(*missing));
        }
        let wanted: BTreeSet<NodeId> = roots.iter().copied().collect();
        let excluded = self.excluded_edges(graph);
        let ordered: Vec<NodeId> = TopologicalOrder::whole_graph(graph, &self.config.edge_kinds)
            .excluding(&excluded)
            .build()?
            .into_iter()
            .filter(|node| wanted.contains(node))
            .collect();
        info!(subproblems = ordered.len(), "running subproblems");

        let mut runs = Vec::with_capacity(ordered.len());
        for root in ordered {
            let run = self.synthesize(graph, root, sink)?;
            debug!(
                root = %root,
                nodes = run.report.nodes_visited,
                "subproblem finished"
            );
            runs.push(run);
        }
        Ok(runs)
    }
}
