//! Ranked hierarchy synthesis for Arbor.
//!
//! Given a candidate graph in which many ranked source hierarchies propose
//! conflicting parent relations, synthesis picks for every node the set of
//! incoming edges to keep, from the leaves up to a root, so that the kept
//! edges form a single hierarchy that follows the highest-ranked sources
//! wherever they agree.
//!
//! # Quick Start
//!
//! ```rust
//! use arbor_graph::{MemoryGraph, NodeRecord};
//! use arbor_synth::{SynthesisConfig, SynthesisEngine, SynthesizedTree};
//! use arbor_types::{CandidateEdge, EdgeId, EdgeKind, NodeId, SourceEdgeId};
//!
//! let mut graph = MemoryGraph::new();
//! for id in [1, 2, 3] {
//!     graph.add_node(NodeRecord::new(NodeId(id))).unwrap();
//! }
//! for (id, child) in [(1, 1), (2, 2)] {
//!     let edge = CandidateEdge::source_tree(EdgeId(id), NodeId(child), NodeId(3), 1, SourceEdgeId(id));
//!     graph.add_edge(edge).unwrap();
//! }
//! graph.fill_descendant_ids(&EdgeKind::ALL).unwrap();
//!
//! let mut engine = SynthesisEngine::new(SynthesisConfig::default());
//! let mut tree = SynthesizedTree::new();
//! let run = engine.synthesize(&graph, NodeId(3), &mut tree).unwrap();
//! assert_eq!(tree.children_of(NodeId(3)), vec![NodeId(1), NodeId(2)]);
//! assert_eq!(run.report.tips, 2);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod ranking;
pub mod report;
pub mod sink;

pub use config::SynthesisConfig;
pub use engine::{SynthesisEngine, SynthesisRun};
pub use error::{
    ConfigError, ConfigResult, RankingError, RankingResult, SynthError, SynthResult,
};
pub use ranking::{assign_ranks, rank_graph, RankingCriterion, SortOrder};
pub use report::SynthesisReport;
pub use sink::{SelectionSink, SynthesizedTree, TreeDefect, TreeLink};
