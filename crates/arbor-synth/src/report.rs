//! Run statistics.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use arbor_types::NodeId;

/// What one synthesis run did.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SynthesisReport {
    /// Short name of the selection strategy.
    pub strategy: String,
    /// The strategy's own explanation of how it decides.
    pub description: String,
    pub root: NodeId,
    /// Nodes decided, including the root.
    pub nodes_visited: usize,
    /// Incoming edges offered to the strategy across all nodes.
    pub edges_considered: usize,
    pub edges_selected: usize,
    /// Edges left out to break cycles.
    pub edges_excluded: usize,
    /// Synthesized leaves below the root.
    pub tips: u64,
    /// Largest number of finished subtree records held at once.
    pub peak_subtrees: usize,
    /// Subtree records dropped during this run.
    pub evicted_subtrees: usize,
    pub elapsed: Duration,
}

impl SynthesisReport {
    /// Fraction of considered edges that were kept.
    pub fn selection_ratio(&self) -> f64 {
        if self.edges_considered == 0 {
            0.0
        } else {
            self.edges_selected as f64 / self.edges_considered as f64
        }
    }
}

impl fmt::Display for SynthesisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "strategy:   {}", self.strategy)?;
        writeln!(f, "            {}", self.description)?;
        writeln!(f, "root:       {}", self.root)?;
        writeln!(f, "nodes:      {}", self.nodes_visited)?;
        writeln!(
            f,
            "edges:      {} selected of {} considered ({:.1}%)",
            self.edges_selected,
            self.edges_considered,
            self.selection_ratio() * 100.0
        )?;
        if self.edges_excluded > 0 {
            writeln!(f, "excluded:   {} (cycle breaking)", self.edges_excluded)?;
        }
        writeln!(f, "tips:       {}", self.tips)?;
        writeln!(
            f,
            "subtrees:   peak {}, evicted {}",
            self.peak_subtrees, self.evicted_subtrees
        )?;
        write!(f, "elapsed:    {:.3?}", self.elapsed)
    }
}
