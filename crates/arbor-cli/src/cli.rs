use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use arbor_select::StrategyKind;

#[derive(Parser)]
#[command(
    name = "arbor",
    about = "Arbor: ranked synthesis of conflicting hierarchies",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log decisions at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Synthesize a single hierarchy from a candidate graph
    Synth(SynthArgs),
    /// Print the leaf-to-root order synthesis would visit
    Order(OrderArgs),
    /// List the cycles of a candidate graph
    Cycles(CyclesArgs),
    /// Verify a synthesized tree against its candidate graph
    Check(CheckArgs),
    /// Show the ranks assigned to sources by a configuration
    Rank(RankArgs),
    /// List the available selection strategies
    Strategies,
}

#[derive(Args)]
pub struct SynthArgs {
    /// Candidate graph (.json, or a bincode snapshot)
    #[arg(short, long)]
    pub graph: PathBuf,
    /// Root node; defaults to the graph's only parentless node
    #[arg(short, long)]
    pub root: Option<u64>,
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Override the configured strategy
    #[arg(short, long)]
    pub strategy: Option<StrategyKind>,
    /// Exclude the least trusted edges of every cycle instead of failing
    #[arg(long)]
    pub break_cycles: bool,
    /// Subproblem roots to synthesize first, comma separated
    #[arg(long, value_delimiter = ',')]
    pub subproblems: Vec<u64>,
    /// Write the synthesized tree as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct OrderArgs {
    #[arg(short, long)]
    pub graph: PathBuf,
    #[arg(short, long)]
    pub root: u64,
}

#[derive(Args)]
pub struct CyclesArgs {
    #[arg(short, long)]
    pub graph: PathBuf,
}

#[derive(Args)]
pub struct CheckArgs {
    #[arg(short, long)]
    pub graph: PathBuf,
    /// Synthesized tree written by `arbor synth --output`
    #[arg(short, long)]
    pub tree: PathBuf,
    #[arg(short, long)]
    pub root: u64,
}

#[derive(Args)]
pub struct RankArgs {
    #[arg(short, long)]
    pub graph: PathBuf,
    /// Configuration holding a [ranking] section
    #[arg(short, long)]
    pub config: PathBuf,
}
