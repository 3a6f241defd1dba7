use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use tracing::warn;

use arbor_graph::{break_cycles, GraphDocument, GraphView, MemoryGraph, TarjanScc, TopologicalOrder};
use arbor_select::StrategyKind;
use arbor_synth::{
    assign_ranks, rank_graph, SynthesisConfig, SynthesisEngine, SynthesisReport, SynthesizedTree,
};
use arbor_types::{EdgeKind, NodeId};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Synth(args) => cmd_synth(args, format),
        Command::Order(args) => cmd_order(args, format),
        Command::Cycles(args) => cmd_cycles(args, format),
        Command::Check(args) => cmd_check(args),
        Command::Rank(args) => cmd_rank(args, format),
        Command::Strategies => cmd_strategies(),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Read a graph document: JSON when the file ends in `.json`, bincode
/// otherwise.
fn load_graph(path: &Path) -> anyhow::Result<MemoryGraph> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let doc = if is_json {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        GraphDocument::from_json(&text)?
    } else {
        let bytes = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
        GraphDocument::from_bytes(&bytes)?
    };
    let graph = MemoryGraph::from_document(doc)
        .with_context(|| format!("invalid graph in {}", path.display()))?;
    Ok(graph)
}

/// Derive descendant sets, tolerating cycles when they will be broken.
fn prepare_graph(graph: &mut MemoryGraph, config: &SynthesisConfig) -> anyhow::Result<()> {
    match graph.fill_descendant_ids(&config.edge_kinds) {
        Ok(()) => Ok(()),
        Err(err) if config.break_cycles => {
            warn!(error = %err, "descendant sets left as stored");
            Ok(())
        }
        Err(err) => Err(err).context("cannot derive descendant sets"),
    }
}

/// The only node without parents of `kinds`.
fn find_root(graph: &MemoryGraph, kinds: &[EdgeKind]) -> anyhow::Result<NodeId> {
    let roots: Vec<NodeId> = graph
        .node_ids()
        .into_iter()
        .filter(|id| graph.parents_of(*id, kinds).is_empty())
        .collect();
    match roots.as_slice() {
        [root] => Ok(*root),
        [] => bail!("graph has no parentless node; pass --root"),
        many => bail!("graph has {} parentless nodes; pass --root", many.len()),
    }
}

fn print_report(report: &SynthesisReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => println!("{report}"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_synth(args: SynthArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => SynthesisConfig::load(path)?,
        None => SynthesisConfig::default(),
    };
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }
    config.break_cycles |= args.break_cycles;

    let mut graph = load_graph(&args.graph)?;
    prepare_graph(&mut graph, &config)?;
    if let Some(criterion) = &config.ranking {
        let ranks = rank_graph(&mut graph, criterion)?;
        println!("Ranked {} sources ({})", ranks.len(), criterion.description().dimmed());
    }
    let root = match args.root {
        Some(id) => NodeId(id),
        None => find_root(&graph, &config.edge_kinds)?,
    };

    let mut engine = SynthesisEngine::new(config);
    let mut tree = SynthesizedTree::new();
    if !args.subproblems.is_empty() {
        let roots: Vec<NodeId> = args.subproblems.iter().copied().map(NodeId).collect();
        let runs = engine.synthesize_subproblems(&graph, &roots, &mut tree)?;
        for run in &runs {
            println!(
                "  {} subproblem {} ({} nodes)",
                "✓".green(),
                run.root().to_string().yellow(),
                run.report.nodes_visited
            );
        }
    }
    let run = engine.synthesize(&graph, root, &mut tree)?;

    println!(
        "{} Synthesized {} edges below {}",
        "✓".green().bold(),
        tree.edge_count().to_string().bold(),
        root.to_string().yellow()
    );
    print_report(&run.report, format)?;

    if let Some(path) = &args.output {
        std::fs::write(path, tree.to_json()?)
            .with_context(|| format!("cannot write {}", path.display()))?;
        println!("  Tree: {}", path.display().to_string().cyan());
    }
    Ok(())
}

fn cmd_order(args: OrderArgs, format: OutputFormat) -> anyhow::Result<()> {
    let graph = load_graph(&args.graph)?;
    let root = NodeId(args.root);
    if !graph.contains_node(root) {
        bail!("root node {root} is not in the graph");
    }
    let order = TopologicalOrder::from_root(&graph, root, &EdgeKind::ALL).build()?;
    match format {
        OutputFormat::Json => {
            let ids: Vec<u64> = order.iter().map(|n| n.get()).collect();
            println!("{}", serde_json::to_string(&ids)?);
        }
        OutputFormat::Text => {
            println!("{} nodes, leaves first:", order.len().to_string().bold());
            for node in &order {
                println!("  {node}");
            }
        }
    }
    Ok(())
}

fn cmd_cycles(args: CyclesArgs, format: OutputFormat) -> anyhow::Result<()> {
    let graph = load_graph(&args.graph)?;
    let scc = TarjanScc::compute(&graph, &EdgeKind::ALL, &BTreeSet::new());
    let cycles: Vec<Vec<u64>> = scc
        .cycles()
        .map(|c| c.iter().map(|n| n.get()).collect())
        .collect();

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string(&cycles)?);
        return Ok(());
    }
    if cycles.is_empty() {
        println!("{} No cycles.", "✓".green().bold());
        return Ok(());
    }
    for (i, cycle) in cycles.iter().enumerate() {
        let members: Vec<String> = cycle.iter().map(ToString::to_string).collect();
        println!("{} cycle {}: {}", "✗".red().bold(), i + 1, members.join(" "));
    }
    let excluded = break_cycles(&graph, &EdgeKind::ALL);
    let ids: Vec<String> = excluded.iter().map(ToString::to_string).collect();
    println!("  --break-cycles would exclude edges: {}", ids.join(" ").yellow());
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let graph = load_graph(&args.graph)?;
    let text = std::fs::read_to_string(&args.tree)
        .with_context(|| format!("cannot read {}", args.tree.display()))?;
    let tree = SynthesizedTree::from_json(&text)?;

    let defects = tree.verify(&graph, NodeId(args.root));
    if defects.is_empty() {
        println!("{} Tree is a single hierarchy", "✓".green().bold());
        println!("  Edges: {}", tree.edge_count());
        return Ok(());
    }
    for defect in &defects {
        println!("  {} {}", "✗".red(), defect);
    }
    bail!("{} defects found", defects.len())
}

fn cmd_rank(args: RankArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = SynthesisConfig::load(&args.config)?;
    let Some(criterion) = &config.ranking else {
        bail!("{} has no [ranking] section", args.config.display());
    };
    let graph = load_graph(&args.graph)?;
    let ranks = assign_ranks(graph.sources(), criterion)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&ranks)?);
        return Ok(());
    }
    println!("{}", criterion.description().dimmed());
    let mut ordered: Vec<(&String, &u32)> = ranks.iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(a.1));
    for (name, rank) in ordered {
        println!("  {:>4}  {}", rank.to_string().bold(), name);
    }
    Ok(())
}

fn cmd_strategies() -> anyhow::Result<()> {
    let config = SynthesisConfig::default();
    for kind in StrategyKind::ALL {
        let strategy = kind.build(&config.mwis, config.max_product_size);
        let marker = if kind == config.strategy { "*" } else { " " };
        println!("{} {}", marker.green(), kind.as_str().bold());
        println!("    {}", strategy.description());
    }
    Ok(())
}
