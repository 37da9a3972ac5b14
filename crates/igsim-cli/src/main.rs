//! igsim - datalog tooling for the implicit genome simulator
//!
//! ## Commands
//!
//! - `replay`: Feed a recorded event log through the datalog listeners
//! - `summary`: Roll a datalog CSV up into one row per environment
//! - `stats`: Per-run statistics and environment edge rows across datalogs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use igsim_datalog::{
    emit_run_failed, emit_run_finished, env_edges, init_tracing, read_datalog, read_summaries,
    replay_log, run_stats, write_env_edges_csv, write_run_stats_csv, write_summary_csv, EnvEdge,
    EnvironmentId, IterationAggregator, ListenerChain, ListenerMode, ReplaySimulation,
    ReplaySummary, RunSpan, RunStats, VerboseLogger,
};

#[derive(Parser)]
#[command(name = "igsim")]
#[command(version = igsim_datalog::VERSION)]
#[command(about = "Implicit genome simulator datalog tools", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded event log and write the per-iteration datalog
    Replay {
        /// Event log (JSON lines), or `-` for stdin
        #[arg(short, long, default_value = "-")]
        events: String,

        /// Datalog output path (default: stdout)
        #[arg(short, long, env = "IGSIM_OUTPUT")]
        output: Option<PathBuf>,

        /// Listeners to install
        #[arg(short, long, value_enum, env = "IGSIM_MODE", default_value_t = ListenerMode::Aggregate)]
        mode: ListenerMode,
    },

    /// Summarize a datalog CSV per environment
    Summary {
        /// Datalog CSV produced by `replay` or the simulator
        input: PathBuf,

        /// Summary CSV output path
        output: PathBuf,
    },

    /// Compute per-run statistics and environment edge rows for datalog files
    Stats {
        /// Datalog CSVs, one per run
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Per-run statistics output path
        #[arg(short, long, default_value = "summary.csv")]
        output: PathBuf,

        /// Environment edge rows output path
        #[arg(short, long, default_value = "env_edges.csv")]
        edges: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    match cli.command {
        Commands::Replay {
            events,
            output,
            mode,
        } => {
            let summary = cmd_replay(&events, output.as_deref(), mode)?;
            info!(
                lines = summary.lines,
                events = summary.events,
                iterations = summary.iterations,
                "replay complete"
            );
            Ok(())
        }
        Commands::Summary { input, output } => cmd_summary(&input, &output),
        Commands::Stats {
            inputs,
            output,
            edges,
        } => cmd_stats(&inputs, &output, &edges),
    }
}

fn open_events(events: &str) -> Result<Box<dyn BufRead>> {
    if events == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(events).with_context(|| format!("Failed to open event log: {events}"))?;
    Ok(Box::new(BufReader::new(file)))
}

fn open_output(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create datalog output: {:?}", path))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

fn cmd_replay(events: &str, output: Option<&Path>, mode: ListenerMode) -> Result<ReplaySummary> {
    let _span = RunSpan::enter(events);
    let reader = open_events(events)?;

    let mut chain: ListenerChain<'_, ReplaySimulation> = ListenerChain::new();
    if mode.aggregates() {
        chain.push(IterationAggregator::<EnvironmentId, _>::new(open_output(output)?));
    }
    if mode.logs_verbose() {
        chain.push(VerboseLogger::new(io::stderr()));
    }

    match replay_log(reader, &mut chain) {
        Ok(summary) => {
            emit_run_finished(summary.events, summary.iterations, true);
            Ok(summary)
        }
        Err(e) => {
            emit_run_failed(&e);
            Err(e).with_context(|| format!("Replay failed for event log: {events}"))
        }
    }
}

fn cmd_summary(input: &Path, output: &Path) -> Result<()> {
    let file = File::open(input).with_context(|| format!("Failed to open datalog: {:?}", input))?;
    let summaries = read_summaries(BufReader::new(file))
        .with_context(|| format!("Failed to read datalog: {:?}", input))?;

    let out = File::create(output)
        .with_context(|| format!("Failed to create summary output: {:?}", output))?;
    write_summary_csv(BufWriter::new(out), &summaries)
        .with_context(|| format!("Failed to write summary: {:?}", output))?;

    println!(
        "Summarized {} environment(s) into {}",
        summaries.len(),
        output.display()
    );
    Ok(())
}

fn cmd_stats(inputs: &[PathBuf], output: &Path, edges_output: &Path) -> Result<()> {
    let mut stats: Vec<RunStats> = Vec::with_capacity(inputs.len());
    let mut edges: Vec<(String, EnvEdge)> = Vec::new();

    for input in inputs {
        let file =
            File::open(input).with_context(|| format!("Failed to open datalog: {:?}", input))?;
        let datalog = read_datalog(BufReader::new(file))
            .with_context(|| format!("Failed to read datalog: {:?}", input))?;
        let name = input
            .file_name()
            .map_or_else(|| input.display().to_string(), |n| n.to_string_lossy().into_owned());

        edges.extend(env_edges(&datalog).into_iter().map(|e| (name.clone(), e)));
        stats.push(run_stats(name, &datalog));
    }

    let out = File::create(output)
        .with_context(|| format!("Failed to create statistics output: {:?}", output))?;
    write_run_stats_csv(BufWriter::new(out), &stats)
        .with_context(|| format!("Failed to write statistics: {:?}", output))?;

    let out = File::create(edges_output)
        .with_context(|| format!("Failed to create edges output: {:?}", edges_output))?;
    write_env_edges_csv(
        BufWriter::new(out),
        edges.iter().map(|(name, e)| (name.as_str(), e)),
    )
    .with_context(|| format!("Failed to write edges: {:?}", edges_output))?;

    info!(runs = stats.len(), edges = edges.len(), "statistics written");
    println!(
        "Wrote {} run(s) to {} and {} edge row(s) to {}",
        stats.len(),
        output.display(),
        edges.len(),
        edges_output.display()
    );
    Ok(())
}
