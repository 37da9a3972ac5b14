//! igsim Datalog
//!
//! Turns the simulator's metric event stream into one finalized CSV record per
//! iteration:
//! - Metric / Event: closed set of event kinds with typed payloads
//! - IterationAggregator: accumulates fitness deltas and mutation
//!   classifications, finalizes on `IterationComplete`
//! - RecordEmitter: writes one line per iteration to an append-only sink
//! - VerboseLogger: diagnostic listener that prints every event
//! - ListenerChain: ordered fan-out of events to several listeners
//! - replay / summary: recorded event logs in, per-environment rollups out
//! - analysis: per-run statistics and environment edge rows across datalogs
//!
//! The engine itself (genomes, mutation, environments, fitness) is external
//! and reached only through the [`Simulation`] trait.

pub mod aggregator;
pub mod analysis;
pub mod engine;
pub mod datalog;
pub mod error;
pub mod event;
pub mod finalize;
pub mod header;
pub mod listener;
pub mod metric;
pub mod obs;
pub mod record;
pub mod replay;
pub mod state;
pub mod summary;
pub mod telemetry;
pub mod verbose;

pub use aggregator::IterationAggregator;
pub use analysis::{
    env_edges, run_stats, write_env_edges_csv, write_run_stats_csv, EdgeTag, EnvEdge, RunStats,
};
pub use datalog::{read_datalog, Datalog, DatalogRow};
pub use engine::{Environment, EnvironmentId, Organism, Simulation};
pub use error::{DatalogError, Result};
pub use event::{Event, Payload};
pub use finalize::{
    average_fitness, bd_ratio, mean_or_nan, summarize, EMPTY_BD_RATIO, UNBOUNDED_BD_RATIO,
};
pub use header::{RunHeader, COLUMNS};
pub use listener::{Listener, ListenerChain, ListenerMode};
pub use metric::Metric;
pub use obs::{
    emit_environment_started, emit_iteration_finalized, emit_run_failed, emit_run_finished,
    emit_sink_failure, RunSpan,
};
pub use record::{OutputRecord, RecordEmitter};
pub use replay::{replay_log, LogEntry, RecordedOrganism, ReplaySimulation, ReplaySummary};
pub use state::AggregatorState;
pub use summary::{read_summaries, summarize_rows, write_summary_csv, EnvironmentSummary};
pub use telemetry::init_tracing;
pub use verbose::VerboseLogger;

/// igsim datalog version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
