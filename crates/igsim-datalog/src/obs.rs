//! Structured observability hooks for the datalog run lifecycle.
//!
//! This module provides:
//! - Run-scoped tracing spans via `RunSpan` RAII guard
//! - Emission functions for environment start, iteration finalization, run
//!   finish or failure, and sink failure
//!
//! These go to the tracing subscriber (stderr), never to the datalog sink.

use tracing::info;

use crate::record::OutputRecord;

/// RAII guard that enters a run-scoped tracing span for the duration of a run.
///
/// # Example
///
/// ```ignore
/// let _span = RunSpan::enter("seed-42");
/// // every event below is tagged run = "seed-42"
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    /// Create and enter a span tagged with the run label.
    pub fn enter(run: &str) -> Self {
        let span = tracing::info_span!("igsim.run", run = %run);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: a new environment became current.
pub fn emit_environment_started(environment_id: u64, iteration: u64) {
    info!(
        event = "environment.started",
        environment_id = environment_id,
        iteration = iteration,
    );
}

/// Emit event: one iteration finalized and written.
pub fn emit_iteration_finalized(record: &OutputRecord) {
    tracing::debug!(
        event = "iteration.finalized",
        iteration = record.iteration_index,
        environment_id = record.environment_id,
        classified = record.total_classified,
        bd_ratio = record.bd_ratio,
        avg_fitness = record.avg_fitness,
    );
}

/// Emit event: run finished.
pub fn emit_run_finished(events: u64, iterations: u64, success: bool) {
    info!(
        event = "run.finished",
        events = events,
        iterations = iterations,
        success = success,
    );
}

/// Emit event: run aborted on its first fatal error (warning level).
///
/// Carries no counts; the failing layer may have stopped mid-iteration.
pub fn emit_run_failed(error: &dyn std::fmt::Display) {
    tracing::warn!(event = "run.failed", success = false, error = %error);
}

/// Emit event: the output sink rejected a record (warning level).
pub fn emit_sink_failure(iteration: u64, error: &dyn std::fmt::Display) {
    tracing::warn!(event = "sink.failure", iteration = iteration, error = %error);
}
