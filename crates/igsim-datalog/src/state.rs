//! Run-scoped accumulator for the iteration in progress.

use tracing::trace;

use crate::error::{DatalogError, Result};

/// Counters for the current iteration plus the current environment.
///
/// Owned by one aggregator for the lifetime of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorState<E> {
    /// 1-based index of the iteration being accumulated.
    pub iteration_index: u64,
    pub beneficial_count: u64,
    pub deleterious_count: u64,
    /// Sum of strictly positive fitness deltas.
    pub pos_delta_sum: f64,
    /// Sum of strictly negative fitness deltas.
    pub neg_delta_sum: f64,
    pub current_environment: Option<E>,
}

impl<E> Default for AggregatorState<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> AggregatorState<E> {
    pub fn new() -> Self {
        Self {
            iteration_index: 1,
            beneficial_count: 0,
            deleterious_count: 0,
            pos_delta_sum: 0.0,
            neg_delta_sum: 0.0,
            current_environment: None,
        }
    }

    pub fn set_environment(&mut self, environment: E) {
        self.current_environment = Some(environment);
    }

    /// Add a fitness delta to the matching signed sum. Zero (and NaN) is ignored.
    pub fn record_fitness_delta(&mut self, delta: f64) {
        if delta > 0.0 {
            self.pos_delta_sum += delta;
        } else if delta < 0.0 {
            self.neg_delta_sum += delta;
        }
        trace!(delta, "fitness delta recorded");
    }

    pub fn record_classification(&mut self, beneficial: bool) {
        if beneficial {
            self.beneficial_count += 1;
        } else {
            self.deleterious_count += 1;
        }
    }

    /// Mutations classified so far this iteration.
    pub fn classified_total(&self) -> u64 {
        self.beneficial_count + self.deleterious_count
    }

    pub fn require_environment(&self) -> Result<&E> {
        self.current_environment
            .as_ref()
            .ok_or(DatalogError::UninitializedState {
                iteration: self.iteration_index,
            })
    }

    /// Zero the accumulators and advance to the next iteration.
    ///
    /// The current environment is kept; it only changes on `EnvironmentStart`.
    pub fn reset_iteration(&mut self) {
        self.beneficial_count = 0;
        self.deleterious_count = 0;
        self.pos_delta_sum = 0.0;
        self.neg_delta_sum = 0.0;
        self.iteration_index += 1;
    }
}
