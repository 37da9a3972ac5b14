//! Error types for datalog operations

use thiserror::Error;

use crate::metric::Metric;

#[derive(Error, Debug)]
pub enum DatalogError {
    /// Payload type does not match the metric it was reported under.
    #[error("contract violation: {metric} expects a {expected} payload, got {found}")]
    ContractViolation {
        metric: Metric,
        expected: &'static str,
        found: &'static str,
    },

    /// `IterationComplete` arrived before any `EnvironmentStart`.
    #[error("uninitialized state: iteration {iteration} completed with no environment set")]
    UninitializedState { iteration: u64 },

    #[error("output sink write failed: {0}")]
    Sink(#[from] std::io::Error),

    #[error("unknown metric: {0}")]
    UnknownMetric(String),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("event log line {line}: {source}")]
    Replay {
        line: usize,
        #[source]
        source: Box<DatalogError>,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl DatalogError {
    /// Attach a 1-based event log line number.
    pub fn at_line(self, line: usize) -> Self {
        DatalogError::Replay {
            line,
            source: Box::new(self),
        }
    }
}

/// Result type for datalog operations
pub type Result<T> = std::result::Result<T, DatalogError>;
