//! Output record format and the sink it is written to.

use std::fmt;
use std::io::Write;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;

/// Finalized statistics for one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutputRecord {
    pub iteration_index: u64,
    pub environment_id: u64,
    /// Beneficial plus deleterious classifications.
    pub total_classified: u64,
    pub bd_ratio: f64,
    pub avg_fitness: f64,
    pub pos_mean: f64,
    pub neg_mean: f64,
    pub net_mean: f64,
}

/// One CSV line, without the trailing newline.
impl fmt::Display for OutputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{:.6},{:.6},{:.6},{:.6},{:.6}",
            self.iteration_index,
            self.environment_id,
            self.total_classified,
            self.bd_ratio,
            self.avg_fitness,
            self.pos_mean,
            self.neg_mean,
            self.net_mean,
        )
    }
}

/// Writes one line per record to an append-only sink.
///
/// Each line is formatted in full before it is handed to the sink in a single
/// `write_all`, so a formatting problem can never leave half a row behind.
/// Write errors are returned as-is; nothing is retried.
pub struct RecordEmitter<W: Write> {
    sink: W,
    records_written: u64,
}

impl<W: Write> RecordEmitter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            records_written: 0,
        }
    }

    /// Write an arbitrary line ahead of the records (the run header).
    pub fn write_prefix(&mut self, line: &str) -> Result<()> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        if !buf.ends_with('\n') {
            buf.push('\n');
        }
        self.sink.write_all(buf.as_bytes())?;
        self.sink.flush()?;
        Ok(())
    }

    pub fn emit(&mut self, record: &OutputRecord) -> Result<()> {
        let line = format!("{record}\n");
        self.sink.write_all(line.as_bytes())?;
        self.sink.flush()?;
        self.records_written += 1;
        debug!(
            iteration = record.iteration_index,
            written = self.records_written,
            "record emitted"
        );
        Ok(())
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}
