//! Replay of recorded event logs.
//!
//! A recorded log is newline-delimited JSON, one [`LogEntry`] per line:
//!
//! ```text
//! {"kind":"header","params":{"seed":42,"loci":10}}
//! {"kind":"event","metric":"environment_start","payload":{"id":3}}
//! {"kind":"event","metric":"organism_fitness_difference","payload":0.5}
//! {"kind":"event","metric":"organism_mutation_beneficial","payload":true}
//! {"kind":"population","time":1,"fitness":[0.7,0.7]}
//! {"kind":"event","metric":"iteration_complete"}
//! ```
//!
//! Population entries stand in for the live engine: they replace the
//! population the next `IterationComplete` is evaluated against.

use std::collections::BTreeMap;
use std::io::BufRead;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::engine::{EnvironmentId, Organism, Simulation};
use crate::error::{DatalogError, Result};
use crate::event::{Event, Payload};
use crate::header::RunHeader;
use crate::listener::ListenerChain;
use crate::metric::Metric;

/// One line of a recorded event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogEntry {
    /// Run parameters. Values may be strings, numbers or bools.
    Header {
        #[serde(default)]
        params: BTreeMap<String, Value>,
    },
    /// Population snapshot; each value is one organism's fitness in the
    /// current environment.
    Population {
        #[serde(default)]
        time: Option<u64>,
        fitness: Vec<f64>,
    },
    Event {
        metric: String,
        #[serde(default)]
        payload: Value,
    },
}

/// Organism replayed from a log: its fitness was captured already evaluated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedOrganism {
    pub fitness: f64,
}

impl Organism<EnvironmentId> for RecordedOrganism {
    fn fitness_for(&self, _environment: &EnvironmentId) -> f64 {
        self.fitness
    }
}

/// Engine stand-in reconstructed from population entries.
#[derive(Debug, Clone, Default)]
pub struct ReplaySimulation {
    population: Vec<RecordedOrganism>,
    time: u64,
}

impl ReplaySimulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_population(&mut self, fitness: impl IntoIterator<Item = f64>) {
        self.population = fitness
            .into_iter()
            .map(|fitness| RecordedOrganism { fitness })
            .collect();
    }

    pub fn set_time(&mut self, time: u64) {
        self.time = time;
    }
}

impl Simulation for ReplaySimulation {
    type Environment = EnvironmentId;
    type Organism = RecordedOrganism;

    fn population(&self) -> &[RecordedOrganism] {
        &self.population
    }

    fn time(&self) -> u64 {
        self.time
    }
}

/// Counts from one replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Non-blank lines read.
    pub lines: usize,
    pub events: u64,
    pub iterations: u64,
}

/// Decode a JSON payload into its untyped form.
///
/// `null`/absent is empty, numbers are floats, bools are bools and objects are
/// environments. Anything else cannot be a payload.
pub fn decode_payload(value: Value) -> Result<Payload<EnvironmentId>> {
    match value {
        Value::Null => Ok(Payload::Empty),
        Value::Bool(b) => Ok(Payload::Bool(b)),
        number @ Value::Number(_) => Ok(Payload::Float(serde_json::from_value(number)?)),
        other => Ok(Payload::Environment(serde_json::from_value(other)?)),
    }
}

fn header_value(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Drive `chain` with every entry in `reader`.
///
/// The chain is announced exactly once: with the log's header if the first
/// entry is one, otherwise with an empty header before the first event. The
/// first failing line stops the replay; its error carries the line number.
#[instrument(skip_all, level = "debug")]
pub fn replay_log<R: BufRead>(
    reader: R,
    chain: &mut ListenerChain<'_, ReplaySimulation>,
) -> Result<ReplaySummary> {
    let mut sim = ReplaySimulation::new();
    let mut summary = ReplaySummary::default();
    let mut announced = false;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| DatalogError::from(e).at_line(line_no))?;
        if line.trim().is_empty() {
            continue;
        }
        summary.lines += 1;

        let entry: LogEntry =
            serde_json::from_str(&line).map_err(|e| DatalogError::from(e).at_line(line_no))?;

        match entry {
            LogEntry::Header { params } => {
                if announced {
                    warn!(line = line_no, "ignoring header after the first entry");
                    continue;
                }
                let mut header = RunHeader::new();
                header.extend(params.into_iter().map(|(k, v)| (k, header_value(v))));
                chain.announce(&header).map_err(|e| e.at_line(line_no))?;
                announced = true;
            }
            LogEntry::Population { time, fitness } => {
                debug!(line = line_no, organisms = fitness.len(), "population snapshot");
                sim.set_population(fitness);
                if let Some(time) = time {
                    sim.set_time(time);
                }
            }
            LogEntry::Event { metric, payload } => {
                if !announced {
                    chain
                        .announce(&RunHeader::new())
                        .map_err(|e| e.at_line(line_no))?;
                    announced = true;
                }
                let event = decode_event(&metric, payload).map_err(|e| e.at_line(line_no))?;
                chain
                    .dispatch(&sim, &event)
                    .map_err(|e| e.at_line(line_no))?;
                summary.events += 1;
                if event.metric() == Metric::IterationComplete {
                    summary.iterations += 1;
                    sim.set_time(sim.time() + 1);
                }
            }
        }
    }

    Ok(summary)
}

fn decode_event(metric: &str, payload: Value) -> Result<Event<EnvironmentId>> {
    let metric: Metric = metric.parse()?;
    let payload = if metric.is_marker() {
        Payload::Empty
    } else {
        decode_payload(payload)?
    };
    Event::from_parts(metric, payload)
}
