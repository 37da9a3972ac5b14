//! Cross-run statistics over datalog files.
//!
//! Two rollups, both keyed by the datalog's file name:
//! - [`RunStats`]: one row per file with the run parameters from the header
//!   and descriptive statistics of fitness, B/D ratio and mutation counts.
//! - [`EnvEdge`]: the first two and last two rows of every environment block,
//!   for looking at what happens around an environment switch.

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use crate::datalog::{Datalog, DatalogRow};
use crate::error::Result;
use crate::finalize::UNBOUNDED_BD_RATIO;

/// Header parameters copied into the run statistics, in column order.
pub const META_COLUMNS: [&str; 9] = [
    "seed",
    "envs",
    "iterations",
    "mutability",
    "neutral-range",
    "max-fitness",
    "loci",
    "startorgs",
    "maxorgs",
];

const EDGE_ROWS: usize = 2;

/// Descriptive statistics for one datalog file.
///
/// Undefined statistics (no usable values, or fewer than two for `fitness_std`)
/// are NaN.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStats {
    pub file: String,
    pub params: BTreeMap<String, String>,
    pub rows: usize,
    pub fitness_mean: f64,
    /// Sample standard deviation.
    pub fitness_std: f64,
    pub fitness_min: f64,
    pub fitness_max: f64,
    pub fitness_nan_count: usize,
    /// Mean of the finite ratios; unbounded ratios are counted in `bd_inf_count`.
    pub bd_mean: f64,
    pub bd_median: f64,
    pub bd_inf_count: usize,
    pub mutated_mean: f64,
    pub mutated_median: f64,
    pub mutated_max: f64,
}

fn present(values: impl Iterator<Item = f64>) -> Vec<f64> {
    values.filter(|v| !v.is_nan()).collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    match n {
        0 => f64::NAN,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(f64::NAN)
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(f64::NAN)
}

fn is_unbounded(bd: f64) -> bool {
    bd.is_infinite() || bd == UNBOUNDED_BD_RATIO
}

/// Compute the per-file statistics for one parsed datalog.
pub fn run_stats(file: impl Into<String>, datalog: &Datalog) -> RunStats {
    let rows = &datalog.rows;
    let fitness = present(rows.iter().map(|r| r.fitness));
    let mutated = present(rows.iter().map(|r| r.mutated));
    let bd_inf_count = rows.iter().filter(|r| is_unbounded(r.bd_ratio)).count();
    let bd = present(
        rows.iter()
            .map(|r| r.bd_ratio)
            .filter(|bd| !is_unbounded(*bd)),
    );

    RunStats {
        file: file.into(),
        params: datalog.header.params().clone(),
        rows: rows.len(),
        fitness_mean: mean(&fitness),
        fitness_std: sample_std(&fitness),
        fitness_min: min(&fitness),
        fitness_max: max(&fitness),
        fitness_nan_count: rows.len() - fitness.len(),
        bd_mean: mean(&bd),
        bd_median: median(&bd),
        bd_inf_count,
        mutated_mean: mean(&mutated),
        mutated_median: median(&mutated),
        mutated_max: max(&mutated),
    }
}

/// Which end of an environment block an edge row comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeTag {
    Begin,
    End,
}

impl EdgeTag {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeTag::Begin => "begin",
            EdgeTag::End => "end",
        }
    }
}

/// One row at the start or end of an environment block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvEdge {
    pub environment: u64,
    pub tag: EdgeTag,
    pub generation: u64,
    pub mutated: Option<f64>,
    pub bd_ratio: Option<f64>,
    pub fitness: Option<f64>,
}

fn defined(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}

fn edge(tag: EdgeTag, row: &DatalogRow, environment: u64, generation: u64) -> EnvEdge {
    EnvEdge {
        environment,
        tag,
        generation,
        mutated: defined(row.mutated),
        bd_ratio: defined(row.bd_ratio),
        fitness: defined(row.fitness),
    }
}

/// Split a datalog into environment blocks and pick their edge rows.
///
/// A blank environment cell continues the current block. Within a block only
/// rows carrying both a generation and an environment are eligible; the first
/// two are tagged [`EdgeTag::Begin`] and the last two [`EdgeTag::End`]. A block
/// with a single eligible row reports it under both tags.
pub fn env_edges(datalog: &Datalog) -> Vec<EnvEdge> {
    let mut blocks: Vec<Vec<&DatalogRow>> = Vec::new();
    let mut current_env: Option<u64> = None;

    for row in &datalog.rows {
        if row.environment.is_none() && row.generation.is_none() {
            continue;
        }
        let switched = matches!(
            (current_env, row.environment),
            (Some(prev), Some(env)) if prev != env
        );
        if switched || blocks.is_empty() {
            blocks.push(Vec::new());
        }
        if row.environment.is_some() {
            current_env = row.environment;
        }
        if let Some(block) = blocks.last_mut() {
            block.push(row);
        }
    }

    let mut edges = Vec::new();
    for block in blocks {
        let eligible: Vec<(&DatalogRow, u64, u64)> = block
            .into_iter()
            .filter_map(|r| Some((r, r.environment?, r.generation?)))
            .collect();
        let tail_start = eligible.len().saturating_sub(EDGE_ROWS);
        for (row, env, generation) in eligible.iter().take(EDGE_ROWS) {
            edges.push(edge(EdgeTag::Begin, row, *env, *generation));
        }
        for (row, env, generation) in &eligible[tail_start..] {
            edges.push(edge(EdgeTag::End, row, *env, *generation));
        }
    }
    edges
}

fn number(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(number).unwrap_or_default()
}

/// Write one row per file. Missing parameters and undefined statistics are
/// written as empty cells.
pub fn write_run_stats_csv<W: Write>(writer: W, stats: &[RunStats]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec!["file"];
    header.extend(META_COLUMNS);
    header.extend([
        "rows",
        "fitness_mean",
        "fitness_std",
        "fitness_min",
        "fitness_max",
        "fitness_nan_count",
        "bd_mean",
        "bd_median",
        "bd_inf_count",
        "mutated_mean",
        "mutated_median",
        "mutated_max",
    ]);
    wtr.write_record(&header)?;

    for s in stats {
        let mut record = vec![s.file.clone()];
        record.extend(
            META_COLUMNS
                .iter()
                .map(|key| s.params.get(*key).cloned().unwrap_or_default()),
        );
        record.extend([
            s.rows.to_string(),
            number(s.fitness_mean),
            number(s.fitness_std),
            number(s.fitness_min),
            number(s.fitness_max),
            s.fitness_nan_count.to_string(),
            number(s.bd_mean),
            number(s.bd_median),
            s.bd_inf_count.to_string(),
            number(s.mutated_mean),
            number(s.mutated_median),
            number(s.mutated_max),
        ]);
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write edge rows tagged with the file they came from. The header is written
/// even when there are no edges.
pub fn write_env_edges_csv<'a, W, I>(writer: W, edges: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = (&'a str, &'a EnvEdge)>,
{
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "file",
        "Environment",
        "Tag",
        "Generation",
        "Mutated",
        "B/D Ratio",
        "Fitness",
    ])?;
    for (file, e) in edges {
        wtr.write_record([
            file.to_string(),
            e.environment.to_string(),
            e.tag.as_str().to_string(),
            e.generation.to_string(),
            optional(e.mutated),
            optional(e.bd_ratio),
            optional(e.fitness),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
