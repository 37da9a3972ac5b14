//! Per-environment rollup of a datalog CSV.
//!
//! Groups the per-iteration rows by environment and reports how the B/D ratio
//! moved within each environment and across environment switches.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use serde::Serialize;
use tracing::debug;

use crate::datalog::read_datalog;
use crate::error::Result;

/// Rolled-up statistics for one environment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentSummary {
    pub seed: Option<u64>,
    pub env: u64,
    pub initial_bd: Option<f64>,
    pub final_bd: Option<f64>,
    pub min_bd: Option<f64>,
    pub max_bd: Option<f64>,
    /// Sum of non-NaN ratios over `num_gens`.
    pub avg_bd: f64,
    pub num_gens: u64,
    /// Sum of non-NaN fitness values over `num_gens`.
    pub avg_fitness: f64,
    /// `final_bd - initial_bd`.
    pub diff_bd: Option<f64>,
    /// This environment's `initial_bd` minus the previous environment's `final_bd`.
    pub bd_jump: Option<f64>,
}

impl EnvironmentSummary {
    fn new(seed: Option<u64>, env: u64) -> Self {
        Self {
            seed,
            env,
            initial_bd: None,
            final_bd: None,
            min_bd: None,
            max_bd: None,
            avg_bd: 0.0,
            num_gens: 0,
            avg_fitness: 0.0,
            diff_bd: None,
            bd_jump: None,
        }
    }

    fn add(&mut self, bd: f64, fitness: f64) {
        if !bd.is_nan() {
            self.initial_bd.get_or_insert(bd);
            self.final_bd = Some(bd);
            self.min_bd = Some(self.min_bd.map_or(bd, |m| m.min(bd)));
            self.max_bd = Some(self.max_bd.map_or(bd, |m| m.max(bd)));
            self.avg_bd += bd;
        }
        if !fitness.is_nan() {
            self.avg_fitness += fitness;
        }
        self.num_gens += 1;
    }

    fn close(&mut self) {
        if self.num_gens > 0 {
            self.avg_bd /= self.num_gens as f64;
            self.avg_fitness /= self.num_gens as f64;
        }
        self.diff_bd = match (self.initial_bd, self.final_bd) {
            (Some(initial), Some(last)) => Some(last - initial),
            _ => None,
        };
    }
}

/// Roll up `(env, bd_ratio, fitness)` rows. Output is sorted by environment id.
pub fn summarize_rows<I>(seed: Option<u64>, rows: I) -> Vec<EnvironmentSummary>
where
    I: IntoIterator<Item = (u64, f64, f64)>,
{
    let mut by_env: BTreeMap<u64, EnvironmentSummary> = BTreeMap::new();
    for (env, bd, fitness) in rows {
        by_env
            .entry(env)
            .or_insert_with(|| EnvironmentSummary::new(seed, env))
            .add(bd, fitness);
    }

    let mut summaries: Vec<EnvironmentSummary> = by_env.into_values().collect();
    let mut previous_final: Option<f64> = None;
    for summary in &mut summaries {
        summary.close();
        summary.bd_jump = match (summary.initial_bd, previous_final) {
            (Some(initial), Some(prev)) => Some(initial - prev),
            _ => None,
        };
        previous_final = summary.final_bd;
    }
    summaries
}

/// Read a datalog CSV and roll it up per environment.
///
/// The header line is optional. Rows whose environment is blank or not an
/// integer are skipped.
pub fn read_summaries<R: Read>(reader: R) -> Result<Vec<EnvironmentSummary>> {
    let datalog = read_datalog(reader)?;
    let seed = datalog.header.seed();
    let total = datalog.rows.len();
    let rows: Vec<(u64, f64, f64)> = datalog
        .rows
        .iter()
        .filter_map(|row| row.environment.map(|env| (env, row.bd_ratio, row.fitness)))
        .collect();

    debug!(rows = rows.len(), skipped = total - rows.len(), ?seed, "datalog rows read");
    Ok(summarize_rows(seed, rows))
}

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

/// Write summaries as CSV with columns in alphabetical order.
pub fn write_summary_csv<W: Write>(writer: W, summaries: &[EnvironmentSummary]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "avg_bd",
        "avg_fitness",
        "bd_jump",
        "diff_bd",
        "env",
        "final_bd",
        "initial_bd",
        "max_bd",
        "min_bd",
        "num_gens",
        "seed",
    ])?;
    for s in summaries {
        wtr.write_record([
            s.avg_bd.to_string(),
            s.avg_fitness.to_string(),
            cell(s.bd_jump),
            cell(s.diff_bd),
            s.env.to_string(),
            cell(s.final_bd),
            cell(s.initial_bd),
            cell(s.max_bd),
            cell(s.min_bd),
            s.num_gens.to_string(),
            cell(s.seed),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_group_by_environment_in_id_order() {
        let rows = vec![(2, 1.0, 0.5), (1, 2.0, 0.5), (2, 3.0, 1.5), (1, 4.0, 1.5)];
        let summaries = summarize_rows(Some(9), rows);
        assert_eq!(summaries.len(), 2);

        let first = &summaries[0];
        assert_eq!(first.env, 1);
        assert_eq!(first.seed, Some(9));
        assert_eq!(first.initial_bd, Some(2.0));
        assert_eq!(first.final_bd, Some(4.0));
        assert_eq!(first.min_bd, Some(2.0));
        assert_eq!(first.max_bd, Some(4.0));
        assert_eq!(first.avg_bd, 3.0);
        assert_eq!(first.avg_fitness, 1.0);
        assert_eq!(first.num_gens, 2);
        assert_eq!(first.diff_bd, Some(2.0));
        assert_eq!(first.bd_jump, None);

        let second = &summaries[1];
        assert_eq!(second.env, 2);
        assert_eq!(second.initial_bd, Some(1.0));
        assert_eq!(second.bd_jump, Some(1.0 - 4.0));
    }

    #[test]
    fn nan_values_are_skipped_but_still_counted() {
        let rows = vec![(1, f64::NAN, f64::NAN), (1, 2.0, 1.0)];
        let summary = &summarize_rows(None, rows)[0];
        assert_eq!(summary.num_gens, 2);
        assert_eq!(summary.initial_bd, Some(2.0));
        assert_eq!(summary.avg_bd, 1.0);
        assert_eq!(summary.avg_fitness, 0.5);
    }

    #[test]
    fn all_nan_environment_has_no_bd_stats() {
        let summary = &summarize_rows(None, vec![(3, f64::NAN, 0.0)])[0];
        assert_eq!(summary.initial_bd, None);
        assert_eq!(summary.diff_bd, None);
        assert_eq!(summary.min_bd, None);
    }

    #[test]
    fn read_summaries_parses_header_seed_and_skips_bad_rows() {
        let csv = "\
Generation,Environment,# Organisms Mutated,B/D Ratio,Fitness,Δfit+ mean,Δfit- mean,Δfit net mean,# ARGS loci=10 seed=77
1,0,4,1.000000,0.500000,0.100000,-0.100000,0.000000
2,,0,0.000000,NaN,NaN,NaN,NaN
3,0,2,NaN,0.700000,NaN,NaN,NaN
4,1,1,1000000000.000000,0.900000,0.200000,NaN,0.200000
";
        let summaries = read_summaries(csv.as_bytes()).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].seed, Some(77));
        assert_eq!(summaries[0].num_gens, 2);
        assert_eq!(summaries[0].final_bd, Some(1.0));
        assert_eq!(summaries[1].initial_bd, Some(1e9));
        assert_eq!(summaries[1].bd_jump, Some(1e9 - 1.0));
    }

    #[test]
    fn read_summaries_without_header() {
        let csv = "1,5,0,0.000000,0.250000,NaN,NaN,NaN\n";
        let summaries = read_summaries(csv.as_bytes()).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].env, 5);
        assert_eq!(summaries[0].seed, None);
    }

    #[test]
    fn written_csv_has_sorted_columns_and_na_cells() {
        let summaries = summarize_rows(None, vec![(1, 2.0, 1.0)]);
        let mut out = Vec::new();
        write_summary_csv(&mut out, &summaries).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "avg_bd,avg_fitness,bd_jump,diff_bd,env,final_bd,initial_bd,max_bd,min_bd,num_gens,seed"
        );
        assert_eq!(lines.next().unwrap(), "2,1,N/A,0,1,2,2,2,2,1,N/A");
        assert!(lines.next().is_none());
    }
}
