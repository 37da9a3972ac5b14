//! Reading datalog CSV files back.
//!
//! Cells are coerced leniently: a blank or unparsable number becomes NaN (or
//! `None` for the integer columns) instead of failing the whole file.

use std::io::Read;

use crate::error::Result;
use crate::header::RunHeader;

const GENERATION_FIELD: usize = 0;
const ENV_FIELD: usize = 1;
const MUTATED_FIELD: usize = 2;
const BD_FIELD: usize = 3;
const FITNESS_FIELD: usize = 4;

/// One data row of a datalog file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatalogRow {
    pub generation: Option<u64>,
    pub environment: Option<u64>,
    /// `# Organisms Mutated` column.
    pub mutated: f64,
    pub bd_ratio: f64,
    pub fitness: f64,
}

/// A parsed datalog file: run parameters from the header line plus rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Datalog {
    pub header: RunHeader,
    pub rows: Vec<DatalogRow>,
}

fn parse_float(field: Option<&str>) -> f64 {
    field
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
        .unwrap_or(f64::NAN)
}

fn parse_int(field: Option<&str>) -> Option<u64> {
    field.map(str::trim).and_then(|s| s.parse().ok())
}

/// Read a datalog CSV. The header line is optional; it is recognised by a
/// non-numeric first cell.
pub fn read_datalog<R: Read>(reader: R) -> Result<Datalog> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut datalog = Datalog::default();
    for (idx, record) in csv_reader.records().enumerate() {
        let record = record?;
        let first = record.get(GENERATION_FIELD).map(str::trim).unwrap_or_default();
        if idx == 0 && first.parse::<u64>().is_err() {
            let line: Vec<&str> = record.iter().collect();
            datalog.header = RunHeader::parse(&line.join(","));
            continue;
        }

        datalog.rows.push(DatalogRow {
            generation: parse_int(record.get(GENERATION_FIELD)),
            environment: parse_int(record.get(ENV_FIELD)),
            mutated: parse_float(record.get(MUTATED_FIELD)),
            bd_ratio: parse_float(record.get(BD_FIELD)),
            fitness: parse_float(record.get(FITNESS_FIELD)),
        });
    }
    Ok(datalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_optional_and_cells_are_lenient() {
        let csv = "\
Generation,Environment,# Organisms Mutated,B/D Ratio,Fitness,# ARGS seed=3
1,0,4,1.000000,0.500000
2,,x,,NaN
";
        let datalog = read_datalog(csv.as_bytes()).unwrap();
        assert_eq!(datalog.header.seed(), Some(3));
        assert_eq!(datalog.rows.len(), 2);

        let first = datalog.rows[0];
        assert_eq!(first.generation, Some(1));
        assert_eq!(first.environment, Some(0));
        assert_eq!(first.mutated, 4.0);

        let second = datalog.rows[1];
        assert_eq!(second.environment, None);
        assert!(second.mutated.is_nan());
        assert!(second.bd_ratio.is_nan());
        assert!(second.fitness.is_nan());
    }

    #[test]
    fn headerless_file_keeps_first_row() {
        let datalog = read_datalog("7,2,0,0.000000,0.1\n".as_bytes()).unwrap();
        assert!(datalog.header.params().is_empty());
        assert_eq!(datalog.rows[0].generation, Some(7));
    }
}
