//! Run header line written ahead of the per-iteration records.
//!
//! The header names the columns and carries the run parameters in a trailing
//! `# ARGS k=v ...` cell, so a datalog file can be traced back to the command
//! that produced it. Older files carry a bare `SEED:<n>` cell instead; both are
//! understood by [`RunHeader::parse`].

use std::collections::BTreeMap;
use std::fmt;

/// Column names, in record order.
pub const COLUMNS: [&str; 8] = [
    "Generation",
    "Environment",
    "# Organisms Mutated",
    "B/D Ratio",
    "Fitness",
    "Δfit+ mean",
    "Δfit- mean",
    "Δfit net mean",
];

const ARGS_MARKER: &str = "# ARGS";
const SEED_MARKER: &str = "SEED:";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunHeader {
    params: BTreeMap<String, String>,
}

impl RunHeader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    pub fn extend<I, K, V>(&mut self, params: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in params {
            self.params.insert(k.into(), v.into());
        }
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn seed(&self) -> Option<u64> {
        self.params.get("seed").and_then(|s| s.parse().ok())
    }

    /// Recover run parameters from a header line.
    ///
    /// Lines without a recognised parameter cell yield an empty header.
    pub fn parse(line: &str) -> Self {
        let mut header = RunHeader::new();
        for cell in line.trim_end().split(',').map(str::trim) {
            if let Some(rest) = cell.strip_prefix(ARGS_MARKER) {
                for token in rest.split_whitespace() {
                    if let Some((k, v)) = token.split_once('=') {
                        header.params.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            } else if let Some(seed) = cell.strip_prefix(SEED_MARKER) {
                header
                    .params
                    .insert("seed".to_string(), seed.trim().to_string());
            }
        }
        header
    }
}

/// The full header line, without the trailing newline.
impl fmt::Display for RunHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", COLUMNS.join(","), ARGS_MARKER)?;
        for (k, v) in &self.params {
            write!(f, " {k}={v}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_columns_then_sorted_args() {
        let header = RunHeader::new()
            .with_param("seed", 42)
            .with_param("loci", 10)
            .with_param("quiet", false);
        assert_eq!(
            header.to_string(),
            "Generation,Environment,# Organisms Mutated,B/D Ratio,Fitness,\
             Δfit+ mean,Δfit- mean,Δfit net mean,# ARGS loci=10 quiet=false seed=42"
        );
    }

    #[test]
    fn parse_recovers_params() {
        let header = RunHeader::new()
            .with_param("seed", 7)
            .with_param("mutability", 0.05);
        let parsed = RunHeader::parse(&header.to_string());
        assert_eq!(parsed, header);
        assert_eq!(parsed.seed(), Some(7));
    }

    #[test]
    fn parse_understands_legacy_seed_cell() {
        let parsed = RunHeader::parse("Generation,Environment,Fitness,SEED: 1234\n");
        assert_eq!(parsed.seed(), Some(1234));
    }

    #[test]
    fn parse_without_params_is_empty() {
        assert!(RunHeader::parse("Generation,Environment").params().is_empty());
        assert_eq!(RunHeader::parse("").seed(), None);
    }

    #[test]
    fn extend_overwrites_existing_keys() {
        let mut header = RunHeader::new().with_param("seed", 1);
        header.extend([("seed", "2"), ("loci", "3")]);
        assert_eq!(header.seed(), Some(2));
        assert_eq!(header.params().len(), 2);
    }
}
