//! Metric kinds reported by the simulator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DatalogError;

/// Kind of a simulator event. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// A new environment became current. Payload: the environment.
    EnvironmentStart,
    /// The current environment finished all of its iterations.
    EnvironmentComplete,
    /// The simulation was initialized.
    SimulationStart,
    /// Fitness change caused by one organism's mutation. Payload: float delta.
    OrganismFitnessDifference,
    /// Whether one organism's mutation was beneficial. Payload: bool.
    OrganismMutationBeneficial,
    /// End of one iteration.
    IterationComplete,
}

impl Metric {
    /// Every metric, in declaration order.
    pub const ALL: [Metric; 6] = [
        Metric::EnvironmentStart,
        Metric::EnvironmentComplete,
        Metric::SimulationStart,
        Metric::OrganismFitnessDifference,
        Metric::OrganismMutationBeneficial,
        Metric::IterationComplete,
    ];

    /// Stable numeric identifier (declaration order, from 0).
    pub fn code(self) -> u8 {
        match self {
            Metric::EnvironmentStart => 0,
            Metric::EnvironmentComplete => 1,
            Metric::SimulationStart => 2,
            Metric::OrganismFitnessDifference => 3,
            Metric::OrganismMutationBeneficial => 4,
            Metric::IterationComplete => 5,
        }
    }

    /// Markers carry no payload; anything reported with them is ignored.
    pub fn is_marker(self) -> bool {
        matches!(
            self,
            Metric::EnvironmentComplete | Metric::SimulationStart | Metric::IterationComplete
        )
    }

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::EnvironmentStart => "environment_start",
            Metric::EnvironmentComplete => "environment_complete",
            Metric::SimulationStart => "simulation_start",
            Metric::OrganismFitnessDifference => "organism_fitness_difference",
            Metric::OrganismMutationBeneficial => "organism_mutation_beneficial",
            Metric::IterationComplete => "iteration_complete",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = DatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| DatalogError::UnknownMetric(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_declaration_order() {
        for (idx, metric) in Metric::ALL.iter().enumerate() {
            assert_eq!(metric.code() as usize, idx);
        }
    }

    #[test]
    fn names_parse_back() {
        for metric in Metric::ALL {
            assert_eq!(metric.as_str().parse::<Metric>().unwrap(), metric);
        }
        assert!(matches!(
            "organism_died".parse::<Metric>(),
            Err(DatalogError::UnknownMetric(name)) if name == "organism_died"
        ));
    }

    #[test]
    fn markers_are_the_payload_free_metrics() {
        let markers: Vec<Metric> = Metric::ALL.into_iter().filter(|m| m.is_marker()).collect();
        assert_eq!(
            markers,
            vec![
                Metric::EnvironmentComplete,
                Metric::SimulationStart,
                Metric::IterationComplete
            ]
        );
    }

    #[test]
    fn serde_uses_wire_name() {
        let json = serde_json::to_string(&Metric::IterationComplete).unwrap();
        assert_eq!(json, "\"iteration_complete\"");
        let back: Metric = serde_json::from_str("\"environment_start\"").unwrap();
        assert_eq!(back, Metric::EnvironmentStart);
    }
}
