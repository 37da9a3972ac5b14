//! Typed simulator events.
//!
//! [`Event`] carries exactly the payload its metric calls for, so a
//! well-formed event cannot have the wrong payload type. [`Payload`] is the
//! loosely-typed form events arrive in from outside the type system (decoded
//! logs, foreign engines); [`Event::from_parts`] is the single place where the
//! two are reconciled.

use crate::error::{DatalogError, Result};
use crate::metric::Metric;

/// One simulator event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event<E> {
    EnvironmentStart(E),
    EnvironmentComplete,
    SimulationStart,
    /// Signed fitness change attributed to one mutation.
    OrganismFitnessDifference(f64),
    /// `true` when the mutation was beneficial, `false` when deleterious.
    OrganismMutationBeneficial(bool),
    IterationComplete,
}

/// Untyped event payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<E> {
    Environment(E),
    Float(f64),
    Bool(bool),
    Empty,
}

impl<E> Payload<E> {
    /// Short name of the payload's runtime type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Payload::Environment(_) => "environment",
            Payload::Float(_) => "float",
            Payload::Bool(_) => "bool",
            Payload::Empty => "empty",
        }
    }
}

impl<E> Event<E> {
    pub fn metric(&self) -> Metric {
        match self {
            Event::EnvironmentStart(_) => Metric::EnvironmentStart,
            Event::EnvironmentComplete => Metric::EnvironmentComplete,
            Event::SimulationStart => Metric::SimulationStart,
            Event::OrganismFitnessDifference(_) => Metric::OrganismFitnessDifference,
            Event::OrganismMutationBeneficial(_) => Metric::OrganismMutationBeneficial,
            Event::IterationComplete => Metric::IterationComplete,
        }
    }

    /// Build an event from a metric and an untyped payload.
    ///
    /// Markers (`EnvironmentComplete`, `SimulationStart`, `IterationComplete`)
    /// ignore whatever payload they were given. The other metrics require an
    /// exact payload type; anything else is a `ContractViolation`.
    pub fn from_parts(metric: Metric, payload: Payload<E>) -> Result<Self> {
        let violation = |expected: &'static str, found: &Payload<E>| {
            DatalogError::ContractViolation {
                metric,
                expected,
                found: found.type_name(),
            }
        };

        match metric {
            Metric::EnvironmentStart => match payload {
                Payload::Environment(env) => Ok(Event::EnvironmentStart(env)),
                other => Err(violation("environment", &other)),
            },
            Metric::EnvironmentComplete => Ok(Event::EnvironmentComplete),
            Metric::SimulationStart => Ok(Event::SimulationStart),
            Metric::OrganismFitnessDifference => match payload {
                Payload::Float(delta) => Ok(Event::OrganismFitnessDifference(delta)),
                other => Err(violation("float", &other)),
            },
            Metric::OrganismMutationBeneficial => match payload {
                Payload::Bool(beneficial) => Ok(Event::OrganismMutationBeneficial(beneficial)),
                other => Err(violation("bool", &other)),
            },
            Metric::IterationComplete => Ok(Event::IterationComplete),
        }
    }

    /// Borrowed untyped view of the payload.
    pub fn payload(&self) -> Payload<&E> {
        match self {
            Event::EnvironmentStart(env) => Payload::Environment(env),
            Event::OrganismFitnessDifference(delta) => Payload::Float(*delta),
            Event::OrganismMutationBeneficial(beneficial) => Payload::Bool(*beneficial),
            Event::EnvironmentComplete | Event::SimulationStart | Event::IterationComplete => {
                Payload::Empty
            }
        }
    }
}
