//! Interfaces consumed from the simulation engine.
//!
//! The datalog never owns genomes, organisms or environments. It reads the
//! environment handed over by `EnvironmentStart`, and at the end of each
//! iteration asks the engine for its current population.

use serde::{Deserialize, Serialize};

/// An environment organisms are evaluated against.
pub trait Environment: Clone {
    /// Stable identifier written to every output record.
    fn id(&self) -> u64;
}

/// An organism whose fitness depends on the environment.
pub trait Organism<E> {
    fn fitness_for(&self, environment: &E) -> f64;
}

/// Read-only view of the running engine.
pub trait Simulation {
    type Environment: Environment;
    type Organism: Organism<Self::Environment>;

    /// Current population, in engine order.
    fn population(&self) -> &[Self::Organism];

    /// Engine time marker (iteration counter).
    fn time(&self) -> u64;
}

/// Environment known only by its identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvironmentId {
    pub id: u64,
}

impl EnvironmentId {
    pub fn new(id: u64) -> Self {
        Self { id }
    }
}

impl Environment for EnvironmentId {
    fn id(&self) -> u64 {
        self.id
    }
}

impl<E: Environment> Environment for std::sync::Arc<E> {
    fn id(&self) -> u64 {
        E::id(self)
    }
}
