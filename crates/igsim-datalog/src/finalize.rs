//! Numeric policy for closing out an iteration.
//!
//! Undefined means are NaN and travel through to the output as data. The
//! beneficial/deleterious ratio never produces NaN or infinity; see
//! [`EMPTY_BD_RATIO`] and [`UNBOUNDED_BD_RATIO`].

use crate::engine::{Environment, Organism};
use crate::record::OutputRecord;
use crate::state::AggregatorState;

/// B/D ratio reported when no mutation was classified in the iteration.
///
/// 0 rather than NaN is a policy choice inherited from the existing datalog
/// format and is still open.
pub const EMPTY_BD_RATIO: f64 = 0.0;

/// B/D ratio reported when mutations were all beneficial.
///
/// Finite stand-in for +inf. Renders as `1000000000.000000`.
pub const UNBOUNDED_BD_RATIO: f64 = 1e9;

/// Mean fitness of `population` in `environment`; NaN for an empty population.
pub fn average_fitness<E, O>(population: &[O], environment: &E) -> f64
where
    O: Organism<E>,
{
    if population.is_empty() {
        return f64::NAN;
    }
    let total: f64 = population
        .iter()
        .map(|organism| organism.fitness_for(environment))
        .sum();
    total / population.len() as f64
}

/// Beneficial-to-deleterious ratio.
pub fn bd_ratio(beneficial: u64, deleterious: u64) -> f64 {
    match (beneficial, deleterious) {
        (0, 0) => EMPTY_BD_RATIO,
        (_, 0) => UNBOUNDED_BD_RATIO,
        (b, d) => b as f64 / d as f64,
    }
}

/// `sum / count`, or NaN when `count` is zero.
pub fn mean_or_nan(sum: f64, count: u64) -> f64 {
    if count > 0 {
        sum / count as f64
    } else {
        f64::NAN
    }
}

/// Compute the record for the iteration held in `state`.
///
/// Pure: reads the population and environment as they are right now and
/// leaves `state` untouched.
pub fn summarize<E, O>(
    state: &AggregatorState<E>,
    population: &[O],
    environment: &E,
) -> OutputRecord
where
    E: Environment,
    O: Organism<E>,
{
    let avg_fitness = average_fitness(population, environment);
    let ratio = bd_ratio(state.beneficial_count, state.deleterious_count);
    let pos_mean = mean_or_nan(state.pos_delta_sum, state.beneficial_count);
    let neg_mean = mean_or_nan(state.neg_delta_sum, state.deleterious_count);
    let net_mean = mean_or_nan(
        state.pos_delta_sum + state.neg_delta_sum,
        state.classified_total(),
    );

    OutputRecord {
        iteration_index: state.iteration_index,
        environment_id: environment.id(),
        total_classified: state.classified_total(),
        bd_ratio: ratio,
        avg_fitness,
        pos_mean,
        neg_mean,
        net_mean,
    }
}
