//! Metric dispatcher and iteration finalizer.
//!
//! [`IterationAggregator`] owns the run's [`AggregatorState`] and the
//! [`RecordEmitter`] its rows go to. Events update the counters until
//! `IterationComplete` arrives; at that point the record is computed from the
//! engine's current population, written, and the counters are reset.

use std::io::Write;

use tracing::instrument;

use crate::engine::{Environment, Simulation};
use crate::error::Result;
use crate::event::{Event, Payload};
use crate::finalize::summarize;
use crate::header::RunHeader;
use crate::listener::Listener;
use crate::metric::Metric;
use crate::obs;
use crate::record::{OutputRecord, RecordEmitter};
use crate::state::AggregatorState;

pub struct IterationAggregator<E, W: Write> {
    state: AggregatorState<E>,
    emitter: RecordEmitter<W>,
    events_seen: u64,
}

impl<E: Environment, W: Write> IterationAggregator<E, W> {
    pub fn new(sink: W) -> Self {
        Self::with_emitter(RecordEmitter::new(sink))
    }

    pub fn with_emitter(emitter: RecordEmitter<W>) -> Self {
        Self {
            state: AggregatorState::new(),
            emitter,
            events_seen: 0,
        }
    }

    /// Route one event to its handler.
    pub fn dispatch<S>(&mut self, sim: &S, event: &Event<E>) -> Result<()>
    where
        S: Simulation<Environment = E>,
    {
        self.events_seen += 1;
        match event {
            Event::EnvironmentStart(environment) => {
                obs::emit_environment_started(environment.id(), self.state.iteration_index);
                self.state.set_environment(environment.clone());
            }
            Event::EnvironmentComplete => {}
            // The header line is written by whoever owns the sink.
            Event::SimulationStart => {}
            Event::OrganismFitnessDifference(delta) => self.state.record_fitness_delta(*delta),
            Event::OrganismMutationBeneficial(beneficial) => {
                self.state.record_classification(*beneficial)
            }
            Event::IterationComplete => {
                self.finalize_iteration(sim)?;
            }
        }
        Ok(())
    }

    /// Untyped entry point; a payload that does not fit `metric` is rejected
    /// before any state changes.
    pub fn dispatch_raw<S>(&mut self, sim: &S, metric: Metric, payload: Payload<E>) -> Result<()>
    where
        S: Simulation<Environment = E>,
    {
        let event = Event::from_parts(metric, payload)?;
        self.dispatch(sim, &event)
    }

    /// Close the current iteration: compute, write, reset.
    ///
    /// Nothing is written and nothing is reset when the environment is unset
    /// or the sink rejects the row.
    #[instrument(skip(self, sim), fields(iteration = self.state.iteration_index), level = "debug")]
    pub fn finalize_iteration<S>(&mut self, sim: &S) -> Result<OutputRecord>
    where
        S: Simulation<Environment = E>,
    {
        let environment = self.state.require_environment()?;
        let record = summarize(&self.state, sim.population(), environment);

        if let Err(e) = self.emitter.emit(&record) {
            obs::emit_sink_failure(record.iteration_index, &e);
            return Err(e);
        }
        obs::emit_iteration_finalized(&record);

        self.state.reset_iteration();
        Ok(record)
    }

    pub fn state(&self) -> &AggregatorState<E> {
        &self.state
    }

    pub fn emitter(&self) -> &RecordEmitter<W> {
        &self.emitter
    }

    /// Well-formed events dispatched so far.
    pub fn events_seen(&self) -> u64 {
        self.events_seen
    }

    /// Iterations finalized so far.
    pub fn iterations_completed(&self) -> u64 {
        self.state.iteration_index - 1
    }

    pub fn into_emitter(self) -> RecordEmitter<W> {
        self.emitter
    }
}

impl<S, W> Listener<S> for IterationAggregator<S::Environment, W>
where
    S: Simulation,
    W: Write,
{
    fn on_event(&mut self, sim: &S, event: &Event<S::Environment>) -> Result<()> {
        self.dispatch(sim, event)
    }

    fn on_run_header(&mut self, header: &RunHeader) -> Result<()> {
        self.emitter.write_prefix(&header.to_string())
    }
}
