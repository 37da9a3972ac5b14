//! Event listeners and their ordered composition.

use serde::{Deserialize, Serialize};

use crate::engine::Simulation;
use crate::error::Result;
use crate::event::{Event, Payload};
use crate::header::RunHeader;
use crate::metric::Metric;

/// Receives every event the engine reports, synchronously and in order.
pub trait Listener<S: Simulation> {
    fn on_event(&mut self, sim: &S, event: &Event<S::Environment>) -> Result<()>;

    /// Called once before the first event with the run's header.
    fn on_run_header(&mut self, _header: &RunHeader) -> Result<()> {
        Ok(())
    }
}

impl<S: Simulation, L: Listener<S> + ?Sized> Listener<S> for Box<L> {
    fn on_event(&mut self, sim: &S, event: &Event<S::Environment>) -> Result<()> {
        (**self).on_event(sim, event)
    }

    fn on_run_header(&mut self, header: &RunHeader) -> Result<()> {
        (**self).on_run_header(header)
    }
}

impl<S: Simulation, L: Listener<S> + ?Sized> Listener<S> for &mut L {
    fn on_event(&mut self, sim: &S, event: &Event<S::Environment>) -> Result<()> {
        (**self).on_event(sim, event)
    }

    fn on_run_header(&mut self, header: &RunHeader) -> Result<()> {
        (**self).on_run_header(header)
    }
}

/// Fans each event out to several listeners in insertion order.
///
/// The first listener error stops the fan-out for that event and is returned;
/// listeners after it do not see the event.
pub struct ListenerChain<'a, S: Simulation> {
    listeners: Vec<Box<dyn Listener<S> + 'a>>,
}

impl<'a, S: Simulation> Default for ListenerChain<'a, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, S: Simulation> ListenerChain<'a, S> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn push(&mut self, listener: impl Listener<S> + 'a) {
        self.listeners.push(Box::new(listener));
    }

    /// Builder form of [`push`](Self::push).
    pub fn with(mut self, listener: impl Listener<S> + 'a) -> Self {
        self.push(listener);
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn dispatch(&mut self, sim: &S, event: &Event<S::Environment>) -> Result<()> {
        for listener in &mut self.listeners {
            listener.on_event(sim, event)?;
        }
        Ok(())
    }

    /// Validate an untyped event once, then fan it out.
    pub fn dispatch_raw(
        &mut self,
        sim: &S,
        metric: Metric,
        payload: Payload<S::Environment>,
    ) -> Result<()> {
        let event = Event::from_parts(metric, payload)?;
        self.dispatch(sim, &event)
    }

    pub fn announce(&mut self, header: &RunHeader) -> Result<()> {
        for listener in &mut self.listeners {
            listener.on_run_header(header)?;
        }
        Ok(())
    }
}

impl<'a, S: Simulation> Listener<S> for ListenerChain<'a, S> {
    fn on_event(&mut self, sim: &S, event: &Event<S::Environment>) -> Result<()> {
        self.dispatch(sim, event)
    }

    fn on_run_header(&mut self, header: &RunHeader) -> Result<()> {
        self.announce(header)
    }
}

/// Which listeners a run installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ListenerMode {
    /// Per-iteration statistics only.
    #[default]
    Aggregate,
    /// Every event logged, no statistics.
    Verbose,
    /// Statistics first, then the verbose log.
    Both,
}

impl ListenerMode {
    pub fn aggregates(self) -> bool {
        matches!(self, ListenerMode::Aggregate | ListenerMode::Both)
    }

    pub fn logs_verbose(self) -> bool {
        matches!(self, ListenerMode::Verbose | ListenerMode::Both)
    }
}
