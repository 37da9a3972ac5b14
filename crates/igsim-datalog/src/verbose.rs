//! Diagnostic listener that logs every event as it arrives.

use std::fmt::Debug;
use std::io::Write;

use tracing::debug;

use crate::engine::Simulation;
use crate::error::Result;
use crate::event::{Event, Payload};
use crate::listener::Listener;

/// Writes `METRIC: <time> / <metric code> / <payload>` for every event.
///
/// Keeps no statistics. Can replace the aggregator outright or run next to it
/// in a [`ListenerChain`](crate::listener::ListenerChain).
pub struct VerboseLogger<W: Write> {
    sink: W,
}

impl<W: Write> VerboseLogger<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

/// Floats at fixed 6-digit precision, everything else via `Debug`.
pub fn render_payload<E: Debug>(payload: &Payload<&E>) -> String {
    match payload {
        Payload::Float(value) => format!("{value:.6}"),
        Payload::Environment(environment) => format!("{environment:?}"),
        Payload::Bool(value) => format!("{value:?}"),
        Payload::Empty => "()".to_string(),
    }
}

impl<S, W> Listener<S> for VerboseLogger<W>
where
    S: Simulation,
    S::Environment: Debug,
    W: Write,
{
    fn on_event(&mut self, sim: &S, event: &Event<S::Environment>) -> Result<()> {
        let payload = render_payload(&event.payload());
        let line = format!(
            "METRIC: {} / {} / {}\n",
            sim.time(),
            event.metric().code(),
            payload
        );
        self.sink.write_all(line.as_bytes())?;
        debug!(time = sim.time(), metric = %event.metric(), payload = %payload, "metric");
        Ok(())
    }
}
