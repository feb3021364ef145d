//! Pluggable event sinks.
//!
//! Sinks consume events from the bus and process them
//! (log through `tracing`, record in memory, write to a file, etc.).

use std::sync::{Arc, Mutex};

use crate::events::{EventKind, SimulationEvent};

/// Trait for event consumers.
///
/// Implement this to create custom telemetry outputs.
pub trait EventSink: Send {
    /// Process a single event.
    fn handle(&mut self, event: &SimulationEvent);

    /// Called when the simulation ends. Flush buffers, close files, etc.
    fn finalize(&mut self) {}

    /// Returns a human-readable name for this sink.
    fn name(&self) -> &str;
}

/// Shared handle to the events recorded by a [`VecSink`].
pub type EventLog = Arc<Mutex<Vec<SimulationEvent>>>;

/// A sink that records events in memory for testing and inspection.
///
/// The sink itself moves into the bus; keep the [`EventLog`] from
/// [`VecSink::log`] to read the events back.
pub struct VecSink {
    events: EventLog,
}

impl VecSink {
    /// Creates an empty vec sink.
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns a handle to the recorded events.
    pub fn log(&self) -> EventLog {
        Arc::clone(&self.events)
    }
}

impl Default for VecSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecSink {
    fn handle(&mut self, event: &SimulationEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }

    fn name(&self) -> &str {
        "vec_sink"
    }
}

/// A sink that logs events using the `tracing` crate.
///
/// Per-iteration events go to `debug`, per-step summaries to `info`.
pub struct TracingSink {
    level: tracing::Level,
}

impl TracingSink {
    /// Creates a new tracing sink whose summaries log at `level`.
    pub fn new(level: tracing::Level) -> Self {
        Self { level }
    }

    fn is_detail(kind: &EventKind) -> bool {
        matches!(
            kind,
            EventKind::NewtonIteration { .. } | EventKind::LinearSolve { .. }
        )
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(tracing::Level::INFO)
    }
}

impl EventSink for TracingSink {
    fn handle(&mut self, event: &SimulationEvent) {
        if Self::is_detail(&event.kind) || self.level == tracing::Level::DEBUG {
            tracing::debug!(timestep = event.timestep, event = ?event.kind, "simulation_event");
        } else if self.level == tracing::Level::TRACE {
            tracing::trace!(timestep = event.timestep, event = ?event.kind, "simulation_event");
        } else {
            tracing::info!(timestep = event.timestep, event = ?event.kind, "simulation_event");
        }
    }

    fn name(&self) -> &str {
        "tracing_sink"
    }
}
