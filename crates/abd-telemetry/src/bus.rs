//! Event bus: per-step buffering and in-order delivery to pluggable sinks.
//!
//! The simulator runs on one control thread, so delivery is synchronous.
//! Events emitted during a timestep are held in a pending buffer and handed
//! to every sink, in emission order, when the step publishes or flushes.

use crate::events::{EventKind, SimulationEvent};
use crate::sinks::EventSink;

/// Buffered event bus for simulation telemetry.
pub struct EventBus {
    sinks: Vec<Box<dyn EventSink>>,
    pending: Vec<SimulationEvent>,
    enabled: bool,
    delivered: u64,
}

impl EventBus {
    /// Creates an enabled bus with no sinks.
    pub fn new() -> Self {
        Self {
            sinks: Vec::new(),
            pending: Vec::new(),
            enabled: true,
            delivered: 0,
        }
    }

    /// Registers a sink. Sinks receive events in registration order.
    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Disabling drops whatever is still pending.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.pending.clear();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Buffers one event until the next flush. No-op while disabled.
    pub fn emit(&mut self, event: SimulationEvent) {
        if self.enabled {
            self.pending.push(event);
        }
    }

    /// Buffers all of one timestep's events and delivers them.
    ///
    /// Returns the number of events delivered by this call.
    pub fn publish<I>(&mut self, timestep: u32, kinds: I) -> usize
    where
        I: IntoIterator<Item = EventKind>,
    {
        if self.enabled {
            self.pending
                .extend(kinds.into_iter().map(|kind| SimulationEvent::new(timestep, kind)));
        }
        self.flush()
    }

    /// Delivers pending events to every sink and returns how many there were.
    pub fn flush(&mut self) -> usize {
        let count = self.pending.len();
        for event in self.pending.drain(..) {
            for sink in &mut self.sinks {
                sink.handle(&event);
            }
        }
        self.delivered += count as u64;
        count
    }

    /// Flushes, then calls `finalize` on every sink.
    pub fn finalize(&mut self) {
        self.flush();
        for sink in &mut self.sinks {
            sink.finalize();
        }
    }

    /// Events waiting for the next flush.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Events delivered since the bus was created.
    pub fn delivered_count(&self) -> u64 {
        self.delivered
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
