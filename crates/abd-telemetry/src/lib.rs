//! # abd-telemetry
//!
//! Event bus for simulation telemetry. The simulator emits structured
//! events (timestep timing, contact counts, Newton iterations, linear
//! solves, convergence) that pluggable sinks consume: `tracing` logs for
//! binaries, in-memory recording for tests.

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::EventBus;
pub use events::{EventKind, SimulationEvent};
pub use sinks::{EventLog, EventSink, TracingSink, VecSink};
