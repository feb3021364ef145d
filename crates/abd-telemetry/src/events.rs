//! Simulation event types.
//!
//! Structured events emitted by the simulator at fixed points of each
//! timestep. Events are lightweight value types that carry just enough
//! data to be useful for monitoring and debugging.

use serde::{Deserialize, Serialize};

/// A simulation event emitted by the engine.
///
/// Events are tagged with a timestep index and carry domain-specific data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// Timestep number (0-indexed).
    pub timestep: u32,
    /// Event payload.
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// Timestep started.
    TimestepBegin {
        /// Simulation time at the start of the step (seconds).
        sim_time: f64,
    },

    /// Timestep completed.
    TimestepEnd {
        /// Wall-clock time for the entire timestep (seconds).
        wall_time: f64,
    },

    /// Contact enumeration completed.
    ContactDetection {
        /// Number of kept contacts.
        contact_count: u32,
        /// Number of body pairs in contact.
        pair_count: u32,
        /// Valid contacts dropped on buffer overflow.
        truncated: u32,
        /// Deepest kept penetration (meters).
        max_penetration: f64,
    },

    /// One Newton update applied.
    NewtonIteration {
        /// Iteration number within the timestep.
        iteration: u32,
        /// Projected gradient norm before the update.
        gradient_norm: f64,
        /// Incremental potential after the update.
        energy: f64,
        /// Accepted line-search step length.
        step_length: f64,
    },

    /// Inner linear solve of one Newton iteration.
    LinearSolve {
        /// Solver that produced the direction.
        solver: String,
        /// Iterations used (1 for direct solvers).
        iterations: u32,
        /// Final relative residual.
        residual: f64,
    },

    /// Energy snapshot at the end of a step.
    Energy {
        /// Kinetic energy estimated from `q − q_prev`.
        kinetic: f64,
        /// Elastic (orthogonality) energy.
        elastic: f64,
        /// Contact penalty energy.
        contact: f64,
    },

    /// Newton convergence report for the timestep.
    Convergence {
        /// Total Newton iterations used.
        iterations: u32,
        /// Final projected gradient norm.
        final_residual: f64,
        /// Whether the gradient dropped below tolerance.
        converged: bool,
    },

    /// Custom event for extensibility.
    Custom {
        /// Arbitrary label.
        label: String,
        /// JSON-encoded payload.
        payload: String,
    },
}

impl SimulationEvent {
    /// Creates a new event for the given timestep.
    pub fn new(timestep: u32, kind: EventKind) -> Self {
        Self { timestep, kind }
    }
}
