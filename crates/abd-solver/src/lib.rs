//! # abd-solver
//!
//! Implicit time integration for affine body dynamics.
//!
//! ## Key Types
//!
//! - [`Simulator`]: setup / step / reset loop over a set of [`Body`] records
//! - [`SimulationConfig`]: timestep, gravity, contact and Newton controls
//! - [`MassProperties`]: volume integrals behind each 12×12 mass block
//! - [`IncrementalPotential`]: the per-step objective with its gradient and
//!   block-sparse Hessian
//! - [`NewtonSolver`]: damped Newton with a PCG (or faer LLᵀ) inner solve,
//!   backtracking line search, and pinned-DOF projection
//! - [`SimulationState`]: current and previous generalized coordinates

pub mod assembly;
pub mod body;
pub mod config;
pub mod mass;
pub mod newton;
pub mod simulator;
pub mod state;

pub use assembly::{BodyBlocks, EnergyBreakdown, IncrementalPotential};
pub use body::Body;
pub use config::{LinearSolverKind, NewtonConfig, SimulationConfig};
pub use mass::MassProperties;
pub use newton::{NewtonIterationRecord, NewtonReport, NewtonSolver};
pub use simulator::{Simulator, StepReport};
pub use state::SimulationState;
