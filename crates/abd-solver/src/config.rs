//! Simulation configuration.
//!
//! Parameters that control time integration, contact handling, and the
//! Newton-CG solve. Every field has a default, so a TOML file only needs
//! to name what it overrides.

use std::path::Path;

use abd_types::constants::{
    DEFAULT_CG_ITERATIONS, DEFAULT_CG_TOLERANCE, DEFAULT_CONTACT_STIFFNESS,
    DEFAULT_CONTACT_THRESHOLD, DEFAULT_DT, DEFAULT_ELASTIC_STIFFNESS, DEFAULT_LINE_SEARCH_STEPS,
    DEFAULT_LINE_SEARCH_TOLERANCE, DEFAULT_MAX_CONTACTS, DEFAULT_NEWTON_ITERATIONS,
    DEFAULT_NEWTON_TOLERANCE, DEFAULT_QUERY_DISTANCE, GRAVITY,
};
use abd_types::{AbdError, AbdResult};
use serde::{Deserialize, Serialize};

/// Backend for the Newton direction solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinearSolverKind {
    /// Jacobi-preconditioned conjugate gradients.
    #[default]
    Pcg,
    /// Sparse LLᵀ via faer, falling back to PCG on failure.
    Cholesky,
}

/// Newton-CG iteration controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonConfig {
    /// Maximum outer Newton iterations per timestep.
    pub max_iterations: u32,

    /// Convergence threshold on the free-DOF gradient norm.
    pub tolerance: f64,

    /// Relative residual tolerance of the CG inner solve.
    pub cg_tolerance: f64,

    /// Maximum CG iterations per Newton step.
    pub cg_max_iterations: u32,

    /// Backtracking trials (α = 1, ½, ¼, ...) before the smallest is taken.
    pub line_search_max_steps: u32,

    /// Largest energy increase a line-search trial may show and still pass.
    pub line_search_tolerance: f64,

    /// Linear solver used for the Newton direction.
    pub linear_solver: LinearSolverKind,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_NEWTON_ITERATIONS,
            tolerance: DEFAULT_NEWTON_TOLERANCE,
            cg_tolerance: DEFAULT_CG_TOLERANCE,
            cg_max_iterations: DEFAULT_CG_ITERATIONS,
            line_search_max_steps: DEFAULT_LINE_SEARCH_STEPS,
            line_search_tolerance: DEFAULT_LINE_SEARCH_TOLERANCE,
            linear_solver: LinearSolverKind::Pcg,
        }
    }
}

/// Configuration for the affine body simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Timestep in seconds.
    pub timestep: f64,

    /// Gravity vector [gx, gy, gz] in m/s².
    pub gravity: [f64; 3],

    /// Penalty stiffness `k` of `E = k·d²`.
    pub contact_stiffness: f64,

    /// Deepest penetration still accepted as a valid contact.
    pub contact_threshold: f64,

    /// Search radius handed to the proximity query.
    pub query_distance: f64,

    /// Contact buffer capacity. Extra contacts are dropped with a warning.
    pub max_contacts: usize,

    /// Orthogonality stiffness for bodies that do not set their own.
    pub elastic_stiffness: f64,

    /// Newton-CG controls.
    pub newton: NewtonConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            timestep: DEFAULT_DT,
            gravity: [0.0, -GRAVITY, 0.0],
            contact_stiffness: DEFAULT_CONTACT_STIFFNESS,
            contact_threshold: DEFAULT_CONTACT_THRESHOLD,
            query_distance: DEFAULT_QUERY_DISTANCE,
            max_contacts: DEFAULT_MAX_CONTACTS,
            elastic_stiffness: DEFAULT_ELASTIC_STIFFNESS,
            newton: NewtonConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Creates a config for debugging (fewer iterations, looser tolerance).
    pub fn debug() -> Self {
        Self {
            newton: NewtonConfig {
                max_iterations: 3,
                tolerance: 1.0,
                cg_max_iterations: 20,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Creates a high-quality config (smaller step, tighter tolerances, direct solve).
    pub fn high_quality() -> Self {
        Self {
            timestep: 0.005,
            newton: NewtonConfig {
                max_iterations: 30,
                tolerance: 1e-3,
                cg_tolerance: 1e-8,
                cg_max_iterations: 200,
                line_search_max_steps: 10,
                line_search_tolerance: 1e-6,
                linear_solver: LinearSolverKind::Cholesky,
            },
            ..Default::default()
        }
    }

    /// Parses a TOML document and validates it.
    pub fn from_toml_str(text: &str) -> AbdResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| AbdError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> AbdResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Serializes the config as TOML.
    pub fn to_toml_string(&self) -> AbdResult<String> {
        toml::to_string_pretty(self).map_err(|e| AbdError::Serialization(e.to_string()))
    }

    /// Rejects values the solver cannot run with.
    pub fn validate(&self) -> AbdResult<()> {
        positive("timestep", self.timestep)?;
        positive("contact_stiffness", self.contact_stiffness)?;
        positive("contact_threshold", self.contact_threshold)?;
        positive("query_distance", self.query_distance)?;
        positive("elastic_stiffness", self.elastic_stiffness)?;
        positive("newton.tolerance", self.newton.tolerance)?;
        positive("newton.cg_tolerance", self.newton.cg_tolerance)?;
        if !(self.newton.line_search_tolerance.is_finite() && self.newton.line_search_tolerance >= 0.0)
        {
            return Err(AbdError::InvalidConfig(format!(
                "newton.line_search_tolerance must be non-negative, got {}",
                self.newton.line_search_tolerance
            )));
        }
        if self.gravity.iter().any(|g| !g.is_finite()) {
            return Err(AbdError::InvalidConfig(format!(
                "gravity must be finite, got {:?}",
                self.gravity
            )));
        }
        if self.max_contacts == 0 {
            return Err(AbdError::InvalidConfig("max_contacts must be at least 1".into()));
        }
        if self.newton.cg_max_iterations == 0 {
            return Err(AbdError::InvalidConfig(
                "newton.cg_max_iterations must be at least 1".into(),
            ));
        }
        if self.newton.line_search_max_steps == 0 {
            return Err(AbdError::InvalidConfig(
                "newton.line_search_max_steps must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> AbdResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AbdError::InvalidConfig(format!(
            "{name} must be positive, got {value}"
        )))
    }
}
