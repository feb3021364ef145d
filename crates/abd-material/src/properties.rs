//! Physical material properties.

use abd_types::constants::{DEFAULT_DENSITY, DEFAULT_ELASTIC_STIFFNESS};
use abd_types::{AbdError, AbdResult};
use serde::{Deserialize, Serialize};

/// Physical properties of a body material.
///
/// | Field       | Used by                                       |
/// |-------------|-----------------------------------------------|
/// | `density`   | mass operator (scales the 12×12 mass block)   |
/// | `stiffness` | orthogonality energy `½·k·V·‖FᵀF − I‖²`       |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialProperties {
    /// Human-readable name (e.g., "steel").
    pub name: String,

    /// Volumetric density in kg/m³.
    pub density: f64,

    /// Orthogonality stiffness `k`. Large values keep the body near rigid.
    pub stiffness: f64,
}

impl MaterialProperties {
    /// Creates a material with the given name, density, and stiffness.
    pub fn new(name: impl Into<String>, density: f64, stiffness: f64) -> Self {
        Self {
            name: name.into(),
            density,
            stiffness,
        }
    }

    /// Mass of a body of this material with the given volume.
    pub fn mass(&self, volume: f64) -> f64 {
        self.density * volume
    }

    /// Rejects non-positive or non-finite parameters.
    pub fn validate(&self) -> AbdResult<()> {
        if !(self.density.is_finite() && self.density > 0.0) {
            return Err(AbdError::InvalidConfig(format!(
                "material '{}': density must be positive, got {}",
                self.name, self.density
            )));
        }
        if !(self.stiffness.is_finite() && self.stiffness > 0.0) {
            return Err(AbdError::InvalidConfig(format!(
                "material '{}': stiffness must be positive, got {}",
                self.name, self.stiffness
            )));
        }
        Ok(())
    }
}

impl Default for MaterialProperties {
    fn default() -> Self {
        Self::new("default", DEFAULT_DENSITY, DEFAULT_ELASTIC_STIFFNESS)
    }
}
