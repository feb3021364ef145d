//! Material database with built-in presets.
//!
//! Densities are textbook values; stiffnesses are orthogonality penalty
//! weights, chosen large enough that bodies stay visually rigid at the
//! default timestep.

use std::collections::HashMap;

use crate::properties::MaterialProperties;

/// A named collection of material presets.
///
/// Materials are looked up by name (e.g., "steel", "rubber").
/// Custom materials can be registered at runtime.
#[derive(Debug, Clone)]
pub struct MaterialDatabase {
    materials: HashMap<String, MaterialProperties>,
}

impl MaterialDatabase {
    /// Creates a new database with the 5 built-in presets.
    pub fn with_defaults() -> Self {
        let mut db = Self::empty();

        db.register(MaterialProperties::default());
        db.register(steel());
        db.register(wood());
        db.register(rubber());
        db.register(foam());

        db
    }

    /// Creates an empty database.
    pub fn empty() -> Self {
        Self {
            materials: HashMap::new(),
        }
    }

    /// Registers a material. Overwrites if the name already exists.
    pub fn register(&mut self, props: MaterialProperties) {
        self.materials.insert(props.name.clone(), props);
    }

    /// Looks up a material by name. Returns `None` if not found.
    pub fn get(&self, name: &str) -> Option<&MaterialProperties> {
        self.materials.get(name)
    }

    /// Returns all registered material names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.materials.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered materials.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Returns true if the database is empty.
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl Default for MaterialDatabase {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ─── Built-in Presets ─────────────────────────────────────────────────

/// Structural steel. Very dense and effectively rigid.
fn steel() -> MaterialProperties {
    MaterialProperties::new("steel", 7850.0, 1.0e10)
}

/// Hardwood.
fn wood() -> MaterialProperties {
    MaterialProperties::new("wood", 700.0, 1.0e8)
}

/// Soft rubber. Visibly squashes on impact.
fn rubber() -> MaterialProperties {
    MaterialProperties::new("rubber", 1100.0, 1.0e5)
}

/// Light packing foam.
fn foam() -> MaterialProperties {
    MaterialProperties::new("foam", 50.0, 1.0e4)
}
