//! Strongly-typed identifiers for simulation entities.

use serde::{Deserialize, Serialize};

use crate::constants::DOFS_PER_BODY;

/// Index of a body in the simulator's body list.
///
/// A body owns the 12 consecutive generalized coordinates starting at
/// [`BodyId::dof_offset`] in every global vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl BodyId {
    /// Returns the raw index as `usize` for array indexing.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// First global DOF index owned by this body.
    #[inline]
    pub fn dof_offset(self) -> usize {
        self.index() * DOFS_PER_BODY
    }

    /// Global DOF range owned by this body.
    #[inline]
    pub fn dof_range(self) -> std::ops::Range<usize> {
        let start = self.dof_offset();
        start..start + DOFS_PER_BODY
    }
}

impl From<u32> for BodyId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl From<usize> for BodyId {
    fn from(val: usize) -> Self {
        Self(val as u32)
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "body#{}", self.0)
    }
}
