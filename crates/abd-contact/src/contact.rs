//! Contact record.
//!
//! A `Contact` is created fresh every step, consumed by that step's
//! Newton solve and then dropped.

use abd_math::kinematic::world_position;
use abd_math::{DVec3, Vec12};
use serde::{Deserialize, Serialize};

/// A vertex of body `a` found inside body `b`.
///
/// The normal is held fixed for the duration of one Newton solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Body owning the penetrating vertex.
    pub body_a: u32,
    /// Body being penetrated.
    pub body_b: u32,
    /// Index of the penetrating vertex in body `a`'s mesh.
    pub vertex: u32,
    /// Contact point in body `a`'s local frame (the vertex itself).
    pub ref_a: DVec3,
    /// Closest surface point in body `b`'s local frame.
    pub ref_b: DVec3,
    /// Unit world-space outward normal of `b` at the closest point.
    pub normal: DVec3,
    /// Penetration depth at detection time (positive = penetrating).
    pub depth: f64,
    /// Whether the contact passed the threshold and sign filters.
    pub valid: bool,
}

impl Contact {
    /// World positions of both reference points under the given poses.
    pub fn world_points(&self, q_a: &Vec12, q_b: &Vec12) -> (DVec3, DVec3) {
        (world_position(q_a, self.ref_a), world_position(q_b, self.ref_b))
    }

    /// Signed penetration `d = n · (x_b − x_a)` under the given poses.
    pub fn penetration(&self, q_a: &Vec12, q_b: &Vec12) -> f64 {
        let (x_a, x_b) = self.world_points(q_a, q_b);
        self.normal.dot(x_b - x_a)
    }

    /// Returns true if the contact is valid and penetrating.
    pub fn is_penetrating(&self) -> bool {
        self.valid && self.depth > 0.0
    }

    /// The unordered body pair `(min, max)`.
    pub fn pair(&self) -> (u32, u32) {
        if self.body_a < self.body_b {
            (self.body_a, self.body_b)
        } else {
            (self.body_b, self.body_a)
        }
    }
}
