//! Proximity query capability.
//!
//! The physics core only needs "closest point, face normal, distance,
//! inside or outside" for a point against a mesh. [`ProximityQuery`] is
//! that contract; [`BruteForceQuery`] is a reference implementation that
//! scans every triangle.

use std::f64::consts::PI;

use abd_math::DVec3;
use abd_mesh::TriangleMesh;
use serde::{Deserialize, Serialize};

use crate::geometry::{closest_point_on_triangle, solid_angle};

/// Result of one point-versus-mesh query, in the mesh's local frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProximityHit {
    /// Closest point on the mesh surface.
    pub closest_point: DVec3,
    /// Unit outward normal of the face containing the closest point.
    pub face_normal: DVec3,
    /// Unsigned distance from the query point to `closest_point`.
    pub distance: f64,
    /// `-1.0` if the query point is inside the mesh, `+1.0` otherwise.
    pub sign: f64,
    /// Index of the closest triangle.
    pub face: u32,
}

impl ProximityHit {
    /// Signed distance (negative inside).
    pub fn signed_distance(&self) -> f64 {
        self.sign * self.distance
    }

    /// Returns true if the query point lies inside the mesh.
    pub fn is_inside(&self) -> bool {
        self.sign < 0.0
    }
}

/// Trait for point-versus-mesh proximity services.
///
/// Implementations must be deterministic and safe to call from many
/// threads at once.
pub trait ProximityQuery: Send + Sync {
    /// Queries `point` (in `mesh`'s local frame) against `mesh`.
    ///
    /// Returns `None` if the closest surface point is farther than
    /// `max_distance`.
    fn query(&self, mesh: &TriangleMesh, point: DVec3, max_distance: f64)
        -> Option<ProximityHit>;

    /// Returns the query strategy name.
    fn name(&self) -> &str;
}

/// Exhaustive closest-point search with a generalized winding number sign.
///
/// `O(triangles)` per query. Points outside the mesh bounds padded by
/// `max_distance` are rejected before the triangle scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceQuery;

impl BruteForceQuery {
    /// Creates a new brute-force query.
    pub fn new() -> Self {
        Self
    }

    /// Generalized winding number of `mesh` around `point`.
    ///
    /// ≈1 inside a closed outward-wound mesh, ≈0 outside.
    pub fn winding_number(mesh: &TriangleMesh, point: DVec3) -> f64 {
        let total: f64 = (0..mesh.triangle_count())
            .map(|t| {
                let [a, b, c] = mesh.triangle_positions(t);
                solid_angle(point, a, b, c)
            })
            .sum();
        total / (4.0 * PI)
    }
}

impl ProximityQuery for BruteForceQuery {
    fn query(
        &self,
        mesh: &TriangleMesh,
        point: DVec3,
        max_distance: f64,
    ) -> Option<ProximityHit> {
        if mesh.bounds().distance_to(point) > max_distance {
            return None;
        }

        let mut best: Option<(u32, DVec3, f64)> = None;
        for t in 0..mesh.triangle_count() {
            let [a, b, c] = mesh.triangle_positions(t);
            let cp = closest_point_on_triangle(point, a, b, c);
            let d2 = cp.distance_squared(point);
            if best.map_or(true, |(_, _, bd2)| d2 < bd2) {
                best = Some((t as u32, cp, d2));
            }
        }

        let (face, closest_point, d2) = best?;
        let distance = d2.sqrt();
        if distance > max_distance {
            return None;
        }

        let sign = if Self::winding_number(mesh, point) > 0.5 {
            -1.0
        } else {
            1.0
        };

        Some(ProximityHit {
            closest_point,
            face_normal: mesh.face_normal(face as usize),
            distance,
            sign,
            face,
        })
    }

    fn name(&self) -> &str {
        "brute_force"
    }
}
