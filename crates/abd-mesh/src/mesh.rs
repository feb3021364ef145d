//! Core triangle mesh type with SoA (Structure of Arrays) layout.
//!
//! The SoA layout stores each coordinate channel contiguously:
//! - `pos_x: [x0, x1, x2, ...]`
//! - `pos_y: [y0, y1, y2, ...]`
//! - `pos_z: [z0, z1, z2, ...]`
//!
//! Closed meshes must be wound counter-clockwise when seen from outside,
//! so that face normals point outward. The mass operator and the
//! inside/outside test both rely on it.

use abd_math::DVec3;
use abd_types::constants::DEGENERATE_AREA_THRESHOLD;
use abd_types::{AbdError, AbdResult};
use serde::{Deserialize, Serialize};

use crate::bounds::Aabb;

/// A triangle mesh stored in Structure-of-Arrays layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    /// X coordinates of all vertices.
    pub pos_x: Vec<f64>,
    /// Y coordinates of all vertices.
    pub pos_y: Vec<f64>,
    /// Z coordinates of all vertices.
    pub pos_z: Vec<f64>,

    /// Triangle indices, each triangle is [v0, v1, v2].
    /// Stored flat: `[t0v0, t0v1, t0v2, t1v0, t1v1, t1v2, ...]`
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    /// Returns the number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos_x.len()
    }

    /// Returns the number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns the position of vertex `i`.
    #[inline]
    pub fn position(&self, i: usize) -> DVec3 {
        DVec3::new(self.pos_x[i], self.pos_y[i], self.pos_z[i])
    }

    /// Returns the three vertex indices of triangle `t`.
    #[inline]
    pub fn triangle(&self, t: usize) -> [u32; 3] {
        let base = t * 3;
        [self.indices[base], self.indices[base + 1], self.indices[base + 2]]
    }

    /// Returns the three corner positions of triangle `t`.
    #[inline]
    pub fn triangle_positions(&self, t: usize) -> [DVec3; 3] {
        let [a, b, c] = self.triangle(t);
        [
            self.position(a as usize),
            self.position(b as usize),
            self.position(c as usize),
        ]
    }

    /// Sets the position of vertex `i`.
    #[inline]
    pub fn set_position(&mut self, i: usize, p: DVec3) {
        self.pos_x[i] = p.x;
        self.pos_y[i] = p.y;
        self.pos_z[i] = p.z;
    }

    /// Iterates all vertex positions in index order.
    pub fn positions(&self) -> impl Iterator<Item = DVec3> + '_ {
        (0..self.vertex_count()).map(|i| self.position(i))
    }

    /// Creates an empty mesh with pre-allocated capacity.
    pub fn with_capacity(vertex_capacity: usize, triangle_capacity: usize) -> Self {
        Self {
            pos_x: Vec::with_capacity(vertex_capacity),
            pos_y: Vec::with_capacity(vertex_capacity),
            pos_z: Vec::with_capacity(vertex_capacity),
            indices: Vec::with_capacity(triangle_capacity * 3),
        }
    }

    /// Appends a vertex and returns its index.
    pub fn push_vertex(&mut self, p: DVec3) -> u32 {
        let i = self.pos_x.len() as u32;
        self.pos_x.push(p.x);
        self.pos_y.push(p.y);
        self.pos_z.push(p.z);
        i
    }

    /// Appends a triangle.
    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Unnormalized face normal of triangle `t` (length = 2 × area).
    #[inline]
    pub fn face_cross(&self, t: usize) -> DVec3 {
        let [a, b, c] = self.triangle_positions(t);
        (b - a).cross(c - a)
    }

    /// Unit outward face normal of triangle `t` (zero for degenerate faces).
    pub fn face_normal(&self, t: usize) -> DVec3 {
        self.face_cross(t).normalize_or_zero()
    }

    /// Area of triangle `t`.
    pub fn face_area(&self, t: usize) -> f64 {
        0.5 * self.face_cross(t).length()
    }

    /// Unit face normals of every triangle.
    pub fn face_normals(&self) -> Vec<DVec3> {
        (0..self.triangle_count()).map(|t| self.face_normal(t)).collect()
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        (0..self.triangle_count()).map(|t| self.face_area(t)).sum()
    }

    /// Axis-aligned bounds of all vertices.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.positions())
    }

    /// Mean of all vertex positions.
    pub fn centroid(&self) -> DVec3 {
        let n = self.vertex_count();
        if n == 0 {
            return DVec3::ZERO;
        }
        self.positions().fold(DVec3::ZERO, |acc, p| acc + p) / n as f64
    }

    /// Returns a copy with every vertex moved by `offset`.
    pub fn translated(&self, offset: DVec3) -> Self {
        let mut out = self.clone();
        for i in 0..out.vertex_count() {
            out.set_position(i, self.position(i) + offset);
        }
        out
    }

    /// Validates mesh integrity.
    ///
    /// Checks:
    /// - All SoA arrays have the same length
    /// - The mesh has at least one triangle
    /// - Triangle indices are within bounds
    /// - Positions are finite
    /// - No degenerate triangles (repeated indices or zero area)
    pub fn validate(&self) -> AbdResult<()> {
        let n = self.pos_x.len();

        if self.pos_y.len() != n || self.pos_z.len() != n {
            return Err(AbdError::InvalidMesh(
                "Position arrays have inconsistent lengths".into(),
            ));
        }

        if self.indices.len() % 3 != 0 {
            return Err(AbdError::InvalidMesh(
                "Index count is not divisible by 3".into(),
            ));
        }
        if self.indices.is_empty() {
            return Err(AbdError::InvalidMesh("Mesh has no triangles".into()));
        }

        for (i, &idx) in self.indices.iter().enumerate() {
            if idx as usize >= n {
                return Err(AbdError::InvalidMesh(format!(
                    "Index {} at position {} is out of range (vertex count: {})",
                    idx, i, n
                )));
            }
        }

        if let Some(i) = (0..n).find(|&i| !self.position(i).is_finite()) {
            return Err(AbdError::InvalidMesh(format!(
                "Vertex {} has a non-finite position",
                i
            )));
        }

        for t in 0..self.triangle_count() {
            let [a, b, c] = self.triangle(t);
            if a == b || b == c || a == c {
                return Err(AbdError::InvalidMesh(format!(
                    "Triangle {} has repeated vertex indices: [{}, {}, {}]",
                    t, a, b, c
                )));
            }
            if self.face_area(t) < DEGENERATE_AREA_THRESHOLD {
                return Err(AbdError::InvalidMesh(format!(
                    "Triangle {} has zero area",
                    t
                )));
            }
        }

        Ok(())
    }

    /// Constructs a mesh from interleaved AoS position data.
    ///
    /// Converts `[x0, y0, z0, x1, y1, z1, ...]` to SoA layout and
    /// validates the result.
    pub fn from_interleaved(positions: &[f64], indices: &[u32]) -> AbdResult<Self> {
        if positions.len() % 3 != 0 {
            return Err(AbdError::InvalidMesh(
                "Interleaved positions length not divisible by 3".into(),
            ));
        }

        let n = positions.len() / 3;
        let mut mesh = Self::with_capacity(n, indices.len() / 3);
        for p in positions.chunks_exact(3) {
            mesh.push_vertex(DVec3::new(p[0], p[1], p[2]));
        }
        mesh.indices = indices.to_vec();

        mesh.validate()?;
        Ok(mesh)
    }

    /// Constructs a mesh from vertex positions and index triples.
    pub fn from_vertices(vertices: &[DVec3], triangles: &[[u32; 3]]) -> AbdResult<Self> {
        let mut mesh = Self::with_capacity(vertices.len(), triangles.len());
        for &v in vertices {
            mesh.push_vertex(v);
        }
        for &[a, b, c] in triangles {
            mesh.push_triangle(a, b, c);
        }
        mesh.validate()?;
        Ok(mesh)
    }
}
