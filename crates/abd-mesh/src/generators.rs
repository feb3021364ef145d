//! Procedural mesh generators for scenes, benchmarks, and testing.
//!
//! All generators produce closed, outward-wound (counter-clockwise seen
//! from outside) meshes with deterministic vertex ordering.

use abd_math::DVec3;

use crate::mesh::TriangleMesh;

/// Corner-indexed faces of a box whose vertex `v` sits at
/// `(v & 1, (v >> 1) & 1, (v >> 2) & 1)` in unit coordinates.
const BOX_TRIANGLES: [[u32; 3]; 12] = [
    [0, 4, 6], [0, 6, 2], // -X
    [1, 3, 7], [1, 7, 5], // +X
    [0, 1, 5], [0, 5, 4], // -Y
    [2, 6, 7], [2, 7, 3], // +Y
    [0, 2, 3], [0, 3, 1], // -Z
    [4, 5, 7], [4, 7, 6], // +Z
];

/// Generates an axis-aligned box spanning `[min, max]`.
pub fn cuboid_between(min: DVec3, max: DVec3) -> TriangleMesh {
    let mut mesh = TriangleMesh::with_capacity(8, 12);
    for v in 0..8u32 {
        let x = if v & 1 == 0 { min.x } else { max.x };
        let y = if v & 2 == 0 { min.y } else { max.y };
        let z = if v & 4 == 0 { min.z } else { max.z };
        mesh.push_vertex(DVec3::new(x, y, z));
    }
    for [a, b, c] in BOX_TRIANGLES {
        mesh.push_triangle(a, b, c);
    }
    mesh
}

/// Generates a box centered at the origin with the given half extents.
///
/// # Example
/// ```
/// use abd_mesh::generators::cuboid;
/// use abd_math::DVec3;
/// let mesh = cuboid(DVec3::splat(0.5));
/// assert_eq!(mesh.vertex_count(), 8);
/// assert_eq!(mesh.triangle_count(), 12);
/// ```
pub fn cuboid(half_extents: DVec3) -> TriangleMesh {
    cuboid_between(-half_extents, half_extents)
}

/// Generates a floor slab whose top face lies at `y = 0`.
///
/// The slab spans `[-width/2, width/2]` in X, `[-depth/2, depth/2]` in Z
/// and `[-thickness, 0]` in Y.
pub fn slab(width: f64, depth: f64, thickness: f64) -> TriangleMesh {
    cuboid_between(
        DVec3::new(-0.5 * width, -thickness, -0.5 * depth),
        DVec3::new(0.5 * width, 0.0, 0.5 * depth),
    )
}

/// Generates the corner tetrahedron `(0,0,0), (s,0,0), (0,s,0), (0,0,s)`.
///
/// Its volume is `s³ / 6`.
pub fn tetrahedron(size: f64) -> TriangleMesh {
    let mut mesh = TriangleMesh::with_capacity(4, 4);
    mesh.push_vertex(DVec3::ZERO);
    mesh.push_vertex(DVec3::new(size, 0.0, 0.0));
    mesh.push_vertex(DVec3::new(0.0, size, 0.0));
    mesh.push_vertex(DVec3::new(0.0, 0.0, size));
    mesh.push_triangle(0, 2, 1);
    mesh.push_triangle(0, 1, 3);
    mesh.push_triangle(0, 3, 2);
    mesh.push_triangle(1, 2, 3);
    mesh
}

/// Generates a closed UV sphere centered at the origin.
///
/// Uses a single vertex at each pole and no seam duplicates, so the mesh
/// is watertight.
///
/// # Arguments
/// - `radius`: sphere radius in meters.
/// - `stacks`: latitude divisions (at least 2).
/// - `slices`: longitude divisions (at least 3).
pub fn uv_sphere(radius: f64, stacks: usize, slices: usize) -> TriangleMesh {
    let stacks = stacks.max(2);
    let slices = slices.max(3);
    let ring_count = stacks - 1;
    let vertex_count = 2 + ring_count * slices;
    let tri_count = 2 * slices * (stacks - 1);
    let mut mesh = TriangleMesh::with_capacity(vertex_count, tri_count);

    let top = mesh.push_vertex(DVec3::new(0.0, radius, 0.0));
    for i in 1..stacks {
        let phi = std::f64::consts::PI * i as f64 / stacks as f64;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for j in 0..slices {
            let theta = 2.0 * std::f64::consts::PI * j as f64 / slices as f64;
            let (sin_theta, cos_theta) = theta.sin_cos();
            mesh.push_vertex(
                radius * DVec3::new(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta),
            );
        }
    }
    let bottom = mesh.push_vertex(DVec3::new(0.0, -radius, 0.0));

    let ring = |i: usize, j: usize| (1 + (i - 1) * slices + j % slices) as u32;

    for j in 0..slices {
        mesh.push_triangle(top, ring(1, j + 1), ring(1, j));
    }
    for i in 1..ring_count {
        for j in 0..slices {
            let a = ring(i, j);
            let b = ring(i + 1, j);
            let c = ring(i, j + 1);
            let d = ring(i + 1, j + 1);
            mesh.push_triangle(a, c, b);
            mesh.push_triangle(c, d, b);
        }
    }
    for j in 0..slices {
        mesh.push_triangle(ring(ring_count, j), ring(ring_count, j + 1), bottom);
    }

    mesh
}
