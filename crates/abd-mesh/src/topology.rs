//! Mesh topology queries.
//!
//! Builds edge adjacency from the triangle index buffer. Bodies use it at
//! setup to tell closed solids from open thin shells and to catch
//! inconsistently wound input.

use std::collections::BTreeMap;

use crate::mesh::TriangleMesh;

/// Precomputed edge adjacency for a triangle mesh.
#[derive(Debug, Clone)]
pub struct Topology {
    /// Unique edges as `[v_min, v_max]` pairs, sorted.
    pub edges: Vec<[u32; 2]>,

    /// For each edge, the adjacent triangles.
    /// Boundary edges have exactly 1 adjacent triangle.
    pub edge_triangles: Vec<Vec<u32>>,

    /// Number of directed half-edges that appear more than once.
    /// Non-zero means neighbouring faces disagree on winding.
    pub duplicate_half_edges: usize,
}

impl Topology {
    /// Build topology from a triangle mesh.
    pub fn build(mesh: &TriangleMesh) -> Self {
        // Key: (min_vertex, max_vertex) canonicalizes edge direction.
        let mut edge_map: BTreeMap<(u32, u32), Vec<u32>> = BTreeMap::new();
        let mut half_edges: BTreeMap<(u32, u32), usize> = BTreeMap::new();

        for t in 0..mesh.triangle_count() {
            let [a, b, c] = mesh.triangle(t);
            for (v0, v1) in [(a, b), (b, c), (c, a)] {
                let key = if v0 < v1 { (v0, v1) } else { (v1, v0) };
                edge_map.entry(key).or_default().push(t as u32);
                *half_edges.entry((v0, v1)).or_default() += 1;
            }
        }

        let duplicate_half_edges = half_edges.values().filter(|&&n| n > 1).count();
        let (edges, edge_triangles) = edge_map
            .into_iter()
            .map(|((v0, v1), tris)| ([v0, v1], tris))
            .unzip();

        Self {
            edges,
            edge_triangles,
            duplicate_half_edges,
        }
    }

    /// Returns the number of boundary edges (edges with only 1 adjacent triangle).
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_triangles
            .iter()
            .filter(|tris| tris.len() == 1)
            .count()
    }

    /// Returns the number of edges shared by more than two triangles.
    pub fn non_manifold_edge_count(&self) -> usize {
        self.edge_triangles.iter().filter(|tris| tris.len() > 2).count()
    }

    /// Returns true if the mesh is closed (no boundary edges).
    pub fn is_closed(&self) -> bool {
        self.boundary_edge_count() == 0
    }

    /// Returns true if every shared edge is traversed in opposite
    /// directions by its two faces.
    pub fn is_consistently_oriented(&self) -> bool {
        self.duplicate_half_edges == 0
    }
}
