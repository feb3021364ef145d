//! # abd-mesh
//!
//! Triangle mesh representation for affine bodies. Meshes live in the
//! body's local (rest) frame and are never modified during simulation;
//! world positions come from the kinematic map.
//!
//! ## Key Types
//!
//! - [`TriangleMesh`]: positions in Structure-of-Arrays layout plus a flat
//!   triangle index buffer.
//! - [`Aabb`]: axis-aligned bounds used for proximity early-outs.
//! - [`Topology`]: edge adjacency for closedness and orientation checks.
//! - Procedural generators for scenes and benchmarks (cuboid, tetrahedron,
//!   UV sphere, floor slab).

pub mod bounds;
pub mod generators;
pub mod mesh;
pub mod topology;

pub use bounds::Aabb;
pub use mesh::TriangleMesh;
pub use topology::Topology;
