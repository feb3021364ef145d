//! # abd-math
//!
//! Linear algebra primitives for the affine body simulator.
//!
//! Provides:
//! - Re-exports of `glam` double-precision types (`DVec3`, `DMat3`) for geometry
//! - Fixed-size 12-dimensional `nalgebra` aliases for generalized coordinates
//! - The kinematic map `x = J(X)·q` relating local points to world positions
//! - Scalar CSR and 12×12 block-CSR sparse matrices
//! - Pinning projection onto free degrees of freedom
//! - Sparse solvers: Jacobi-preconditioned CG and faer sparse Cholesky
//! - Deterministic reductions for parallel kernels

pub mod block_sparse;
pub mod faer_solver;
pub mod kinematic;
pub mod linalg;
pub mod pcg;
pub mod projection;
pub mod reduce;
pub mod sparse;

// Re-export glam types as the canonical geometry types.
pub use glam::{DMat3, DVec3};

pub use block_sparse::{BlockCsrMatrix, BlockPattern};
pub use linalg::{Mat12, Mat3x12, Mat9, Vec12};
pub use projection::PinningProjection;
pub use sparse::{CsrMatrix, SolveStats, SparseSolver};
