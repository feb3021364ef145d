//! Fixed-size aliases for per-body generalized-coordinate algebra,
//! plus dense vector helpers shared by the solvers.

use nalgebra::{SMatrix, SVector};

/// One body's generalized coordinate vector (row-major flattened 3×4 `[F | t]`).
pub type Vec12 = SVector<f64, 12>;

/// A 12×12 per-body (or per-body-pair) block.
pub type Mat12 = SMatrix<f64, 12, 12>;

/// The kinematic Jacobian shape.
pub type Mat3x12 = SMatrix<f64, 3, 12>;

/// The linear-part (`F`) sub-block of a 12×12 block.
pub type Mat9 = SMatrix<f64, 9, 9>;

/// Indices of the 9 linear-part entries inside a 12-vector.
pub const LINEAR_DOFS: [usize; 9] = [0, 1, 2, 4, 5, 6, 8, 9, 10];

/// Indices of the 3 translation entries inside a 12-vector.
pub const TRANSLATION_DOFS: [usize; 3] = [3, 7, 11];

/// Extracts the 9×9 `F`-submatrix of a 12×12 block.
pub fn linear_block(m: &Mat12) -> Mat9 {
    Mat9::from_fn(|r, c| m[(LINEAR_DOFS[r], LINEAR_DOFS[c])])
}

/// Dot product of two equal-length slices.
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Euclidean norm of a slice.
#[inline]
pub fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// `y += alpha * x`.
#[inline]
pub fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}
