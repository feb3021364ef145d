//! Jacobi-preconditioned conjugate gradient.
//!
//! The default linear solver for the Newton system. Only matrix-vector
//! products and the diagonal are needed, so it works on the projected
//! system without any factorization.

use abd_types::constants::{DEFAULT_CG_ITERATIONS, DEFAULT_CG_TOLERANCE};
use abd_types::{AbdError, AbdResult};

use crate::linalg::{axpy, dot, norm};
use crate::sparse::{CsrMatrix, SolveStats, SparseSolver};

/// Preconditioned conjugate gradient with a diagonal (Jacobi) preconditioner.
#[derive(Debug, Clone)]
pub struct PcgSolver {
    /// Relative residual tolerance `‖r‖ / ‖b‖`.
    pub tolerance: f64,
    /// Maximum CG iterations per solve.
    pub max_iterations: u32,
    matrix: Option<CsrMatrix>,
    inv_diag: Vec<f64>,
}

impl PcgSolver {
    /// Creates a solver with the given tolerance and iteration cap.
    pub fn new(tolerance: f64, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
            matrix: None,
            inv_diag: Vec::new(),
        }
    }

    fn dimension(&self) -> usize {
        self.inv_diag.len()
    }

    fn precondition(&self, r: &[f64], z: &mut [f64]) {
        for ((zi, ri), di) in z.iter_mut().zip(r).zip(&self.inv_diag) {
            *zi = ri * di;
        }
    }
}

impl Default for PcgSolver {
    fn default() -> Self {
        Self::new(DEFAULT_CG_TOLERANCE, DEFAULT_CG_ITERATIONS)
    }
}

impl SparseSolver for PcgSolver {
    fn factorize(&mut self, matrix: &CsrMatrix) -> AbdResult<()> {
        matrix.check_square(matrix.rows)?;
        // Non-positive pivots fall back to the identity on that row.
        self.inv_diag = matrix
            .diagonal()
            .into_iter()
            .map(|d| if d > 0.0 && d.is_finite() { 1.0 / d } else { 1.0 })
            .collect();
        self.matrix = Some(matrix.clone());
        Ok(())
    }

    fn solve(&self, rhs: &[f64], solution: &mut [f64]) -> AbdResult<SolveStats> {
        let a = self
            .matrix
            .as_ref()
            .ok_or_else(|| AbdError::NotInitialized("PCG solver has no matrix".into()))?;
        let n = self.dimension();
        if rhs.len() != n {
            return Err(AbdError::Dimension {
                expected: n,
                actual: rhs.len(),
            });
        }
        if solution.len() != n {
            return Err(AbdError::Dimension {
                expected: n,
                actual: solution.len(),
            });
        }

        solution.iter_mut().for_each(|x| *x = 0.0);
        let b_norm = norm(rhs);
        if n == 0 || b_norm == 0.0 {
            return Ok(SolveStats {
                iterations: 0,
                residual: 0.0,
                converged: true,
            });
        }

        let mut r = rhs.to_vec();
        let mut z = vec![0.0; n];
        self.precondition(&r, &mut z);
        let mut p = z.clone();
        let mut ap = vec![0.0; n];
        let mut rz = dot(&r, &z);

        let mut iterations = 0;
        let mut rel = 1.0;
        while iterations < self.max_iterations {
            a.mul_vec(&p, &mut ap);
            let pap = dot(&p, &ap);
            if pap <= 0.0 || !pap.is_finite() {
                if iterations == 0 {
                    // Indefinite along the first direction: return the
                    // preconditioned right-hand side.
                    solution.copy_from_slice(&z);
                }
                tracing::debug!(iterations, pap, "PCG hit non-positive curvature");
                break;
            }

            let alpha = rz / pap;
            axpy(alpha, &p, solution);
            axpy(-alpha, &ap, &mut r);
            iterations += 1;

            rel = norm(&r) / b_norm;
            if rel < self.tolerance {
                return Ok(SolveStats {
                    iterations,
                    residual: rel,
                    converged: true,
                });
            }

            self.precondition(&r, &mut z);
            let rz_new = dot(&r, &z);
            let beta = rz_new / rz;
            rz = rz_new;
            for (pi, zi) in p.iter_mut().zip(&z) {
                *pi = zi + beta * *pi;
            }
        }

        Ok(SolveStats {
            iterations,
            residual: rel,
            converged: false,
        })
    }

    fn is_factorized(&self) -> bool {
        self.matrix.is_some()
    }

    fn name(&self) -> &str {
        "pcg"
    }
}
