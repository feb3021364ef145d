//! Sparse Cholesky solver backed by `faer`.
//!
//! Implements the [`SparseSolver`] trait using faer's supernodal LLᵀ
//! factorization. The Newton Hessian changes every iteration, so unlike
//! the iterative solver this one refactorizes on every `factorize` call.
//! It fails on indefinite systems; callers fall back to PCG.
//!
//! ## Workflow
//! 1. `factorize(matrix)` converts CSR→CSC, computes symbolic + numeric LLᵀ
//! 2. `solve(rhs, solution)` runs forward/backward substitution

use faer::Side;
use faer::linalg::solvers::Solve;
use faer::sparse::SparseColMat;
use faer::sparse::Triplet;
use faer::sparse::linalg::solvers::{Llt, SymbolicLlt};

use abd_types::{AbdError, AbdResult};

use crate::linalg::norm;
use crate::sparse::{CsrMatrix, SolveStats, SparseSolver};

/// Sparse Cholesky (LLᵀ) solver using `faer`.
pub struct FaerSolver {
    /// Cached LLᵀ factorization.
    factorization: Option<Llt<usize, f64>>,
    /// Matrix kept for residual reporting.
    matrix: Option<CsrMatrix>,
    /// Matrix dimension (N×N).
    dimension: usize,
}

impl FaerSolver {
    /// Creates a new solver (unfactorized).
    pub fn new() -> Self {
        Self {
            factorization: None,
            matrix: None,
            dimension: 0,
        }
    }

    /// Converts a CSR matrix to faer's CSC format via `Triplet`s.
    fn csr_to_csc(matrix: &CsrMatrix) -> AbdResult<SparseColMat<usize, f64>> {
        let mut triplets: Vec<Triplet<usize, usize, f64>> =
            Vec::with_capacity(matrix.values.len());
        for row in 0..matrix.rows {
            for idx in matrix.row_ptr[row]..matrix.row_ptr[row + 1] {
                let col = matrix.col_idx[idx];
                let val = matrix.values[idx];
                triplets.push(Triplet { row, col, val });
            }
        }

        SparseColMat::try_new_from_triplets(matrix.rows, matrix.cols, &triplets).map_err(|e| {
            AbdError::LinearSolve(format!("Failed to construct faer CSC matrix: {e:?}"))
        })
    }
}

impl Default for FaerSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SparseSolver for FaerSolver {
    fn factorize(&mut self, matrix: &CsrMatrix) -> AbdResult<()> {
        matrix.check_square(matrix.rows)?;
        if matrix.rows == 0 {
            return Err(AbdError::LinearSolve("Cannot factorize empty matrix".into()));
        }

        self.factorization = None;
        self.dimension = matrix.rows;

        let csc = Self::csr_to_csc(matrix)?;

        // Symbolic analysis (ordering, fill-in prediction)
        let symbolic = SymbolicLlt::try_new(csc.symbolic().as_ref(), Side::Upper)
            .map_err(|e| AbdError::LinearSolve(format!("Symbolic analysis failed: {e:?}")))?;

        // Numeric factorization; fails when the matrix is not positive definite.
        let llt = Llt::try_new_with_symbolic(symbolic, csc.as_ref(), Side::Upper)
            .map_err(|e| AbdError::LinearSolve(format!("Cholesky factorization failed: {e:?}")))?;

        self.factorization = Some(llt);
        self.matrix = Some(matrix.clone());
        Ok(())
    }

    fn solve(&self, rhs: &[f64], solution: &mut [f64]) -> AbdResult<SolveStats> {
        let llt = self.factorization.as_ref().ok_or_else(|| {
            AbdError::NotInitialized("Solver not factorized. Call factorize() first.".into())
        })?;

        if rhs.len() != self.dimension {
            return Err(AbdError::Dimension {
                expected: self.dimension,
                actual: rhs.len(),
            });
        }
        if solution.len() != self.dimension {
            return Err(AbdError::Dimension {
                expected: self.dimension,
                actual: solution.len(),
            });
        }

        let rhs_mat: faer::Mat<f64> = faer::Mat::from_fn(self.dimension, 1, |i, _| rhs[i]);

        // L Lᵀ x = b
        let sol = llt.solve(&rhs_mat);

        for (i, x) in solution.iter_mut().enumerate() {
            *x = sol[(i, 0)];
        }

        let residual = match &self.matrix {
            Some(a) => {
                let mut ax = vec![0.0; self.dimension];
                a.mul_vec(solution, &mut ax);
                let r: Vec<f64> = rhs.iter().zip(&ax).map(|(b, y)| b - y).collect();
                let b_norm = norm(rhs);
                if b_norm > 0.0 { norm(&r) / b_norm } else { norm(&r) }
            }
            None => 0.0,
        };

        Ok(SolveStats {
            iterations: 1,
            residual,
            converged: residual.is_finite(),
        })
    }

    fn is_factorized(&self) -> bool {
        self.factorization.is_some()
    }

    fn name(&self) -> &str {
        "faer-cholesky"
    }
}
