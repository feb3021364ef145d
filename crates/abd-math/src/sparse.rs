//! Sparse matrix representation and solver interface.
//!
//! Provides a scalar CSR (Compressed Sparse Row) matrix used by the
//! linear solvers, and the [`SparseSolver`] trait they implement.

use serde::{Deserialize, Serialize};

use abd_types::{AbdError, AbdResult};

/// Compressed Sparse Row (CSR) matrix.
///
/// Stores a sparse matrix in row-major order. Column indices within a
/// row are strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrMatrix {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
    /// Row pointer array (length = rows + 1).
    /// `row_ptr[i]..row_ptr[i+1]` are the indices into `col_idx` and `values`
    /// for non-zeros in row `i`.
    pub row_ptr: Vec<usize>,
    /// Column indices of non-zero entries.
    pub col_idx: Vec<usize>,
    /// Non-zero values.
    pub values: Vec<f64>,
}

impl CsrMatrix {
    /// Creates an empty CSR matrix with the given dimensions.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            row_ptr: vec![0; rows + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Creates an `n × n` identity matrix.
    pub fn identity(n: usize) -> Self {
        Self {
            rows: n,
            cols: n,
            row_ptr: (0..=n).collect(),
            col_idx: (0..n).collect(),
            values: vec![1.0; n],
        }
    }

    /// Returns the number of non-zero entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Creates a CSR matrix from triplets (row, col, value).
    ///
    /// Duplicate entries are summed in triplet order.
    pub fn from_triplets(rows: usize, cols: usize, triplets: &[(usize, usize, f64)]) -> Self {
        let mut row_counts = vec![0usize; rows];
        for &(r, _, _) in triplets {
            row_counts[r] += 1;
        }

        let mut row_start = vec![0usize; rows + 1];
        for i in 0..rows {
            row_start[i + 1] = row_start[i] + row_counts[i];
        }

        // Bucket by row, keeping triplet order inside each row.
        let mut bucket: Vec<(usize, f64)> = vec![(0, 0.0); row_start[rows]];
        let mut cursor = row_start[..rows].to_vec();
        for &(r, c, v) in triplets {
            bucket[cursor[r]] = (c, v);
            cursor[r] += 1;
        }

        let mut row_ptr = Vec::with_capacity(rows + 1);
        let mut col_idx = Vec::with_capacity(bucket.len());
        let mut values = Vec::with_capacity(bucket.len());
        row_ptr.push(0);

        for i in 0..rows {
            let entries = &mut bucket[row_start[i]..row_start[i + 1]];
            // Stable sort keeps duplicate summation order deterministic.
            entries.sort_by_key(|&(c, _)| c);
            for &(c, v) in entries.iter() {
                if col_idx.len() > *row_ptr.last().unwrap_or(&0) && col_idx.last() == Some(&c) {
                    if let Some(last) = values.last_mut() {
                        *last += v;
                    }
                } else {
                    col_idx.push(c);
                    values.push(v);
                }
            }
            row_ptr.push(col_idx.len());
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Returns the entry at `(row, col)`, or zero if it is not stored.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        let range = self.row_ptr[row]..self.row_ptr[row + 1];
        match self.col_idx[range.clone()].binary_search(&col) {
            Ok(k) => self.values[range.start + k],
            Err(_) => 0.0,
        }
    }

    /// Computes `y = A · x`.
    pub fn mul_vec(&self, x: &[f64], y: &mut [f64]) {
        debug_assert_eq!(x.len(), self.cols);
        debug_assert_eq!(y.len(), self.rows);
        for (row, out) in y.iter_mut().enumerate() {
            let mut acc = 0.0;
            for k in self.row_ptr[row]..self.row_ptr[row + 1] {
                acc += self.values[k] * x[self.col_idx[k]];
            }
            *out = acc;
        }
    }

    /// Returns the main diagonal (zeros where no entry is stored).
    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.rows.min(self.cols)).map(|i| self.get(i, i)).collect()
    }

    /// Extracts the principal submatrix on the sorted index set `keep`.
    ///
    /// Row and column `keep[k]` of `self` become row and column `k`.
    pub fn principal_submatrix(&self, keep: &[usize]) -> Self {
        let mut remap = vec![usize::MAX; self.cols];
        for (new, &old) in keep.iter().enumerate() {
            remap[old] = new;
        }

        let mut row_ptr = Vec::with_capacity(keep.len() + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);

        for &old_row in keep {
            for k in self.row_ptr[old_row]..self.row_ptr[old_row + 1] {
                let new_col = remap[self.col_idx[k]];
                if new_col != usize::MAX {
                    col_idx.push(new_col);
                    values.push(self.values[k]);
                }
            }
            row_ptr.push(col_idx.len());
        }

        Self {
            rows: keep.len(),
            cols: keep.len(),
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Maximum absolute asymmetry `|A_ij − A_ji|` over stored entries.
    pub fn max_asymmetry(&self) -> f64 {
        let mut worst = 0.0f64;
        for row in 0..self.rows {
            for k in self.row_ptr[row]..self.row_ptr[row + 1] {
                let col = self.col_idx[k];
                worst = worst.max((self.values[k] - self.get(col, row)).abs());
            }
        }
        worst
    }

    /// Fails unless the matrix is square with dimension `n`.
    pub fn check_square(&self, n: usize) -> AbdResult<()> {
        if self.rows != self.cols {
            return Err(AbdError::LinearSolve(format!(
                "Matrix must be square, got {}×{}",
                self.rows, self.cols
            )));
        }
        if self.rows != n {
            return Err(AbdError::Dimension {
                expected: n,
                actual: self.rows,
            });
        }
        Ok(())
    }
}

/// Outcome of one linear solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveStats {
    /// Iterations performed (1 for direct solvers).
    pub iterations: u32,
    /// Final relative residual `‖b − A·x‖ / ‖b‖`.
    pub residual: f64,
    /// Whether the solver reached its tolerance.
    pub converged: bool,
}

/// Trait for sparse symmetric positive-(semi)definite solvers.
///
/// Implementations: [`PcgSolver`](crate::pcg::PcgSolver) (iterative) and
/// [`FaerSolver`](crate::faer_solver::FaerSolver) (sparse Cholesky).
pub trait SparseSolver: Send {
    /// Prepares the solver for `matrix` (preconditioner or factorization).
    fn factorize(&mut self, matrix: &CsrMatrix) -> AbdResult<()>;

    /// Solves `A x = b` using the prepared matrix.
    /// Returns x in the provided output buffer.
    fn solve(&self, rhs: &[f64], solution: &mut [f64]) -> AbdResult<SolveStats>;

    /// Returns true if the solver holds a prepared matrix.
    fn is_factorized(&self) -> bool;

    /// Returns the solver's name.
    fn name(&self) -> &str;
}
