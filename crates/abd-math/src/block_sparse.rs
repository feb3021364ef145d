//! Block-sparse (BSR) matrices with 12×12 blocks.
//!
//! The global Newton system has one 12×12 block row per body. Mass and
//! elastic terms fill the block diagonal; contact terms add off-diagonal
//! blocks for every body pair in contact this step. The pattern is
//! rebuilt from triplets every step and never assumed stable.

use std::collections::BTreeSet;

use abd_types::constants::DOFS_PER_BODY;
use abd_types::{AbdError, AbdResult};

use crate::linalg::Mat12;
use crate::sparse::CsrMatrix;

const B: usize = DOFS_PER_BODY;

/// Sorted set of nonzero `(block_row, block_col)` positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockPattern {
    entries: BTreeSet<(usize, usize)>,
}

impl BlockPattern {
    /// Creates an empty pattern.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pattern holding the first `n` diagonal blocks.
    pub fn diagonal(n: usize) -> Self {
        Self {
            entries: (0..n).map(|i| (i, i)).collect(),
        }
    }

    /// Adds one block position.
    pub fn insert(&mut self, row: usize, col: usize) {
        self.entries.insert((row, col));
    }

    /// Adds the four blocks coupling bodies `a` and `b`:
    /// `(a,a)`, `(b,b)`, `(a,b)`, `(b,a)`.
    pub fn insert_pair(&mut self, a: usize, b: usize) {
        self.insert(a, a);
        self.insert(b, b);
        self.insert(a, b);
        self.insert(b, a);
    }

    /// Merges another pattern into this one.
    pub fn extend(&mut self, other: &BlockPattern) {
        self.entries.extend(other.entries.iter().copied());
    }

    /// Returns true if `(row, col)` is part of the pattern.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.entries.contains(&(row, col))
    }

    /// Number of block positions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the pattern holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates positions in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.entries.iter().copied()
    }
}

/// Compressed block-sparse-row matrix with 12×12 blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockCsrMatrix {
    block_rows: usize,
    block_cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    blocks: Vec<Mat12>,
}

impl BlockCsrMatrix {
    /// A matrix with zero-valued blocks at every position of `pattern`.
    pub fn from_pattern(block_rows: usize, block_cols: usize, pattern: &BlockPattern) -> Self {
        let mut row_ptr = vec![0usize; block_rows + 1];
        let mut col_idx = Vec::with_capacity(pattern.len());
        for (r, c) in pattern.iter() {
            if r < block_rows && c < block_cols {
                row_ptr[r + 1] += 1;
                col_idx.push(c);
            }
        }
        for i in 0..block_rows {
            row_ptr[i + 1] += row_ptr[i];
        }
        let blocks = vec![Mat12::zeros(); col_idx.len()];
        Self {
            block_rows,
            block_cols,
            row_ptr,
            col_idx,
            blocks,
        }
    }

    /// A square block-diagonal matrix.
    pub fn block_diagonal(blocks: &[Mat12]) -> Self {
        let n = blocks.len();
        Self {
            block_rows: n,
            block_cols: n,
            row_ptr: (0..=n).collect(),
            col_idx: (0..n).collect(),
            blocks: blocks.to_vec(),
        }
    }

    /// Builds a matrix from `(block_row, block_col, block)` triplets.
    ///
    /// Duplicate positions are summed in triplet order, so the result is
    /// independent of how the triplets were produced.
    pub fn from_triplets(
        block_rows: usize,
        block_cols: usize,
        triplets: &[(usize, usize, Mat12)],
    ) -> AbdResult<Self> {
        let mut pattern = BlockPattern::new();
        for &(r, c, _) in triplets {
            if r >= block_rows || c >= block_cols {
                return Err(AbdError::Dimension {
                    expected: block_rows.max(block_cols),
                    actual: r.max(c) + 1,
                });
            }
            pattern.insert(r, c);
        }
        let mut matrix = Self::from_pattern(block_rows, block_cols, &pattern);
        for (r, c, block) in triplets {
            matrix.add_to_block(*r, *c, block)?;
        }
        Ok(matrix)
    }

    /// Number of block rows.
    pub fn block_rows(&self) -> usize {
        self.block_rows
    }

    /// Number of block columns.
    pub fn block_cols(&self) -> usize {
        self.block_cols
    }

    /// Scalar row count.
    pub fn nrows(&self) -> usize {
        self.block_rows * B
    }

    /// Scalar column count.
    pub fn ncols(&self) -> usize {
        self.block_cols * B
    }

    /// Number of stored blocks.
    pub fn nnz_blocks(&self) -> usize {
        self.blocks.len()
    }

    fn slot(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.block_rows {
            return None;
        }
        let start = self.row_ptr[row];
        self.col_idx[start..self.row_ptr[row + 1]]
            .binary_search(&col)
            .ok()
            .map(|k| start + k)
    }

    /// Returns the block at `(row, col)` if it is part of the pattern.
    pub fn block(&self, row: usize, col: usize) -> Option<&Mat12> {
        self.slot(row, col).map(|k| &self.blocks[k])
    }

    /// Adds `value` into the block at `(row, col)`.
    ///
    /// Fails if the position is not part of the pattern.
    pub fn add_to_block(&mut self, row: usize, col: usize, value: &Mat12) -> AbdResult<()> {
        let k = self.slot(row, col).ok_or_else(|| {
            AbdError::InvalidConfig(format!("block ({row}, {col}) is not in the sparsity pattern"))
        })?;
        self.blocks[k] += value;
        Ok(())
    }

    /// Multiplies every block by `s`.
    pub fn scale(&mut self, s: f64) {
        for block in &mut self.blocks {
            *block *= s;
        }
    }

    /// Computes `y = A · x`.
    pub fn mul_vec(&self, x: &[f64], y: &mut [f64]) {
        debug_assert_eq!(x.len(), self.ncols());
        debug_assert_eq!(y.len(), self.nrows());
        y.iter_mut().for_each(|v| *v = 0.0);
        for br in 0..self.block_rows {
            for k in self.row_ptr[br]..self.row_ptr[br + 1] {
                let bc = self.col_idx[k];
                let block = &self.blocks[k];
                let xs = &x[bc * B..(bc + 1) * B];
                for i in 0..B {
                    let mut acc = 0.0;
                    for j in 0..B {
                        acc += block[(i, j)] * xs[j];
                    }
                    y[br * B + i] += acc;
                }
            }
        }
    }

    /// Returns the scalar main diagonal.
    pub fn diagonal(&self) -> Vec<f64> {
        let mut diag = vec![0.0; self.nrows().min(self.ncols())];
        for br in 0..self.block_rows.min(self.block_cols) {
            if let Some(block) = self.block(br, br) {
                for i in 0..B {
                    diag[br * B + i] = block[(i, i)];
                }
            }
        }
        diag
    }

    /// Expands to a scalar CSR matrix, dropping exact zeros.
    pub fn to_csr(&self) -> CsrMatrix {
        let mut triplets = Vec::with_capacity(self.blocks.len() * B * B);
        for br in 0..self.block_rows {
            for k in self.row_ptr[br]..self.row_ptr[br + 1] {
                let bc = self.col_idx[k];
                let block = &self.blocks[k];
                for i in 0..B {
                    for j in 0..B {
                        let v = block[(i, j)];
                        if v != 0.0 {
                            triplets.push((br * B + i, bc * B + j, v));
                        }
                    }
                }
            }
        }
        CsrMatrix::from_triplets(self.nrows(), self.ncols(), &triplets)
    }
}
