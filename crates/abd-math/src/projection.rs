//! Pinning projection onto the free degrees of freedom.
//!
//! Pinned DOFs are removed from the Newton system entirely: gradients and
//! Hessians are restricted to the free index set before the linear solve
//! and the solution is scattered back with zeros on pinned entries.

use abd_types::{AbdError, AbdResult};

use crate::sparse::CsrMatrix;

/// Gather/scatter operator `P` selecting the free DOFs of a global vector.
#[derive(Debug, Clone, PartialEq)]
pub struct PinningProjection {
    dimension: usize,
    free: Vec<usize>,
    pinned: Vec<usize>,
}

impl PinningProjection {
    /// Builds the projection for a system of size `dimension`.
    ///
    /// `pinned` may be unsorted and contain duplicates.
    pub fn new(dimension: usize, pinned: &[usize]) -> AbdResult<Self> {
        let mut is_pinned = vec![false; dimension];
        for &i in pinned {
            if i >= dimension {
                return Err(AbdError::InvalidConfig(format!(
                    "pinned DOF {i} out of range for system of size {dimension}"
                )));
            }
            is_pinned[i] = true;
        }
        let (pinned, free): (Vec<usize>, Vec<usize>) = (0..dimension).partition(|&i| is_pinned[i]);
        Ok(Self {
            dimension,
            free,
            pinned,
        })
    }

    /// A projection with nothing pinned.
    pub fn identity(dimension: usize) -> Self {
        Self {
            dimension,
            free: (0..dimension).collect(),
            pinned: Vec::new(),
        }
    }

    /// Full system size.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of free DOFs.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Sorted free DOF indices.
    pub fn free_dofs(&self) -> &[usize] {
        &self.free
    }

    /// Sorted pinned DOF indices.
    pub fn pinned_dofs(&self) -> &[usize] {
        &self.pinned
    }

    /// `P · v`: gathers the free entries of a full vector.
    pub fn restrict(&self, full: &[f64]) -> Vec<f64> {
        self.free.iter().map(|&i| full[i]).collect()
    }

    /// `Pᵀ · v`: scatters a reduced vector, zeroing pinned entries.
    pub fn lift(&self, reduced: &[f64]) -> Vec<f64> {
        let mut full = vec![0.0; self.dimension];
        for (&i, &v) in self.free.iter().zip(reduced) {
            full[i] = v;
        }
        full
    }

    /// `P · A · Pᵀ`.
    pub fn restrict_matrix(&self, matrix: &CsrMatrix) -> AbdResult<CsrMatrix> {
        matrix.check_square(self.dimension)?;
        Ok(matrix.principal_submatrix(&self.free))
    }

    /// The explicit `free_count × dimension` selection matrix.
    pub fn to_csr(&self) -> CsrMatrix {
        let triplets: Vec<(usize, usize, f64)> = self
            .free
            .iter()
            .enumerate()
            .map(|(row, &col)| (row, col, 1.0))
            .collect();
        CsrMatrix::from_triplets(self.free.len(), self.dimension, &triplets)
    }
}
