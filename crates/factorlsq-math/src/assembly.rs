//! Augmented matrix assembly.
//!
//! Collects sparse Jacobian contributions into a growable triplet list,
//! infers the shape from the largest indices seen, and compresses once
//! into an immutable CSC `[A | b]`. The last column is the right-hand
//! side `b`; the leading columns form the coefficient matrix `A`.

use faer::sparse::Triplet;
use tracing::debug;

use factorlsq_types::{LsqError, LsqResult};

use crate::sparse::{CscMatrix, SparseEntry};

/// The sparse augmented matrix `[A | b]`.
///
/// Shape is `(max_row + 1) × (max_col + 1)` over the assembled entries.
/// An empty entry set produces a degenerate 1×1 matrix with no stored
/// entries and no coefficient columns.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedMatrix {
    matrix: CscMatrix,
}

impl AugmentedMatrix {
    /// Assemble from a slice of entries. See [`AugmentedMatrix::assemble_iter`].
    pub fn assemble(entries: &[SparseEntry]) -> LsqResult<Self> {
        Self::assemble_iter(entries.iter().copied())
    }

    /// Assemble from any stream of entries.
    ///
    /// Duplicate coordinates are summed, so the result does not depend on
    /// entry order. Non-finite values and indices whose extent does not
    /// fit in `usize` are rejected.
    pub fn assemble_iter<I>(entries: I) -> LsqResult<Self>
    where
        I: IntoIterator<Item = SparseEntry>,
    {
        let iter = entries.into_iter();
        let (lower, _) = iter.size_hint();
        let mut triplets: Vec<Triplet<usize, usize, f64>> = Vec::with_capacity(lower);
        let mut max_row = 0usize;
        let mut max_col = 0usize;

        for entry in iter {
            if !entry.value.is_finite() {
                return Err(LsqError::MalformedEntry {
                    row: entry.row,
                    col: entry.col,
                    reason: format!("non-finite value {}", entry.value),
                });
            }
            // The column pointer array needs cols + 1 slots
            if entry.row.checked_add(1).is_none() || entry.col.checked_add(2).is_none() {
                return Err(LsqError::MalformedEntry {
                    row: entry.row,
                    col: entry.col,
                    reason: "index exceeds the addressable matrix extent".into(),
                });
            }
            max_row = max_row.max(entry.row);
            max_col = max_col.max(entry.col);
            triplets.push(Triplet::new(entry.row, entry.col, entry.value));
        }

        let rows = max_row + 1;
        let cols = max_col + 1;
        let matrix = CscMatrix::from_faer_triplets(rows, cols, &triplets)?;

        debug!(
            rows,
            cols,
            triplets = triplets.len(),
            nnz = matrix.nnz(),
            "augmented matrix assembled"
        );
        Ok(Self { matrix })
    }

    /// `(rows, cols)` of `[A | b]`.
    pub fn shape(&self) -> (usize, usize) {
        (self.matrix.nrows(), self.matrix.ncols())
    }

    /// Stored entries in `[A | b]`, including the right-hand side column.
    pub fn nnz(&self) -> usize {
        self.matrix.nnz()
    }

    /// Number of equations.
    pub fn a_rows(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of unknowns (all columns except the last).
    pub fn a_cols(&self) -> usize {
        self.matrix.ncols().saturating_sub(1)
    }

    /// Returns true when there is no coefficient column to solve for.
    pub fn is_empty(&self) -> bool {
        self.a_cols() == 0
    }

    /// Entry at `(row, col)` of `[A | b]`.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.matrix.get(row, col)
    }

    /// The coefficient block `A`.
    pub fn a(&self) -> CscMatrix {
        self.matrix.leading_columns(self.a_cols())
    }

    /// The right-hand side `b` as a dense vector.
    pub fn b(&self) -> LsqResult<Vec<f64>> {
        self.matrix.dense_column(self.a_cols())
    }

    /// Splits into `(A, b)`. Fails with [`LsqError::EmptySystem`] when `A`
    /// has no columns.
    pub fn split(&self) -> LsqResult<(CscMatrix, Vec<f64>)> {
        if self.is_empty() {
            return Err(LsqError::EmptySystem);
        }
        Ok((self.a(), self.b()?))
    }

    /// Dense row-major expansion of `[A | b]`.
    pub fn to_dense(&self) -> Vec<Vec<f64>> {
        self.matrix.to_dense()
    }
}
