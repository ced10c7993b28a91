//! Sparse matrix representation and solver interface.
//!
//! [`CscMatrix`] wraps a faer `SparseColMat` built once from triplets.
//! Compression, transposition and products go through faer; only the
//! column slicing used to split the augmented `[A | b]` matrix lives here.

use faer::sparse::linalg::matmul::{sparse_dense_matmul, sparse_sparse_matmul};
use faer::sparse::{
    CreationError, SparseColMat, SparseColMatRef, SymbolicSparseColMat, SymbolicSparseColMatRef,
    Triplet,
};
use faer::{Accum, MatMut, MatRef, Par};
use serde::{Deserialize, Serialize};

use factorlsq_types::{LsqError, LsqResult};

use crate::ordering::Permutation;

/// One `(row, col, value)` contribution to a sparse matrix.
///
/// Entries that target the same coordinate are summed during assembly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SparseEntry {
    pub row: usize,
    pub col: usize,
    pub value: f64,
}

impl SparseEntry {
    #[inline]
    pub fn new(row: usize, col: usize, value: f64) -> Self {
        Self { row, col, value }
    }
}

impl From<(usize, usize, f64)> for SparseEntry {
    fn from((row, col, value): (usize, usize, f64)) -> Self {
        Self::new(row, col, value)
    }
}

/// Allocates a zeroed dense vector, reporting allocation failure as an error.
pub(crate) fn try_zeroed(len: usize) -> LsqResult<Vec<f64>> {
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|_| LsqError::SparseStorage(format!("cannot allocate {len} dense entries")))?;
    out.resize(len, 0.0);
    Ok(out)
}

fn storage_error(context: &str, err: impl std::fmt::Debug) -> LsqError {
    LsqError::SparseStorage(format!("{context}: {err:?}"))
}

/// Compressed Sparse Column (CSC) matrix of `f64` values.
///
/// Row indices within each column are sorted and unique. Built once and
/// never mutated in place; every transformation returns a new matrix.
#[derive(Debug, Clone)]
pub struct CscMatrix {
    inner: SparseColMat<usize, f64>,
}

impl CscMatrix {
    /// Creates a matrix with the given dimensions and no stored entries.
    pub fn new(rows: usize, cols: usize) -> Self {
        let symbolic = SymbolicSparseColMat::new_checked(rows, cols, vec![0; cols + 1], None, Vec::new());
        Self {
            inner: SparseColMat::new(symbolic, Vec::new()),
        }
    }

    /// Creates a CSC matrix from `(row, col, value)` triplets.
    ///
    /// Duplicate entries are summed. Out-of-range indices are rejected.
    pub fn from_triplets(rows: usize, cols: usize, triplets: &[(usize, usize, f64)]) -> LsqResult<Self> {
        let triplets: Vec<Triplet<usize, usize, f64>> =
            triplets.iter().map(|&(r, c, v)| Triplet::new(r, c, v)).collect();
        Self::from_faer_triplets(rows, cols, &triplets)
    }

    /// Creates a CSC matrix from faer triplets. See [`Self::from_triplets`].
    pub fn from_faer_triplets(
        rows: usize,
        cols: usize,
        triplets: &[Triplet<usize, usize, f64>],
    ) -> LsqResult<Self> {
        let inner = SparseColMat::try_new_from_triplets(rows, cols, triplets).map_err(|e| match e {
            CreationError::OutOfBounds { row, col } => LsqError::MalformedEntry {
                row,
                col,
                reason: format!("index outside {rows}×{cols} matrix"),
            },
            CreationError::Generic(err) => storage_error("triplet compression failed", err),
        })?;
        Ok(Self { inner })
    }

    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.inner.nrows()
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.inner.ncols()
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.inner.compute_nnz()
    }

    /// Row indices stored in column `j`.
    #[inline]
    pub fn col_rows(&self, j: usize) -> &[usize] {
        self.inner.row_idx_of_col_raw(j)
    }

    /// Values stored in column `j`, aligned with [`Self::col_rows`].
    #[inline]
    pub fn col_values(&self, j: usize) -> &[f64] {
        self.inner.val_of_col(j)
    }

    /// Returns the entry at `(row, col)`, or 0.0 if it is not stored.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        if row >= self.nrows() || col >= self.ncols() {
            return 0.0;
        }
        match self.col_rows(col).binary_search(&row) {
            Ok(pos) => self.col_values(col)[pos],
            Err(_) => 0.0,
        }
    }

    /// Returns the leading `ncols` columns as a new matrix.
    pub fn leading_columns(&self, ncols: usize) -> Self {
        let ncols = ncols.min(self.ncols());
        let mut col_ptr = Vec::with_capacity(ncols + 1);
        let mut row_idx = Vec::new();
        let mut values = Vec::new();
        col_ptr.push(0);
        for j in 0..ncols {
            row_idx.extend_from_slice(self.col_rows(j));
            values.extend_from_slice(self.col_values(j));
            col_ptr.push(row_idx.len());
        }
        let symbolic = SymbolicSparseColMat::new_checked(self.nrows(), ncols, col_ptr, None, row_idx);
        Self {
            inner: SparseColMat::new(symbolic, values),
        }
    }

    /// Returns column `j` as a dense vector of length `nrows`.
    pub fn dense_column(&self, j: usize) -> LsqResult<Vec<f64>> {
        let mut out = try_zeroed(self.nrows())?;
        for (&r, &v) in self.col_rows(j).iter().zip(self.col_values(j)) {
            out[r] = v;
        }
        Ok(out)
    }

    /// Computes `y = A x`.
    pub fn mul_vec(&self, x: &[f64]) -> LsqResult<Vec<f64>> {
        if x.len() != self.ncols() {
            return Err(LsqError::DimensionMismatch {
                expected: self.ncols(),
                actual: x.len(),
            });
        }
        let mut y = try_zeroed(self.nrows())?;
        sparse_dense_matmul(
            MatMut::from_column_major_slice_mut(&mut y, self.nrows(), 1),
            Accum::Replace,
            self.as_faer(),
            MatRef::from_column_major_slice(x, self.ncols(), 1),
            1.0,
            Par::Seq,
        );
        Ok(y)
    }

    /// Computes `z = Aᵀ y`.
    pub fn transpose_mul_vec(&self, y: &[f64]) -> LsqResult<Vec<f64>> {
        self.transpose()?.mul_vec(y)
    }

    /// Returns the transpose as a new CSC matrix.
    pub fn transpose(&self) -> LsqResult<Self> {
        let inner = self
            .inner
            .transpose()
            .to_col_major()
            .map_err(|e| storage_error("transpose failed", e))?;
        Ok(Self { inner })
    }

    /// Computes the Gram matrix `AᵀA` (full symmetric storage).
    pub fn gram(&self) -> LsqResult<Self> {
        let at = self.transpose()?;
        let inner = sparse_sparse_matmul(at.as_faer(), self.as_faer(), 1.0, Par::Seq)
            .map_err(|e| storage_error("AᵀA product failed", e))?;
        Ok(Self { inner })
    }

    /// Expands to a dense row-major matrix. Intended for diagnostics and tests.
    pub fn to_dense(&self) -> Vec<Vec<f64>> {
        let dense = self.inner.to_dense();
        (0..self.nrows())
            .map(|i| (0..self.ncols()).map(|j| dense[(i, j)]).collect())
            .collect()
    }

    /// Borrows the sparsity structure as a faer symbolic matrix.
    pub fn faer_symbolic(&self) -> SymbolicSparseColMatRef<'_, usize> {
        self.inner.symbolic()
    }

    /// Borrows the matrix as a faer sparse view (no copy).
    pub fn as_faer(&self) -> SparseColMatRef<'_, usize, f64> {
        SparseColMatRef::new(self.inner.symbolic(), self.inner.val())
    }
}

impl PartialEq for CscMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.nrows() == other.nrows()
            && self.ncols() == other.ncols()
            && (0..self.ncols()).all(|j| {
                self.col_rows(j) == other.col_rows(j) && self.col_values(j) == other.col_values(j)
            })
    }
}

/// Trait for sparse direct solvers.
///
/// Implementations: [`FaerLdltSolver`](crate::faer_solver::FaerLdltSolver)
/// for symmetric positive-definite systems and
/// [`FaerQrSolver`](crate::faer_solver::FaerQrSolver) for least-squares
/// systems. Both eliminate columns in the order given by a [`Permutation`].
pub trait SparseSolver: Send {
    /// Factorize the matrix under the given column ordering.
    fn factorize(&mut self, matrix: &CscMatrix, ordering: &Permutation) -> LsqResult<()>;

    /// Solve using the pre-computed factorization.
    ///
    /// `rhs` has one entry per matrix row; the result has one entry per column.
    fn solve(&self, rhs: &[f64]) -> LsqResult<Vec<f64>>;

    /// Returns true if the solver holds a valid factorization.
    fn is_factorized(&self) -> bool;

    /// Number of stored factor entries; zero before factorization.
    fn factor_len(&self) -> usize;

    /// Returns the solver's name.
    fn name(&self) -> &str;
}
