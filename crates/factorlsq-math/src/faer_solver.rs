//! Sparse direct solvers backed by `faer`.
//!
//! Implements the [`SparseSolver`] trait twice:
//!
//! - [`FaerLdltSolver`] — symbolic + numeric LDLᵀ of a symmetric
//!   positive-definite matrix (lower side), eliminating in a caller-supplied
//!   order. Used on the normal equations `AᵀA`.
//! - [`FaerQrSolver`] — simplicial Householder QR of a tall matrix,
//!   minimizing `‖Ax − b‖₂`. The caller-supplied column order drives the
//!   column elimination tree, so `R` follows exactly that order.
//!
//! ## Workflow
//! 1. `factorize(matrix, ordering)` — symbolic analysis + numeric factorization
//! 2. `solve(rhs)` — substitution through the cached factors
//!
//! All kernels run with [`Par::Seq`]; each solver owns its workspace.

use faer::dyn_stack::{MemBuffer, MemStack, StackReq};
use faer::sparse::linalg::cholesky::{
    factorize_symbolic_cholesky, CholeskySymbolicParams, LdltRef, SymbolicCholesky,
    SymmetricOrdering,
};
use faer::sparse::linalg::qr::simplicial::{
    factorize_simplicial_numeric_qr_scratch, factorize_simplicial_numeric_qr_unsorted,
    factorize_simplicial_symbolic_qr, factorize_simplicial_symbolic_qr_scratch, SimplicialQrRef,
    SymbolicSimplicialQr,
};
use faer::sparse::linalg::qr::{
    col_etree, col_etree_scratch, column_counts_aat_scratch, column_counts_ata, postorder,
    postorder_scratch,
};
use faer::sparse::{SparseColMatRef, SymbolicSparseColMatRef};
use faer::{Conj, MatMut, Par, Side};
use tracing::debug;

use factorlsq_types::{LsqError, LsqResult};

use crate::ordering::Permutation;
use crate::sparse::{CscMatrix, SparseSolver};

/// Returns the index of the first NaN or infinite entry.
pub fn first_non_finite(values: &[f64]) -> Option<usize> {
    values.iter().position(|v| !v.is_finite())
}

/// Sparse LDLᵀ solver using `faer`.
///
/// Stores the symbolic structure (including the elimination order) and the
/// numeric factor values for reuse across multiple solves.
pub struct FaerLdltSolver {
    /// Symbolic factorization with the elimination order baked in.
    symbolic: Option<SymbolicCholesky<usize>>,
    /// Numeric L and D values.
    values: Vec<f64>,
    /// Matrix dimension (N×N).
    dimension: usize,
}

impl FaerLdltSolver {
    /// Creates a new solver (unfactorized).
    pub fn new() -> Self {
        Self {
            symbolic: None,
            values: Vec::new(),
            dimension: 0,
        }
    }
}

impl Default for FaerLdltSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SparseSolver for FaerLdltSolver {
    fn factorize(&mut self, matrix: &CscMatrix, ordering: &Permutation) -> LsqResult<()> {
        if matrix.nrows() != matrix.ncols() {
            return Err(LsqError::Factorization(format!(
                "LDLᵀ needs a square matrix, got {}×{}",
                matrix.nrows(),
                matrix.ncols()
            )));
        }
        if matrix.nrows() == 0 {
            return Err(LsqError::EmptySystem);
        }
        if ordering.len() != matrix.ncols() {
            return Err(LsqError::DimensionMismatch {
                expected: matrix.ncols(),
                actual: ordering.len(),
            });
        }

        self.symbolic = None;
        self.dimension = matrix.nrows();

        let symmetric_ordering = if ordering.is_identity() {
            SymmetricOrdering::Identity
        } else {
            SymmetricOrdering::Custom(ordering.as_faer())
        };

        // Step 1: Symbolic analysis (elimination tree, fill-in prediction)
        let symbolic = factorize_symbolic_cholesky(
            matrix.faer_symbolic(),
            Side::Lower,
            symmetric_ordering,
            CholeskySymbolicParams::default(),
        )
        .map_err(|e| LsqError::Factorization(format!("symbolic analysis failed: {e:?}")))?;

        // Step 2: Numeric factorization (using the symbolic structure)
        let mut values = vec![0.0f64; symbolic.len_val()];
        let mut mem = MemBuffer::new(
            symbolic.factorize_numeric_ldlt_scratch::<f64>(Par::Seq, Default::default()),
        );
        symbolic
            .factorize_numeric_ldlt(
                &mut values,
                matrix.as_faer(),
                Side::Lower,
                Default::default(),
                Par::Seq,
                MemStack::new(&mut mem),
                Default::default(),
            )
            .map_err(|e| LsqError::Factorization(format!("LDLᵀ numeric factorization failed: {e:?}")))?;

        debug!(
            n = self.dimension,
            nnz = matrix.nnz(),
            factor_len = values.len(),
            "ldlt factorized"
        );

        self.values = values;
        self.symbolic = Some(symbolic);
        Ok(())
    }

    fn solve(&self, rhs: &[f64]) -> LsqResult<Vec<f64>> {
        let symbolic = self
            .symbolic
            .as_ref()
            .ok_or_else(|| LsqError::Factorization("solver not factorized; call factorize() first".into()))?;

        if rhs.len() != self.dimension {
            return Err(LsqError::DimensionMismatch {
                expected: self.dimension,
                actual: rhs.len(),
            });
        }

        let mut x = rhs.to_vec();
        let mut mem = MemBuffer::new(symbolic.solve_in_place_scratch::<f64>(1, Par::Seq));
        let ldlt = LdltRef::new(symbolic, &self.values);
        ldlt.solve_in_place_with_conj(
            Conj::No,
            MatMut::from_column_major_slice_mut(&mut x, self.dimension, 1),
            Par::Seq,
            MemStack::new(&mut mem),
        );

        if let Some(index) = first_non_finite(&x) {
            return Err(LsqError::NonFiniteSolution { index });
        }
        Ok(x)
    }

    fn is_factorized(&self) -> bool {
        self.symbolic.is_some()
    }

    fn factor_len(&self) -> usize {
        self.values.len()
    }

    fn name(&self) -> &str {
        "faer-ldlt"
    }
}

/// Sparse least-squares QR solver using `faer`.
///
/// Factorizes `A P = Q R` where `P` is the caller's column ordering. The
/// factor is stored as owned `R` and Householder patterns; the solution is
/// scattered back through `P`.
pub struct FaerQrSolver {
    /// Symbolic structure of `R` and the Householder vectors.
    symbolic: Option<SymbolicSimplicialQr<usize>>,
    r_col_ptr: Vec<usize>,
    r_row_idx: Vec<usize>,
    r_val: Vec<f64>,
    householder_col_ptr: Vec<usize>,
    householder_row_idx: Vec<usize>,
    householder_val: Vec<f64>,
    tau_val: Vec<f64>,
    /// Column ordering the factor was computed under.
    ordering: Permutation,
    /// Number of rows (equations).
    rows: usize,
    /// Number of columns (unknowns).
    cols: usize,
}

impl FaerQrSolver {
    /// Creates a new solver (unfactorized).
    pub fn new() -> Self {
        Self {
            symbolic: None,
            r_col_ptr: Vec::new(),
            r_row_idx: Vec::new(),
            r_val: Vec::new(),
            householder_col_ptr: Vec::new(),
            householder_row_idx: Vec::new(),
            householder_val: Vec::new(),
            tau_val: Vec::new(),
            ordering: Permutation::identity(0),
            rows: 0,
            cols: 0,
        }
    }

    /// Column ordering of the current factorization (`fwd[k]` is the
    /// original column eliminated at step `k`).
    pub fn column_order(&self) -> Option<&Permutation> {
        self.symbolic.as_ref().map(|_| &self.ordering)
    }
}

impl Default for FaerQrSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SparseSolver for FaerQrSolver {
    fn factorize(&mut self, matrix: &CscMatrix, ordering: &Permutation) -> LsqResult<()> {
        let (m, n) = (matrix.nrows(), matrix.ncols());
        if n == 0 {
            return Err(LsqError::EmptySystem);
        }
        if m < n {
            return Err(LsqError::Underdetermined { rows: m, cols: n });
        }
        if ordering.len() != n {
            return Err(LsqError::DimensionMismatch {
                expected: n,
                actual: ordering.len(),
            });
        }

        self.symbolic = None;
        let col_perm = ordering.as_faer();
        let at = matrix.transpose()?;

        // Step 1: Symbolic analysis under the given column order
        let mut etree_buf = vec![0usize; n];
        let mut post = vec![0usize; n];
        let mut col_counts = vec![0usize; n];
        let mut min_col = vec![0usize; m];
        let mut mem = MemBuffer::new(StackReq::any_of(&[
            col_etree_scratch::<usize>(m, n),
            postorder_scratch::<usize>(n),
            column_counts_aat_scratch::<usize>(n, m),
            factorize_simplicial_symbolic_qr_scratch::<usize>(m, n),
        ]));
        let stack = MemStack::new(&mut mem);
        let etree = col_etree(matrix.faer_symbolic(), Some(col_perm), &mut etree_buf, stack);
        postorder(&mut post, etree, stack);
        column_counts_ata(
            &mut col_counts,
            &mut min_col,
            at.faer_symbolic(),
            Some(col_perm),
            etree,
            &post,
            stack,
        );
        let symbolic = factorize_simplicial_symbolic_qr(&min_col, etree, &col_counts, stack)
            .map_err(|e| LsqError::Factorization(format!("QR symbolic analysis failed: {e:?}")))?;

        // Step 2: Numeric factorization into owned R / Householder buffers
        let mut r_col_ptr = vec![0usize; n + 1];
        let mut r_row_idx = vec![0usize; symbolic.len_r()];
        let mut r_val = vec![0.0f64; symbolic.len_r()];
        let mut householder_col_ptr = vec![0usize; n + 1];
        let mut householder_row_idx = vec![0usize; symbolic.len_householder()];
        let mut householder_val = vec![0.0f64; symbolic.len_householder()];
        let mut tau_val = vec![0.0f64; n];
        let mut mem = MemBuffer::new(factorize_simplicial_numeric_qr_scratch::<usize, f64>(&symbolic));
        factorize_simplicial_numeric_qr_unsorted(
            &mut r_col_ptr,
            &mut r_row_idx,
            &mut r_val,
            &mut householder_col_ptr,
            &mut householder_row_idx,
            &mut householder_val,
            &mut tau_val,
            matrix.as_faer(),
            Some(col_perm),
            &symbolic,
            MemStack::new(&mut mem),
        );

        debug!(
            rows = m,
            cols = n,
            nnz = matrix.nnz(),
            factor_len = symbolic.len_r() + symbolic.len_householder(),
            natural = ordering.is_identity(),
            "qr factorized"
        );

        self.rows = m;
        self.cols = n;
        self.ordering = ordering.clone();
        self.r_col_ptr = r_col_ptr;
        self.r_row_idx = r_row_idx;
        self.r_val = r_val;
        self.householder_col_ptr = householder_col_ptr;
        self.householder_row_idx = householder_row_idx;
        self.householder_val = householder_val;
        self.tau_val = tau_val;
        self.symbolic = Some(symbolic);
        Ok(())
    }

    fn solve(&self, rhs: &[f64]) -> LsqResult<Vec<f64>> {
        let symbolic = self
            .symbolic
            .as_ref()
            .ok_or_else(|| LsqError::Factorization("solver not factorized; call factorize() first".into()))?;

        if rhs.len() != self.rows {
            return Err(LsqError::DimensionMismatch {
                expected: self.rows,
                actual: rhs.len(),
            });
        }

        let r = SparseColMatRef::new(
            SymbolicSparseColMatRef::new_unsorted_checked(
                self.cols,
                self.cols,
                &self.r_col_ptr,
                None,
                &self.r_row_idx,
            ),
            &self.r_val,
        );
        let householder = SparseColMatRef::new(
            SymbolicSparseColMatRef::new_unsorted_checked(
                self.rows,
                self.cols,
                &self.householder_col_ptr,
                None,
                &self.householder_row_idx,
            ),
            &self.householder_val,
        );
        let qr = SimplicialQrRef::new(symbolic, r, householder, &self.tau_val);

        // The permuted solution overwrites the leading `cols` entries
        let mut x = rhs.to_vec();
        let mut work = vec![0.0f64; self.rows];
        qr.solve_in_place_with_conj(
            Conj::No,
            MatMut::from_column_major_slice_mut(&mut x, self.rows, 1),
            Par::Seq,
            MatMut::from_column_major_slice_mut(&mut work, self.rows, 1),
        );

        let permuted = &x[..self.cols];
        if let Some(index) = first_non_finite(permuted) {
            return Err(LsqError::NonFiniteSolution {
                index: self.ordering.fwd()[index],
            });
        }
        Ok(self.ordering.unpermute(permuted))
    }

    fn is_factorized(&self) -> bool {
        self.symbolic.is_some()
    }

    fn factor_len(&self) -> usize {
        self.r_val.len() + self.householder_val.len()
    }

    fn name(&self) -> &str {
        "faer-qr"
    }
}
