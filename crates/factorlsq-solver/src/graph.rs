//! Linear factor graphs.
//!
//! A [`LinearFactorGraph`] is a list of [`JacobianFactor`]s, each a
//! dense linear constraint `Σ Aₖ xₖ = b` over a handful of variables.
//! The graph exposes its stacked Jacobian as sparse entries through the
//! [`LinearSystem`] trait, which is the only thing the solvers consume.
//!
//! Layout: factor rows are stacked in insertion order; variable columns
//! follow ascending key order ([`KeyDimMap::offsets`]); the right-hand
//! side sits in column `C = total_dim`.

use factorlsq_math::assembly::AugmentedMatrix;
use factorlsq_math::sparse::SparseEntry;
use factorlsq_types::constants::JACOBIAN_DROP_TOLERANCE;
use factorlsq_types::{Key, LsqError, LsqResult};

use crate::mapper::KeyDimMap;

/// A linear least-squares problem `min ‖Ax − b‖₂` over keyed variables.
///
/// Consumed by reference and never mutated by the solvers.
pub trait LinearSystem {
    /// Entries of the augmented matrix `[A | b]`.
    ///
    /// Every equation row must emit its right-hand side at column
    /// `key_dim_map().total_dim()`, even when zero.
    fn sparse_jacobian(&self) -> Vec<SparseEntry>;

    /// Dimension of every variable, in column order.
    fn key_dim_map(&self) -> KeyDimMap;
}

/// The coefficient block of one variable inside a factor.
///
/// Stored dense, row-major, `rows × cols`.
#[derive(Debug, Clone, PartialEq)]
pub struct JacobianBlock {
    key: Key,
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl JacobianBlock {
    /// Creates a block from row-major values.
    pub fn new(key: Key, rows: usize, cols: usize, values: Vec<f64>) -> LsqResult<Self> {
        if cols == 0 {
            return Err(LsqError::InvalidProblem(format!("block for {key} has zero columns")));
        }
        let len = rows
            .checked_mul(cols)
            .ok_or_else(|| LsqError::InvalidProblem(format!("block for {key} is too large")))?;
        if values.len() != len {
            return Err(LsqError::DimensionMismatch {
                expected: len,
                actual: values.len(),
            });
        }
        Ok(Self {
            key,
            rows,
            cols,
            values,
        })
    }

    /// Creates a block from a list of rows, which must all have the same length.
    pub fn from_rows(key: Key, rows: &[Vec<f64>]) -> LsqResult<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().position(|r| r.len() != cols) {
            return Err(LsqError::InvalidProblem(format!(
                "block for {key} is not rectangular: row {bad} has {} entries, expected {cols}",
                rows[bad].len()
            )));
        }
        Self::new(key, rows.len(), cols, rows.concat())
    }

    /// Variable this block multiplies.
    pub fn key(&self) -> Key {
        self.key
    }

    /// Number of rows (equations).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (variable dimension).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Entry at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }
}

/// A dense linear factor: `Σₖ Aₖ xₖ = b`.
#[derive(Debug, Clone, PartialEq)]
pub struct JacobianFactor {
    blocks: Vec<JacobianBlock>,
    rhs: Vec<f64>,
}

impl JacobianFactor {
    /// Creates a factor.
    ///
    /// Every block must have `rhs.len()` rows, and no key may appear twice.
    pub fn new(blocks: Vec<JacobianBlock>, rhs: Vec<f64>) -> LsqResult<Self> {
        if blocks.is_empty() {
            return Err(LsqError::InvalidProblem("factor has no blocks".into()));
        }
        if rhs.is_empty() {
            return Err(LsqError::InvalidProblem("factor has no rows".into()));
        }
        for (i, block) in blocks.iter().enumerate() {
            if block.rows != rhs.len() {
                return Err(LsqError::DimensionMismatch {
                    expected: rhs.len(),
                    actual: block.rows,
                });
            }
            if blocks[..i].iter().any(|b| b.key == block.key) {
                return Err(LsqError::InvalidProblem(format!(
                    "variable {} appears twice in one factor",
                    block.key
                )));
            }
        }
        Ok(Self { blocks, rhs })
    }

    /// Single-variable factor `A x = b` from row lists.
    pub fn unary(key: Key, a: &[Vec<f64>], rhs: Vec<f64>) -> LsqResult<Self> {
        Self::new(vec![JacobianBlock::from_rows(key, a)?], rhs)
    }

    /// Number of equation rows.
    pub fn rows(&self) -> usize {
        self.rhs.len()
    }

    /// Coefficient blocks.
    pub fn blocks(&self) -> &[JacobianBlock] {
        &self.blocks
    }

    /// Right-hand side.
    pub fn rhs(&self) -> &[f64] {
        &self.rhs
    }

    /// Upper bound on the sparse entries this factor emits: every
    /// coefficient plus one right-hand side entry per row.
    pub fn max_entries(&self) -> usize {
        let width: usize = self.blocks.iter().map(JacobianBlock::cols).sum();
        self.rows() * (width + 1)
    }

    /// Keys this factor touches, in block order.
    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.blocks.iter().map(JacobianBlock::key)
    }
}

/// A collection of linear factors over a shared set of variables.
#[derive(Debug, Clone, Default)]
pub struct LinearFactorGraph {
    factors: Vec<JacobianFactor>,
    dims: KeyDimMap,
}

impl LinearFactorGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a factor.
    ///
    /// Fails if a block disagrees with the dimension already recorded for
    /// its key; the graph is unchanged on failure.
    pub fn add(&mut self, factor: JacobianFactor) -> LsqResult<()> {
        let mut dims = self.dims.clone();
        for block in &factor.blocks {
            dims.insert(block.key, block.cols)?;
        }
        self.dims = dims;
        self.factors.push(factor);
        Ok(())
    }

    /// Number of factors.
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    /// Returns true if there are no factors.
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Total number of equation rows.
    pub fn rows(&self) -> usize {
        self.factors.iter().map(JacobianFactor::rows).sum()
    }

    /// Upper bound on [`LinearSystem::sparse_jacobian`]'s length; exact
    /// when no coefficient falls under the drop tolerance.
    pub fn max_entries(&self) -> usize {
        self.factors.iter().map(JacobianFactor::max_entries).sum()
    }

    /// The factors, in insertion order.
    pub fn factors(&self) -> &[JacobianFactor] {
        &self.factors
    }

    /// Assembles `[A | b]` for this graph.
    pub fn augmented_matrix(&self) -> LsqResult<AugmentedMatrix> {
        AugmentedMatrix::assemble(&self.sparse_jacobian())
    }
}

impl LinearSystem for LinearFactorGraph {
    fn sparse_jacobian(&self) -> Vec<SparseEntry> {
        let offsets = self.dims.offsets();
        let rhs_col = self.dims.total_dim();
        let mut entries = Vec::with_capacity(self.max_entries());

        let mut row = 0;
        for factor in &self.factors {
            for block in &factor.blocks {
                // `add` recorded every block key
                let col0 = offsets.get(&block.key).copied().unwrap_or_default();
                for r in 0..block.rows {
                    for c in 0..block.cols {
                        let v = block.get(r, c);
                        if v.abs() > JACOBIAN_DROP_TOLERANCE {
                            entries.push(SparseEntry::new(row + r, col0 + c, v));
                        }
                    }
                }
            }
            for (r, &b) in factor.rhs.iter().enumerate() {
                entries.push(SparseEntry::new(row + r, rhs_col, b));
            }
            row += factor.rows();
        }
        entries
    }

    fn key_dim_map(&self) -> KeyDimMap {
        self.dims.clone()
    }
}
