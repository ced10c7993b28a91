//! Error types for factorlsq.
//!
//! All crates return `LsqResult<T>` from fallible operations.

use thiserror::Error;

/// Unified error type for assembly, ordering, and solving.
#[derive(Debug, Error)]
pub enum LsqError {
    /// A sparse entry has an unrepresentable index or a non-finite value.
    #[error("Malformed sparse entry at ({row}, {col}): {reason}")]
    MalformedEntry {
        row: usize,
        col: usize,
        reason: String,
    },

    /// The system has no coefficients to solve for.
    #[error("Empty system: no Jacobian entries to solve")]
    EmptySystem,

    /// The ordering token is not one of NATURAL, AMD, COLAMD, METIS.
    #[error("Unsupported ordering: '{0}' (expected NATURAL, AMD, COLAMD, or METIS)")]
    UnsupportedOrdering(String),

    /// The ordering is recognized but its backend was not compiled in.
    #[error("Ordering {0} is not available in this build")]
    OrderingUnavailable(String),

    /// The ordering backend failed to produce a permutation.
    #[error("Ordering failed: {0}")]
    OrderingFailed(String),

    /// Fewer equations than unknowns; QR least squares needs rows >= cols.
    #[error("Underdetermined system: {rows} rows < {cols} columns")]
    Underdetermined {
        rows: usize,
        cols: usize,
    },

    /// The sparse factorization could not be computed.
    #[error("Factorization failed: {0}")]
    Factorization(String),

    /// The solve produced NaN or infinite values (singular or rank-deficient system).
    #[error("Solution contains non-finite values (first at index {index})")]
    NonFiniteSolution {
        index: usize,
    },

    /// A sparse matrix could not be built or transformed.
    #[error("Sparse storage error: {0}")]
    SparseStorage(String),

    /// Variable dimensions disagree with the solution length.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
    },

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Problem description is malformed or inconsistent.
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for `Result<T, LsqError>`.
pub type LsqResult<T> = Result<T, LsqError>;
