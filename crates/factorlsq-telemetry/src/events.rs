//! Solve event types.
//!
//! Structured events emitted at each phase boundary of a solve. Events
//! are lightweight value types: names and counts, never matrices.

use serde::{Deserialize, Serialize};

/// A solve event emitted by the solver.
///
/// `sequence` is assigned by the [`EventBus`](crate::bus::EventBus) and
/// increases monotonically per bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveEvent {
    /// Emission order within the bus (0-indexed).
    pub sequence: u64,
    /// Event payload.
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// `[A | b]` was assembled from the system's entries.
    Assembled {
        /// Rows of `[A | b]`.
        rows: usize,
        /// Columns of `[A | b]`, including the right-hand side.
        cols: usize,
        /// Stored entries after duplicate summation.
        nnz: usize,
        /// Wall-clock time (seconds).
        elapsed: f64,
    },

    /// A column ordering was computed.
    OrderingComputed {
        /// Ordering token (`NATURAL`, `AMD`, `COLAMD`, `METIS`).
        policy: String,
        /// Wall-clock time (seconds).
        elapsed: f64,
    },

    /// Numeric factorization completed.
    Factorized {
        /// Strategy name (`qr` or `cholesky`).
        method: String,
        /// Stored entries of the factor.
        factor_nnz: usize,
        /// Wall-clock time (seconds).
        elapsed: f64,
    },

    /// The system was solved.
    Solved {
        /// Number of scalar unknowns.
        unknowns: usize,
        /// `‖Ax − b‖₂` at the solution, when computed.
        residual_norm: Option<f64>,
        /// Wall-clock time (seconds).
        elapsed: f64,
    },

    /// A phase failed; no later events follow for this solve.
    Failed {
        /// Phase name (`assembly`, `ordering`, `factorization`, `solve`, `mapping`).
        phase: String,
        /// Rendered error message.
        message: String,
    },

    /// Custom event for extensibility.
    Custom {
        /// Arbitrary label.
        label: String,
        /// JSON-encoded payload.
        payload: String,
    },
}

impl EventKind {
    /// Short lowercase label for the variant.
    pub fn label(&self) -> &str {
        match self {
            EventKind::Assembled { .. } => "assembled",
            EventKind::OrderingComputed { .. } => "ordering_computed",
            EventKind::Factorized { .. } => "factorized",
            EventKind::Solved { .. } => "solved",
            EventKind::Failed { .. } => "failed",
            EventKind::Custom { label, .. } => label,
        }
    }
}

impl SolveEvent {
    /// Creates a new event with the given sequence number.
    pub fn new(sequence: u64, kind: EventKind) -> Self {
        Self { sequence, kind }
    }
}
