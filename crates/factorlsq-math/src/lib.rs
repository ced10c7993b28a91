//! # factorlsq-math
//!
//! Sparse linear algebra for the factorlsq least-squares engine.
//!
//! Provides:
//! - Sparse entries and CSC storage built once from triplets
//! - Assembly of the augmented `[A | b]` matrix
//! - Fill-reducing column orderings (NATURAL, AMD, COLAMD, METIS)
//! - faer-backed QR and LDLᵀ solvers behind the [`SparseSolver`] trait

pub mod assembly;
pub mod faer_solver;
#[cfg(feature = "metis")]
mod metis;
pub mod ordering;
pub mod sparse;

pub use assembly::AugmentedMatrix;
pub use faer_solver::{FaerLdltSolver, FaerQrSolver};
pub use ordering::{OrderingAlgorithm, OrderingPolicy, Permutation};
pub use sparse::{CscMatrix, SparseEntry, SparseSolver};
