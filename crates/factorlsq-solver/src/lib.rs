//! # factorlsq-solver
//!
//! Direct sparse least-squares solves for linear factor graphs.
//!
//! ## Key Types
//!
//! - [`LinearSystem`] — input boundary: sparse `[A | b]` entries plus variable layout
//! - [`LinearFactorGraph`] — dense Jacobian factors over keyed variables
//! - [`SolveStrategy`] — pluggable factorization (QR or normal-equation Cholesky)
//! - [`SolverConfig`] — method and ordering selection
//! - [`VariableValues`] — per-key solution blocks

pub mod config;
pub mod graph;
pub mod mapper;
pub mod optimizer;
pub mod strategy;

pub use config::{SolveMethod, SolverConfig};
pub use factorlsq_math::ordering::OrderingPolicy;
pub use graph::{JacobianBlock, JacobianFactor, LinearFactorGraph, LinearSystem};
pub use mapper::{KeyDimMap, VariableValues};
pub use optimizer::{optimize_cholesky, optimize_qr, solve, solve_with_telemetry, PhaseTimings, SolveReport};
pub use strategy::{CholeskySolveStrategy, QrSolveStrategy, SolveStrategy};
