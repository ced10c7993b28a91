//! # factorlsq-io
//!
//! Problem/solution file contract and input validation.
//!
//! Defines the boundary types that external systems (CLI, scripts)
//! use to hand problems to the solver and read results back.

pub mod contract;
pub mod validator;

pub use contract::{BlockSpec, FactorSpec, ProblemFile, SolutionFile, SolveDiagnostics};
pub use validator::{validate_config, validate_problem};
