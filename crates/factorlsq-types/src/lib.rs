//! # factorlsq-types
//!
//! Shared identifiers, error types, and numerical constants
//! for the factorlsq sparse least-squares workspace.
//!
//! This crate has no numerical logic. It defines the vocabulary
//! that all other factorlsq crates share.

pub mod constants;
pub mod error;
pub mod ids;

pub use error::{LsqError, LsqResult};
pub use ids::Key;
