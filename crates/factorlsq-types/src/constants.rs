//! Numerical defaults and tolerances.

/// Relative tolerance used when comparing solutions from different
/// strategies or orderings.
pub const AGREEMENT_TOLERANCE: f64 = 1.0e-8;

/// Jacobian coefficients with magnitude at or below this are not emitted
/// as sparse entries. Right-hand side entries are always emitted.
pub const JACOBIAN_DROP_TOLERANCE: f64 = 1.0e-12;
