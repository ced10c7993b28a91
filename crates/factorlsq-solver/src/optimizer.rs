//! Solve entry points.
//!
//! Runs one solve end to end:
//! 1. **Assemble** — `[A | b]` from the system's sparse entries
//! 2. **Order** — column permutation of `A` from the selected policy
//! 3. **Factorize** — QR of `A P` or LDLᵀ of `Pᵀ AᵀA P`
//! 4. **Solve** — back-substitution, undo the permutation
//! 5. **Map** — slice `x` into per-key blocks
//!
//! Each call owns all of its buffers; nothing is cached between solves.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use factorlsq_math::assembly::AugmentedMatrix;
use factorlsq_math::ordering::{self, OrderingPolicy};
use factorlsq_telemetry::{EventBus, EventKind};
use factorlsq_types::{LsqError, LsqResult};

use crate::config::{SolveMethod, SolverConfig};
use crate::graph::LinearSystem;
use crate::mapper::{self, VariableValues};
use crate::strategy;

/// Wall-clock time spent in each phase (seconds).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseTimings {
    pub assembly: f64,
    pub ordering: f64,
    pub factorization: f64,
    pub solve: f64,
}

impl PhaseTimings {
    /// Sum of all phases.
    pub fn total(&self) -> f64 {
        self.assembly + self.ordering + self.factorization + self.solve
    }
}

/// Solution plus diagnostics for one solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    /// Per-variable solution blocks.
    pub values: VariableValues,
    /// Rows of `A`.
    pub rows: usize,
    /// Columns of `A`.
    pub cols: usize,
    /// Stored entries of `[A | b]`.
    pub nnz: usize,
    /// Stored entries of the factor, a direct measure of ordering fill.
    pub factor_nnz: usize,
    /// Ordering that was applied.
    pub ordering: OrderingPolicy,
    /// Strategy that was applied.
    pub method: SolveMethod,
    /// Phase timings.
    pub timings: PhaseTimings,
    /// `‖Ax − b‖₂`, when requested by the config.
    pub residual_norm: Option<f64>,
}

/// Solves `system` by sparse QR under the named ordering.
pub fn optimize_qr<S>(system: &S, ordering_token: &str) -> LsqResult<VariableValues>
where
    S: LinearSystem + ?Sized,
{
    let config = SolverConfig {
        compute_residual: false,
        ..SolverConfig::with_token(SolveMethod::Qr, ordering_token)?
    };
    solve(system, &config).map(|report| report.values)
}

/// Solves `system` by Cholesky on the normal equations under the named ordering.
pub fn optimize_cholesky<S>(system: &S, ordering_token: &str) -> LsqResult<VariableValues>
where
    S: LinearSystem + ?Sized,
{
    let config = SolverConfig {
        compute_residual: false,
        ..SolverConfig::with_token(SolveMethod::Cholesky, ordering_token)?
    };
    solve(system, &config).map(|report| report.values)
}

/// Solves `system` with the given configuration.
pub fn solve<S>(system: &S, config: &SolverConfig) -> LsqResult<SolveReport>
where
    S: LinearSystem + ?Sized,
{
    run(system, config, None)
}

/// Like [`solve`], emitting a [`SolveEvent`](factorlsq_telemetry::SolveEvent)
/// at every phase boundary. The caller flushes the bus.
pub fn solve_with_telemetry<S>(system: &S, config: &SolverConfig, bus: &EventBus) -> LsqResult<SolveReport>
where
    S: LinearSystem + ?Sized,
{
    run(system, config, Some(bus))
}

fn emit(bus: Option<&EventBus>, kind: EventKind) {
    if let Some(bus) = bus {
        bus.emit(kind);
    }
}

fn fail(bus: Option<&EventBus>, phase: &str, error: LsqError) -> LsqError {
    warn!(phase, error = %error, "solve failed");
    emit(
        bus,
        EventKind::Failed {
            phase: phase.to_string(),
            message: error.to_string(),
        },
    );
    error
}

fn run<S>(system: &S, config: &SolverConfig, bus: Option<&EventBus>) -> LsqResult<SolveReport>
where
    S: LinearSystem + ?Sized,
{
    let mut timings = PhaseTimings::default();

    let algorithm = ordering::resolve(config.ordering).map_err(|e| fail(bus, "ordering", e))?;

    // Assembly
    let start = Instant::now();
    let entries = system.sparse_jacobian();
    let dims = system.key_dim_map();
    let ab = AugmentedMatrix::assemble(&entries).map_err(|e| fail(bus, "assembly", e))?;
    let (a, b) = ab.split().map_err(|e| fail(bus, "assembly", e))?;
    if a.ncols() != dims.total_dim() {
        return Err(fail(
            bus,
            "assembly",
            LsqError::DimensionMismatch {
                expected: dims.total_dim(),
                actual: a.ncols(),
            },
        ));
    }
    timings.assembly = start.elapsed().as_secs_f64();
    let (rows, cols) = ab.shape();
    debug!(rows, cols, nnz = ab.nnz(), "assembled");
    emit(
        bus,
        EventKind::Assembled {
            rows,
            cols,
            nnz: ab.nnz(),
            elapsed: timings.assembly,
        },
    );

    // Ordering
    let start = Instant::now();
    let permutation = algorithm
        .column_permutation(&a)
        .map_err(|e| fail(bus, "ordering", e))?;
    timings.ordering = start.elapsed().as_secs_f64();
    emit(
        bus,
        EventKind::OrderingComputed {
            policy: config.ordering.to_string(),
            elapsed: timings.ordering,
        },
    );

    // Factorization
    let start = Instant::now();
    let mut strategy = strategy::strategy_for(config.method);
    strategy
        .factorize(&a, &permutation)
        .map_err(|e| fail(bus, "factorization", e))?;
    timings.factorization = start.elapsed().as_secs_f64();
    let factor_nnz = strategy.factor_len();
    debug!(method = strategy.name(), factor_nnz, "factorized");
    emit(
        bus,
        EventKind::Factorized {
            method: config.method.to_string(),
            factor_nnz,
            elapsed: timings.factorization,
        },
    );

    // Solve
    let start = Instant::now();
    let x = strategy.solve(&b).map_err(|e| fail(bus, "solve", e))?;
    timings.solve = start.elapsed().as_secs_f64();

    let residual_norm = if config.compute_residual {
        let ax = a.mul_vec(&x).map_err(|e| fail(bus, "solve", e))?;
        Some(ax.iter().zip(&b).map(|(p, q)| (p - q) * (p - q)).sum::<f64>().sqrt())
    } else {
        None
    };
    emit(
        bus,
        EventKind::Solved {
            unknowns: x.len(),
            residual_norm,
            elapsed: timings.solve,
        },
    );

    let values = mapper::expand(&x, &dims).map_err(|e| fail(bus, "mapping", e))?;

    info!(
        method = %config.method,
        ordering = %config.ordering,
        rows = a.nrows(),
        cols = a.ncols(),
        nnz = ab.nnz(),
        elapsed = timings.total(),
        "solve complete"
    );

    Ok(SolveReport {
        values,
        rows: a.nrows(),
        cols: a.ncols(),
        nnz: ab.nnz(),
        factor_nnz,
        ordering: config.ordering,
        method: config.method,
        timings,
        residual_norm,
    })
}
