//! Solve strategies: QR of `A` or LDLᵀ of the normal equations.
//!
//! Both strategies consume the coefficient matrix `A` together with a
//! column [`Permutation`] computed by the selected ordering, so the same
//! assembly and ordering feed either factorization.

use factorlsq_math::assembly::AugmentedMatrix;
use factorlsq_math::faer_solver::{FaerLdltSolver, FaerQrSolver};
use factorlsq_math::ordering::{self, OrderingPolicy, Permutation};
use factorlsq_math::sparse::{CscMatrix, SparseSolver};
use factorlsq_types::{LsqError, LsqResult};

use crate::config::SolveMethod;

/// Trait for least-squares solve strategies.
///
/// The optimizer calls these methods in order:
///
/// ```text
/// strategy.factorize(&a, &permutation)?;
/// let x = strategy.solve(&b)?;
/// ```
///
/// # Implementations
///
/// - [`QrSolveStrategy`] — sparse QR of `A`
/// - [`CholeskySolveStrategy`] — sparse LDLᵀ of `AᵀA`
pub trait SolveStrategy: Send {
    /// Which method this strategy implements.
    fn method(&self) -> SolveMethod;

    /// Factorize under the given column ordering of `A`.
    fn factorize(&mut self, a: &CscMatrix, ordering: &Permutation) -> LsqResult<()>;

    /// Solve `min ‖Ax − b‖₂` with the cached factorization.
    fn solve(&self, b: &[f64]) -> LsqResult<Vec<f64>>;

    /// Stored entries of the current factor; zero before factorization.
    fn factor_len(&self) -> usize;

    /// Returns the strategy's name.
    fn name(&self) -> &str;

    /// Split `[A | b]`, order, factorize and solve in one call.
    fn solve_augmented(&mut self, ab: &AugmentedMatrix, policy: OrderingPolicy) -> LsqResult<Vec<f64>> {
        let algorithm = ordering::resolve(policy)?;
        let (a, b) = ab.split()?;
        let permutation = algorithm.column_permutation(&a)?;
        self.factorize(&a, &permutation)?;
        self.solve(&b)
    }
}

/// Least squares by sparse QR of `A P`.
pub struct QrSolveStrategy {
    solver: FaerQrSolver,
}

impl QrSolveStrategy {
    /// Creates a new strategy (unfactorized).
    pub fn new() -> Self {
        Self {
            solver: FaerQrSolver::new(),
        }
    }
}

impl Default for QrSolveStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl SolveStrategy for QrSolveStrategy {
    fn method(&self) -> SolveMethod {
        SolveMethod::Qr
    }

    fn factorize(&mut self, a: &CscMatrix, ordering: &Permutation) -> LsqResult<()> {
        self.solver.factorize(a, ordering)
    }

    fn solve(&self, b: &[f64]) -> LsqResult<Vec<f64>> {
        self.solver.solve(b)
    }

    fn factor_len(&self) -> usize {
        self.solver.factor_len()
    }

    fn name(&self) -> &str {
        self.solver.name()
    }
}

/// Least squares by LDLᵀ of the normal equations `AᵀA x = Aᵀb`.
///
/// The permutation is applied symmetrically: `Pᵀ (AᵀA) P`.
pub struct CholeskySolveStrategy {
    solver: FaerLdltSolver,
    /// `Aᵀ`, kept to form `c = Aᵀb` at solve time.
    at: Option<CscMatrix>,
}

impl CholeskySolveStrategy {
    /// Creates a new strategy (unfactorized).
    pub fn new() -> Self {
        Self {
            solver: FaerLdltSolver::new(),
            at: None,
        }
    }
}

impl Default for CholeskySolveStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl SolveStrategy for CholeskySolveStrategy {
    fn method(&self) -> SolveMethod {
        SolveMethod::Cholesky
    }

    fn factorize(&mut self, a: &CscMatrix, ordering: &Permutation) -> LsqResult<()> {
        if a.ncols() == 0 {
            return Err(LsqError::EmptySystem);
        }
        self.at = None;
        let normal = a.gram()?;
        self.solver.factorize(&normal, ordering)?;
        self.at = Some(a.transpose()?);
        Ok(())
    }

    fn solve(&self, b: &[f64]) -> LsqResult<Vec<f64>> {
        let at = self
            .at
            .as_ref()
            .ok_or_else(|| LsqError::Factorization("strategy not factorized; call factorize() first".into()))?;
        let c = at.mul_vec(b)?;
        self.solver.solve(&c)
    }

    fn factor_len(&self) -> usize {
        self.solver.factor_len()
    }

    fn name(&self) -> &str {
        self.solver.name()
    }
}

/// Creates a fresh strategy for `method`.
pub fn strategy_for(method: SolveMethod) -> Box<dyn SolveStrategy> {
    match method {
        SolveMethod::Qr => Box::new(QrSolveStrategy::new()),
        SolveMethod::Cholesky => Box::new(CholeskySolveStrategy::new()),
    }
}
