//! Fill-reducing column orderings.
//!
//! An [`OrderingPolicy`] names one of four elimination orderings. The
//! [`resolve`] lookup maps a policy to an [`OrderingAlgorithm`], which
//! computes a column [`Permutation`] of the coefficient matrix `A`. Both
//! solve strategies consume the same permutation: QR eliminates the
//! columns of `A P`, Cholesky factorizes `Pᵀ (AᵀA) P`.
//!
//! | policy    | algorithm                                   | backend        |
//! |-----------|---------------------------------------------|----------------|
//! | `NATURAL` | identity                                    | —              |
//! | `AMD`     | approximate minimum degree on `AᵀA`         | faer           |
//! | `COLAMD`  | column approximate minimum degree on `A`    | faer           |
//! | `METIS`   | nested dissection of the graph of `AᵀA`     | METIS (feature)|

use std::fmt;
use std::str::FromStr;

use faer::dyn_stack::{MemBuffer, MemStack};
use faer::perm::PermRef;
use faer::sparse::linalg::{amd, colamd};
use serde::{Deserialize, Serialize};
use tracing::debug;

use factorlsq_types::{LsqError, LsqResult};

use crate::sparse::CscMatrix;

/// Named elimination-ordering policy.
///
/// Parsed from exactly four case-sensitive tokens; see [`FromStr`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderingPolicy {
    /// Identity ordering (no permutation).
    Natural,
    /// Approximate minimum degree.
    Amd,
    /// Column approximate minimum degree. Applied when a configuration names none.
    #[default]
    Colamd,
    /// Graph-partitioning nested dissection.
    Metis,
}

impl OrderingPolicy {
    /// All policies, in a stable order.
    pub const ALL: [OrderingPolicy; 4] = [
        OrderingPolicy::Natural,
        OrderingPolicy::Amd,
        OrderingPolicy::Colamd,
        OrderingPolicy::Metis,
    ];

    /// The canonical token for this policy.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderingPolicy::Natural => "NATURAL",
            OrderingPolicy::Amd => "AMD",
            OrderingPolicy::Colamd => "COLAMD",
            OrderingPolicy::Metis => "METIS",
        }
    }
}

impl fmt::Display for OrderingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderingPolicy {
    type Err = LsqError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "NATURAL" => Ok(OrderingPolicy::Natural),
            "AMD" => Ok(OrderingPolicy::Amd),
            "COLAMD" => Ok(OrderingPolicy::Colamd),
            "METIS" => Ok(OrderingPolicy::Metis),
            other => Err(LsqError::UnsupportedOrdering(other.to_string())),
        }
    }
}

/// A permutation of `0..n` stored as forward and inverse arrays.
///
/// `fwd[new] = old`: position `new` of the permuted sequence holds element
/// `old` of the original. `inv` is the inverse map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permutation {
    fwd: Vec<usize>,
    inv: Vec<usize>,
}

impl Permutation {
    /// The identity permutation of length `n`.
    pub fn identity(n: usize) -> Self {
        Self {
            fwd: (0..n).collect(),
            inv: (0..n).collect(),
        }
    }

    /// Builds a permutation from its forward array, validating that it is a bijection.
    pub fn from_forward(fwd: Vec<usize>) -> LsqResult<Self> {
        let n = fwd.len();
        let mut inv = vec![usize::MAX; n];
        for (new, &old) in fwd.iter().enumerate() {
            if old >= n || inv[old] != usize::MAX {
                return Err(LsqError::OrderingFailed(format!(
                    "forward array is not a permutation of 0..{n} (entry {old} at {new})"
                )));
            }
            inv[old] = new;
        }
        Ok(Self { fwd, inv })
    }

    /// Length of the permuted sequence.
    pub fn len(&self) -> usize {
        self.fwd.len()
    }

    /// Returns true for the empty permutation.
    pub fn is_empty(&self) -> bool {
        self.fwd.is_empty()
    }

    /// Forward array (`fwd[new] = old`).
    pub fn fwd(&self) -> &[usize] {
        &self.fwd
    }

    /// Inverse array (`inv[old] = new`).
    pub fn inv(&self) -> &[usize] {
        &self.inv
    }

    /// Returns true if no element moves.
    pub fn is_identity(&self) -> bool {
        self.fwd.iter().enumerate().all(|(i, &p)| i == p)
    }

    /// Scatters a vector expressed in permuted order back to original order.
    ///
    /// `out[fwd[new]] = permuted[new]`.
    pub fn unpermute(&self, permuted: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; permuted.len()];
        for (new, &old) in self.fwd.iter().enumerate() {
            out[old] = permuted[new];
        }
        out
    }

    /// Borrows the permutation as a faer permutation view.
    pub fn as_faer(&self) -> PermRef<'_, usize> {
        PermRef::new_checked(&self.fwd, &self.inv, self.fwd.len())
    }
}

/// A fill-reducing ordering strategy.
///
/// Implementations compute a column permutation of the coefficient matrix
/// from its sparsity pattern alone; values never influence the result.
pub trait OrderingAlgorithm: Send + Sync {
    /// The policy this algorithm implements.
    fn policy(&self) -> OrderingPolicy;

    /// Compute the column permutation for `a` (`rows × cols`, sorted CSC).
    fn column_permutation(&self, a: &CscMatrix) -> LsqResult<Permutation>;
}

/// Identity ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalOrdering;

impl OrderingAlgorithm for NaturalOrdering {
    fn policy(&self) -> OrderingPolicy {
        OrderingPolicy::Natural
    }

    fn column_permutation(&self, a: &CscMatrix) -> LsqResult<Permutation> {
        Ok(Permutation::identity(a.ncols()))
    }
}

/// Approximate minimum degree ordering of the normal-equations pattern `AᵀA`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmdOrdering {
    pub control: amd::Control,
}

impl OrderingAlgorithm for AmdOrdering {
    fn policy(&self) -> OrderingPolicy {
        OrderingPolicy::Amd
    }

    fn column_permutation(&self, a: &CscMatrix) -> LsqResult<Permutation> {
        let n = a.ncols();
        if n == 0 {
            return Ok(Permutation::identity(0));
        }
        let gram = a.gram()?;
        let mut fwd = vec![0usize; n];
        let mut inv = vec![0usize; n];

        let mut mem = MemBuffer::new(amd::order_maybe_unsorted_scratch::<usize>(n, gram.nnz()));
        let flops = amd::order_maybe_unsorted(
            &mut fwd,
            &mut inv,
            gram.faer_symbolic(),
            self.control,
            MemStack::new(&mut mem),
        )
        .map_err(|e| LsqError::OrderingFailed(format!("AMD: {e:?}")))?;

        debug!(n, nnz = gram.nnz(), flops = ?flops, "amd ordering computed");
        Ok(Permutation { fwd, inv })
    }
}

/// Column approximate minimum degree ordering of `A`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColamdOrdering {
    pub control: colamd::Control,
}

impl OrderingAlgorithm for ColamdOrdering {
    fn policy(&self) -> OrderingPolicy {
        OrderingPolicy::Colamd
    }

    fn column_permutation(&self, a: &CscMatrix) -> LsqResult<Permutation> {
        let n = a.ncols();
        if n == 0 {
            return Ok(Permutation::identity(0));
        }
        let mut fwd = vec![0usize; n];
        let mut inv = vec![0usize; n];

        let mut mem = MemBuffer::new(colamd::order_scratch::<usize>(a.nrows(), n, a.nnz()));
        colamd::order(
            &mut fwd,
            &mut inv,
            a.faer_symbolic(),
            self.control,
            MemStack::new(&mut mem),
        )
        .map_err(|e| LsqError::OrderingFailed(format!("COLAMD: {e:?}")))?;

        debug!(rows = a.nrows(), cols = n, nnz = a.nnz(), "colamd ordering computed");
        Ok(Permutation { fwd, inv })
    }
}

/// Nested dissection ordering of the column-interaction graph of `A`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetisOrdering;

impl OrderingAlgorithm for MetisOrdering {
    fn policy(&self) -> OrderingPolicy {
        OrderingPolicy::Metis
    }

    #[cfg(feature = "metis")]
    fn column_permutation(&self, a: &CscMatrix) -> LsqResult<Permutation> {
        let gram = a.gram()?;
        crate::metis::nested_dissection(&gram)
    }

    #[cfg(not(feature = "metis"))]
    fn column_permutation(&self, _a: &CscMatrix) -> LsqResult<Permutation> {
        Err(LsqError::OrderingUnavailable(OrderingPolicy::Metis.to_string()))
    }
}

/// Map a policy to its ordering algorithm.
///
/// When the METIS backend is compiled out, resolving [`OrderingPolicy::Metis`]
/// fails with [`LsqError::OrderingUnavailable`]; no other ordering is
/// substituted.
pub fn resolve(policy: OrderingPolicy) -> LsqResult<Box<dyn OrderingAlgorithm>> {
    match policy {
        OrderingPolicy::Natural => Ok(Box::new(NaturalOrdering)),
        OrderingPolicy::Amd => Ok(Box::new(AmdOrdering::default())),
        OrderingPolicy::Colamd => Ok(Box::new(ColamdOrdering::default())),
        OrderingPolicy::Metis => {
            if cfg!(feature = "metis") {
                Ok(Box::new(MetisOrdering))
            } else {
                Err(LsqError::OrderingUnavailable(policy.to_string()))
            }
        }
    }
}

/// Parse an ordering token and resolve it in one step.
pub fn resolve_token(token: &str) -> LsqResult<Box<dyn OrderingAlgorithm>> {
    resolve(token.parse()?)
}
