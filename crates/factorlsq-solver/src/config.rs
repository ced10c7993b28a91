//! Solver configuration.
//!
//! Selects the solve strategy and the column ordering. Loadable from
//! TOML; every field has a default so partial files are accepted. A
//! partial file can also be layered over an existing config, in which
//! case only the keys it names change.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use factorlsq_math::ordering::{self, OrderingPolicy};
use factorlsq_types::{LsqError, LsqResult};

/// Which factorization solves the least-squares problem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveMethod {
    /// Householder QR of `A`. Better conditioned, slower.
    Qr,
    /// LDLᵀ of the normal equations `AᵀA`. Squares the condition number.
    #[default]
    Cholesky,
}

impl SolveMethod {
    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            SolveMethod::Qr => "qr",
            SolveMethod::Cholesky => "cholesky",
        }
    }
}

impl fmt::Display for SolveMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SolveMethod {
    type Err = LsqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "qr" => Ok(SolveMethod::Qr),
            "cholesky" => Ok(SolveMethod::Cholesky),
            _ => Err(LsqError::InvalidConfig(format!(
                "unknown solve method '{s}' (expected qr or cholesky)"
            ))),
        }
    }
}

/// Configuration for a single solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Factorization strategy.
    pub method: SolveMethod,

    /// Column ordering applied before factorization.
    pub ordering: OrderingPolicy,

    /// Whether to compute `‖Ax − b‖₂` for the report (one extra mat-vec).
    pub compute_residual: bool,
}

/// The keys a TOML layer actually sets.
#[derive(Debug, Deserialize)]
struct SolverConfigLayer {
    method: Option<SolveMethod>,
    ordering: Option<OrderingPolicy>,
    compute_residual: Option<bool>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            method: SolveMethod::default(),
            ordering: OrderingPolicy::default(),
            compute_residual: true,
        }
    }
}

impl SolverConfig {
    /// QR with COLAMD: for ill-conditioned systems.
    pub fn robust() -> Self {
        Self {
            method: SolveMethod::Qr,
            ordering: OrderingPolicy::Colamd,
            ..Default::default()
        }
    }

    /// Cholesky with AMD: for well-conditioned systems.
    pub fn fast() -> Self {
        Self {
            method: SolveMethod::Cholesky,
            ordering: OrderingPolicy::Amd,
            ..Default::default()
        }
    }

    /// Builds a config from a method and an ordering token.
    pub fn with_token(method: SolveMethod, ordering_token: &str) -> LsqResult<Self> {
        Ok(Self {
            method,
            ordering: ordering_token.parse()?,
            ..Default::default()
        })
    }

    /// Parses a TOML document.
    pub fn from_toml_str(s: &str) -> LsqResult<Self> {
        toml::from_str(s).map_err(|e| LsqError::InvalidConfig(format!("TOML parse error: {e}")))
    }

    /// Reads and parses a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> LsqResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Applies the keys set in a TOML document on top of `self`.
    ///
    /// Keys the document omits keep their current value.
    pub fn overlay_toml_str(&mut self, s: &str) -> LsqResult<()> {
        let layer: SolverConfigLayer =
            toml::from_str(s).map_err(|e| LsqError::InvalidConfig(format!("TOML parse error: {e}")))?;
        if let Some(method) = layer.method {
            self.method = method;
        }
        if let Some(ordering) = layer.ordering {
            self.ordering = ordering;
        }
        if let Some(compute_residual) = layer.compute_residual {
            self.compute_residual = compute_residual;
        }
        Ok(())
    }

    /// Reads a TOML file and applies it with [`Self::overlay_toml_str`].
    pub fn overlay_toml_file(&mut self, path: impl AsRef<Path>) -> LsqResult<()> {
        let text = std::fs::read_to_string(path)?;
        self.overlay_toml_str(&text)
    }

    /// Renders the config as TOML.
    pub fn to_toml_string(&self) -> LsqResult<String> {
        toml::to_string(self).map_err(|e| LsqError::Serialization(e.to_string()))
    }

    /// Checks that the selected ordering is available in this build.
    pub fn validate(&self) -> LsqResult<()> {
        ordering::resolve(self.ordering).map(|_| ())
    }
}
