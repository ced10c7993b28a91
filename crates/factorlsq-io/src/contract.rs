//! Problem and solution file contract.
//!
//! These types define the JSON boundary of the solver. A problem file
//! lists dense Jacobian factors; a solution file carries the per-key
//! solution together with the diagnostics of the solve that produced it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use factorlsq_math::ordering::OrderingPolicy;
use factorlsq_solver::graph::{JacobianBlock, JacobianFactor, LinearFactorGraph};
use factorlsq_solver::optimizer::{PhaseTimings, SolveReport};
use factorlsq_solver::{SolveMethod, SolverConfig, VariableValues};
use factorlsq_types::{Key, LsqError, LsqResult};

/// A linear least-squares problem as stored on disk.
///
/// ```json
/// {
///   "factors": [
///     { "blocks": [{ "key": 0, "rows": [[1.0]] }], "rhs": [2.0] }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemFile {
    /// Factors in row order.
    pub factors: Vec<FactorSpec>,

    /// Solver settings stored alongside the problem. Command-line and
    /// config-file settings take precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<SolverConfig>,
}

/// One dense factor: `Σ blocks[k].rows · x[blocks[k].key] = rhs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorSpec {
    /// Coefficient blocks, one per variable.
    pub blocks: Vec<BlockSpec>,
    /// Right-hand side, one entry per equation row.
    pub rhs: Vec<f64>,
}

/// Coefficient block of one variable, as a list of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSpec {
    /// Variable key.
    pub key: Key,
    /// Dense rows; all rows share the variable's dimension.
    pub rows: Vec<Vec<f64>>,
}

impl ProblemFile {
    /// Parses a problem from JSON text.
    pub fn from_json_str(s: &str) -> LsqResult<Self> {
        serde_json::from_str(s).map_err(|e| LsqError::Serialization(format!("problem JSON: {e}")))
    }

    /// Reads a problem from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> LsqResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Renders the problem as pretty-printed JSON.
    pub fn to_json_string(&self) -> LsqResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| LsqError::Serialization(e.to_string()))
    }

    /// Builds the factor graph described by this file.
    pub fn to_graph(&self) -> LsqResult<LinearFactorGraph> {
        let mut graph = LinearFactorGraph::new();
        for (i, spec) in self.factors.iter().enumerate() {
            spec.to_factor()
                .and_then(|factor| graph.add(factor))
                .map_err(|e| LsqError::InvalidProblem(format!("factor {i}: {e}")))?;
        }
        Ok(graph)
    }
}

impl FactorSpec {
    /// Converts to a [`JacobianFactor`].
    pub fn to_factor(&self) -> LsqResult<JacobianFactor> {
        let blocks = self
            .blocks
            .iter()
            .map(|b| JacobianBlock::from_rows(b.key, &b.rows))
            .collect::<LsqResult<Vec<_>>>()?;
        JacobianFactor::new(blocks, self.rhs.clone())
    }
}

impl From<&JacobianFactor> for FactorSpec {
    fn from(factor: &JacobianFactor) -> Self {
        let blocks = factor
            .blocks()
            .iter()
            .map(|block| BlockSpec {
                key: block.key(),
                rows: (0..block.rows())
                    .map(|r| (0..block.cols()).map(|c| block.get(r, c)).collect())
                    .collect(),
            })
            .collect();
        Self {
            blocks,
            rhs: factor.rhs().to_vec(),
        }
    }
}

impl From<&LinearFactorGraph> for ProblemFile {
    fn from(graph: &LinearFactorGraph) -> Self {
        Self {
            factors: graph.factors().iter().map(FactorSpec::from).collect(),
            solver: None,
        }
    }
}

/// Diagnostics recorded with a solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveDiagnostics {
    /// Strategy that was applied.
    pub method: SolveMethod,
    /// Ordering that was applied.
    pub ordering: OrderingPolicy,
    /// Rows of `A`.
    pub rows: usize,
    /// Columns of `A`.
    pub cols: usize,
    /// Stored entries of `[A | b]`.
    pub nnz: usize,
    /// Stored entries of the factor.
    #[serde(default)]
    pub factor_nnz: usize,
    /// `‖Ax − b‖₂`, if computed.
    pub residual_norm: Option<f64>,
    /// Phase timings (seconds).
    pub timings: PhaseTimings,
}

/// A solved problem as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionFile {
    /// Per-key solution blocks.
    pub values: VariableValues,
    /// How the solution was obtained.
    pub diagnostics: SolveDiagnostics,
}

impl SolutionFile {
    /// Renders the solution as pretty-printed JSON.
    pub fn to_json_string(&self) -> LsqResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| LsqError::Serialization(e.to_string()))
    }

    /// Parses a solution from JSON text.
    pub fn from_json_str(s: &str) -> LsqResult<Self> {
        serde_json::from_str(s).map_err(|e| LsqError::Serialization(format!("solution JSON: {e}")))
    }

    /// Writes the solution as JSON to `path`.
    pub fn write_json_file(&self, path: impl AsRef<Path>) -> LsqResult<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

impl From<SolveReport> for SolutionFile {
    fn from(report: SolveReport) -> Self {
        Self {
            diagnostics: SolveDiagnostics {
                method: report.method,
                ordering: report.ordering,
                rows: report.rows,
                cols: report.cols,
                nnz: report.nnz,
                factor_nnz: report.factor_nnz,
                residual_norm: report.residual_norm,
                timings: report.timings,
            },
            values: report.values,
        }
    }
}
