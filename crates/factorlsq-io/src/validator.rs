//! Problem and configuration validation.
//!
//! Validates problem files before the solver receives them,
//! catching data-level errors early with clear diagnostics.

use std::collections::BTreeMap;

use factorlsq_solver::SolverConfig;
use factorlsq_types::{Key, LsqError, LsqResult};

use crate::contract::{FactorSpec, ProblemFile};

/// Validates a complete problem file.
///
/// Checks:
/// - Every factor has at least one block and one equation row
/// - Blocks are rectangular, non-empty, and have one row per rhs entry
/// - No key appears twice within a factor
/// - Each key has the same dimension in every factor
/// - All coefficients and rhs entries are finite
/// - Embedded solver settings, if any, are usable
pub fn validate_problem(problem: &ProblemFile) -> LsqResult<()> {
    let mut dims: BTreeMap<Key, (usize, usize)> = BTreeMap::new();

    for (i, factor) in problem.factors.iter().enumerate() {
        validate_factor(factor)
            .map_err(|reason| LsqError::InvalidProblem(format!("factor {i}: {reason}")))?;

        for block in &factor.blocks {
            let dim = block.rows.first().map_or(0, Vec::len);
            match dims.get(&block.key) {
                Some(&(first, expected)) if expected != dim => {
                    return Err(LsqError::InvalidProblem(format!(
                        "factor {i}: variable {} has dimension {dim}, but factor {first} gives {expected}",
                        block.key
                    )));
                }
                Some(_) => {}
                None => {
                    dims.insert(block.key, (i, dim));
                }
            }
        }
    }

    if let Some(config) = &problem.solver {
        validate_config(config)?;
    }
    Ok(())
}

fn validate_factor(factor: &FactorSpec) -> Result<(), String> {
    if factor.blocks.is_empty() {
        return Err("no blocks".into());
    }
    if factor.rhs.is_empty() {
        return Err("empty rhs".into());
    }
    if let Some(r) = factor.rhs.iter().position(|v| !v.is_finite()) {
        return Err(format!("rhs[{r}] is not finite"));
    }

    for (j, block) in factor.blocks.iter().enumerate() {
        if factor.blocks[..j].iter().any(|b| b.key == block.key) {
            return Err(format!("variable {} appears twice", block.key));
        }
        if block.rows.len() != factor.rhs.len() {
            return Err(format!(
                "block {} has {} rows, rhs has {}",
                block.key,
                block.rows.len(),
                factor.rhs.len()
            ));
        }
        let width = block.rows[0].len();
        if width == 0 {
            return Err(format!("block {} has zero columns", block.key));
        }
        for (r, row) in block.rows.iter().enumerate() {
            if row.len() != width {
                return Err(format!(
                    "block {} row {r} has {} entries, expected {width}",
                    block.key,
                    row.len()
                ));
            }
            if let Some(c) = row.iter().position(|v| !v.is_finite()) {
                return Err(format!("block {} entry ({r}, {c}) is not finite", block.key));
            }
        }
    }
    Ok(())
}

/// Validates solver settings.
pub fn validate_config(config: &SolverConfig) -> LsqResult<()> {
    config.validate()
}
