//! Nested dissection ordering backed by METIS.
//!
//! Converts the off-diagonal pattern of a symmetric matrix into the
//! CSR adjacency METIS expects (`xadj`/`adjncy`) and calls
//! `METIS_NodeND`. METIS reports `perm[new] = old`, the same convention
//! as [`Permutation`].

use std::ptr;

use metis_sys::{idx_t, rstatus_et_METIS_OK};
use tracing::debug;

use factorlsq_types::{LsqError, LsqResult};

use crate::ordering::Permutation;
use crate::sparse::CscMatrix;

fn to_idx(value: usize) -> LsqResult<idx_t> {
    idx_t::try_from(value)
        .map_err(|_| LsqError::OrderingFailed(format!("METIS: index {value} exceeds idx_t range")))
}

/// Compute a nested dissection ordering of a symmetric pattern.
///
/// Graphs without edges have no fill to reduce and get the identity.
pub fn nested_dissection(symmetric: &CscMatrix) -> LsqResult<Permutation> {
    let n = symmetric.ncols();
    if symmetric.nrows() != n {
        return Err(LsqError::OrderingFailed(format!(
            "METIS: pattern must be square, got {}×{}",
            symmetric.nrows(),
            n
        )));
    }

    let mut xadj: Vec<idx_t> = Vec::with_capacity(n + 1);
    let mut adjncy: Vec<idx_t> = Vec::with_capacity(symmetric.nnz());
    xadj.push(0);
    for j in 0..n {
        for &i in symmetric.col_rows(j) {
            if i != j {
                adjncy.push(to_idx(i)?);
            }
        }
        xadj.push(to_idx(adjncy.len())?);
    }

    if adjncy.is_empty() {
        return Ok(Permutation::identity(n));
    }

    let mut nvtxs = to_idx(n)?;
    let mut perm: Vec<idx_t> = vec![0; n];
    let mut iperm: Vec<idx_t> = vec![0; n];

    // SAFETY: xadj has n+1 entries, adjncy holds xadj[n] entries, and
    // perm/iperm have n entries each. Null vwgt and options select
    // METIS defaults.
    let status = unsafe {
        metis_sys::METIS_NodeND(
            &mut nvtxs,
            xadj.as_mut_ptr(),
            adjncy.as_mut_ptr(),
            ptr::null_mut(),
            ptr::null_mut(),
            perm.as_mut_ptr(),
            iperm.as_mut_ptr(),
        )
    };
    if status != rstatus_et_METIS_OK {
        return Err(LsqError::OrderingFailed(format!("METIS_NodeND returned status {status}")));
    }

    let fwd = perm
        .into_iter()
        .map(|p| {
            usize::try_from(p)
                .map_err(|_| LsqError::OrderingFailed(format!("METIS: negative index {p}")))
        })
        .collect::<LsqResult<Vec<usize>>>()?;

    debug!(n, edges = adjncy.len() / 2, "metis nested dissection computed");
    Permutation::from_forward(fwd)
}
