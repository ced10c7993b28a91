//! Variable layout and solution mapping.
//!
//! A [`KeyDimMap`] assigns each variable key a block dimension. Column
//! offsets are implicit: keys are laid out in ascending order, each
//! occupying `dim` consecutive columns. [`expand`] walks the same layout
//! to slice a flat solution vector into per-key blocks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use factorlsq_types::{Key, LsqError, LsqResult};

/// Mapping from variable key to block dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyDimMap {
    dims: BTreeMap<Key, usize>,
}

impl KeyDimMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from `(key, dim)` pairs. See [`KeyDimMap::insert`].
    pub fn try_from_pairs<I>(pairs: I) -> LsqResult<Self>
    where
        I: IntoIterator<Item = (Key, usize)>,
    {
        let mut map = Self::new();
        for (key, dim) in pairs {
            map.insert(key, dim)?;
        }
        Ok(map)
    }

    /// Records the dimension of `key`.
    ///
    /// Zero dimensions are rejected. Re-inserting a key with the same
    /// dimension is a no-op; a different dimension is a conflict.
    pub fn insert(&mut self, key: Key, dim: usize) -> LsqResult<()> {
        if dim == 0 {
            return Err(LsqError::InvalidProblem(format!("variable {key} has zero dimension")));
        }
        match self.dims.get(&key) {
            Some(&existing) if existing != dim => Err(LsqError::DimensionMismatch {
                expected: existing,
                actual: dim,
            }),
            Some(_) => Ok(()),
            None => {
                self.dims.insert(key, dim);
                Ok(())
            }
        }
    }

    /// Dimension of `key`, if known.
    pub fn get(&self, key: Key) -> Option<usize> {
        self.dims.get(&key).copied()
    }

    /// Returns true if `key` is present.
    pub fn contains(&self, key: Key) -> bool {
        self.dims.contains_key(&key)
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.dims.len()
    }

    /// Returns true if there are no variables.
    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }

    /// Sum of all block dimensions (the number of columns of `A`).
    pub fn total_dim(&self) -> usize {
        self.dims.values().sum()
    }

    /// `(key, dim)` pairs in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (Key, usize)> + '_ {
        self.dims.iter().map(|(&k, &d)| (k, d))
    }

    /// First column of each key's block.
    pub fn offsets(&self) -> BTreeMap<Key, usize> {
        let mut offset = 0;
        self.dims
            .iter()
            .map(|(&key, &dim)| {
                let start = offset;
                offset += dim;
                (key, start)
            })
            .collect()
    }
}

/// Per-variable solution blocks.
///
/// Built once per solve from the flat solution and the [`KeyDimMap`];
/// keyed identically to that map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableValues {
    values: BTreeMap<Key, Vec<f64>>,
}

impl VariableValues {
    /// Block for `key`.
    pub fn get(&self, key: Key) -> Option<&[f64]> {
        self.values.get(&key).map(Vec::as_slice)
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no variables.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(key, block)` pairs in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (Key, &[f64])> + '_ {
        self.values.iter().map(|(&k, v)| (k, v.as_slice()))
    }

    /// Total number of scalars across all blocks.
    pub fn total_dim(&self) -> usize {
        self.values.values().map(Vec::len).sum()
    }

    /// Concatenates the blocks in ascending key order.
    pub fn to_flat(&self) -> Vec<f64> {
        self.values.values().flatten().copied().collect()
    }

    /// Consumes the values into the underlying map.
    pub fn into_inner(self) -> BTreeMap<Key, Vec<f64>> {
        self.values
    }
}

/// Slices `x` into per-key blocks following the layout of `dims`.
///
/// Fails with [`LsqError::DimensionMismatch`] unless the dimensions sum
/// to exactly `x.len()`.
pub fn expand(x: &[f64], dims: &KeyDimMap) -> LsqResult<VariableValues> {
    let total = dims.total_dim();
    if total != x.len() {
        return Err(LsqError::DimensionMismatch {
            expected: total,
            actual: x.len(),
        });
    }

    let mut values = BTreeMap::new();
    let mut offset = 0;
    for (key, dim) in dims.iter() {
        values.insert(key, x[offset..offset + dim].to_vec());
        offset += dim;
    }
    Ok(VariableValues { values })
}
