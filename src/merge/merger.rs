//! Low-rank adapter merge into base weights

use super::error::MergeError;
use crate::lora::AdapterDelta;
use crate::tensor::{NamedTensor, TensorSet};
use std::collections::BTreeMap;

/// Result of merging adapter deltas into a base tensor set
#[derive(Debug, Clone, PartialEq)]
pub struct MergedModel {
    /// Merged tensors: same names, shapes and dtypes as the base
    pub tensors: TensorSet,
    /// Number of distinct base tensors rewritten
    pub tensors_merged: usize,
    /// Number of deltas applied
    pub deltas_applied: usize,
}

impl MergedModel {
    /// Total parameter count
    #[must_use]
    pub fn param_count(&self) -> u64 {
        self.tensors.param_count()
    }

    /// Take the merged tensor set
    #[must_use]
    pub fn into_tensors(self) -> TensorSet {
        self.tensors
    }
}

/// Combines a base [`TensorSet`] with an ordered list of [`AdapterDelta`]s
///
/// Deltas targeting the same tensor are applied in insertion order and
/// accumulated in an f32 buffer before a single cast back to the base dtype.
#[derive(Debug, Clone, Default)]
pub struct WeightMerger {
    deltas: Vec<AdapterDelta>,
}

impl WeightMerger {
    /// Create a merger with no deltas
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a merger from deltas in application order
    #[must_use]
    pub fn with_deltas(deltas: Vec<AdapterDelta>) -> Self {
        Self { deltas }
    }

    /// Append a delta
    pub fn push(&mut self, delta: AdapterDelta) {
        self.deltas.push(delta);
    }

    /// Append deltas, preserving their order
    pub fn extend(&mut self, deltas: impl IntoIterator<Item = AdapterDelta>) {
        self.deltas.extend(deltas);
    }

    /// Deltas in application order
    #[must_use]
    pub fn deltas(&self) -> &[AdapterDelta] {
        &self.deltas
    }

    /// Check every delta against the base set without touching any tensor
    ///
    /// # Errors
    ///
    /// Returns the first [`MergeError::UnknownTarget`],
    /// [`MergeError::UnsupportedDtype`] or [`MergeError::ShapeMismatch`]
    /// found, in delta order.
    pub fn validate(&self, base: &TensorSet) -> Result<(), MergeError> {
        for delta in &self.deltas {
            let tensor = base
                .get(delta.target())
                .ok_or_else(|| MergeError::UnknownTarget { tensor: delta.target().to_string() })?;
            check_target(tensor, delta)?;
        }
        Ok(())
    }

    /// Merge all deltas into `base`
    ///
    /// The base set is consumed and rewritten in place one target tensor at
    /// a time; tensors no delta targets are moved through untouched. Nothing
    /// is modified unless every delta validates.
    ///
    /// # Errors
    ///
    /// See [`WeightMerger::validate`].
    pub fn merge(&self, mut base: TensorSet) -> Result<MergedModel, MergeError> {
        self.validate(&base)?;

        let mut by_target: BTreeMap<&str, Vec<&AdapterDelta>> = BTreeMap::new();
        for delta in &self.deltas {
            by_target.entry(delta.target()).or_default().push(delta);
        }

        for (target, deltas) in &by_target {
            let tensor = base
                .get_mut(target)
                .ok_or_else(|| MergeError::UnknownTarget { tensor: (*target).to_string() })?;

            let mut acc = tensor.to_f32()?;
            for delta in deltas {
                delta.accumulate_into(&mut acc);
            }
            tensor.store_f32(&acc)?;
        }

        Ok(MergedModel {
            tensors: base,
            tensors_merged: by_target.len(),
            deltas_applied: self.deltas.len(),
        })
    }
}

fn check_target(tensor: &NamedTensor, delta: &AdapterDelta) -> Result<(), MergeError> {
    if !tensor.dtype().is_mergeable() {
        return Err(MergeError::UnsupportedDtype {
            tensor: tensor.name().to_string(),
            dtype: tensor.dtype(),
        });
    }
    let delta_shape = delta.delta_shape();
    if tensor.shape() != delta_shape.as_slice() {
        return Err(MergeError::ShapeMismatch {
            tensor: tensor.name().to_string(),
            expected: tensor.shape().to_vec(),
            actual: delta_shape.to_vec(),
        });
    }
    Ok(())
}

/// Merge `deltas` into `base` in the given order
///
/// # Errors
///
/// See [`WeightMerger::validate`].
pub fn merge_deltas(base: TensorSet, deltas: Vec<AdapterDelta>) -> Result<MergedModel, MergeError> {
    WeightMerger::with_deltas(deltas).merge(base)
}
