//! Ordered collection of named tensors forming one model's weight state

use super::{DType, NamedTensor, TensorError};
use std::collections::BTreeMap;

/// One model's full set of tensors, keyed by unique name
///
/// Iteration follows the lexicographic order of tensor names, which keeps
/// every serialization of the set deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TensorSet {
    tensors: BTreeMap<String, NamedTensor>,
}

impl TensorSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from tensors, rejecting duplicate names
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::DuplicateName`] when two tensors share a name.
    pub fn from_tensors(tensors: impl IntoIterator<Item = NamedTensor>) -> Result<Self, TensorError> {
        let mut set = Self::new();
        for tensor in tensors {
            set.insert(tensor)?;
        }
        Ok(set)
    }

    /// Add a tensor
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::DuplicateName`] if the name is already present.
    pub fn insert(&mut self, tensor: NamedTensor) -> Result<(), TensorError> {
        if self.tensors.contains_key(tensor.name()) {
            return Err(TensorError::DuplicateName { name: tensor.name().to_string() });
        }
        self.tensors.insert(tensor.name().to_string(), tensor);
        Ok(())
    }

    /// Look up a tensor by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&NamedTensor> {
        self.tensors.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut NamedTensor> {
        self.tensors.get_mut(name)
    }

    /// Check whether a tensor is present
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tensors.contains_key(name)
    }

    /// Number of tensors
    #[must_use]
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Whether the set holds no tensors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Tensor names in iteration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    /// Tensors in iteration order
    pub fn iter(&self) -> impl Iterator<Item = &NamedTensor> {
        self.tensors.values()
    }

    /// Total element count across all tensors
    #[must_use]
    pub fn param_count(&self) -> u64 {
        self.tensors.values().map(|t| t.numel() as u64).sum()
    }

    /// Total size of all tensor buffers in bytes
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.tensors.values().map(|t| t.byte_len() as u64).sum()
    }

    /// Convert every floating-point tensor to `dtype`, one tensor at a time
    ///
    /// # Errors
    ///
    /// Returns an error if `dtype` is not a floating-point type.
    pub fn cast_floats(self, dtype: DType) -> Result<Self, TensorError> {
        let mut tensors = BTreeMap::new();
        for (name, tensor) in self.tensors {
            tensors.insert(name, tensor.cast(dtype)?);
        }
        Ok(Self { tensors })
    }
}

impl IntoIterator for TensorSet {
    type Item = NamedTensor;
    type IntoIter = std::collections::btree_map::IntoValues<String, NamedTensor>;

    fn into_iter(self) -> Self::IntoIter {
        self.tensors.into_values()
    }
}

impl<'a> IntoIterator for &'a TensorSet {
    type Item = &'a NamedTensor;
    type IntoIter = std::collections::btree_map::Values<'a, String, NamedTensor>;

    fn into_iter(self) -> Self::IntoIter {
        self.tensors.values()
    }
}
