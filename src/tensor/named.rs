//! A single named, shaped, typed tensor buffer

use super::convert::{decode_f32, encode_f32};
use super::{DType, TensorError};

/// Named tensor with raw little-endian storage
///
/// The buffer length always equals `numel(shape) * dtype.size_in_bytes()`.
/// An empty shape denotes a scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTensor {
    name: String,
    shape: Vec<usize>,
    dtype: DType,
    data: Vec<u8>,
}

impl NamedTensor {
    /// Create a tensor from raw bytes
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero or the buffer length does not
    /// match the shape and dtype.
    pub fn new(
        name: impl Into<String>,
        shape: Vec<usize>,
        dtype: DType,
        data: Vec<u8>,
    ) -> Result<Self, TensorError> {
        let name = name.into();
        if shape.contains(&0) {
            return Err(TensorError::InvalidShape { name, shape });
        }
        let expected = shape.iter().product::<usize>() * dtype.size_in_bytes();
        if data.len() != expected {
            return Err(TensorError::BufferSize { name, expected, actual: data.len() });
        }
        Ok(Self { name, shape, dtype, data })
    }

    /// Create a floating-point tensor from f32 values, encoding them as `dtype`
    ///
    /// # Errors
    ///
    /// Returns an error if `dtype` is not a floating-point type or the value
    /// count does not match the shape.
    pub fn from_f32(
        name: impl Into<String>,
        shape: Vec<usize>,
        dtype: DType,
        values: &[f32],
    ) -> Result<Self, TensorError> {
        let name = name.into();
        let data = encode_f32(dtype, values)
            .ok_or_else(|| TensorError::NotFloat { name: name.clone(), dtype })?;
        Self::new(name, shape, dtype, data)
    }

    /// Tensor name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tensor shape
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Element type
    #[must_use]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Raw little-endian bytes
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of elements
    #[must_use]
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Size of the data buffer in bytes
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Decode the buffer into f32 values
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::NotFloat`] for integer and boolean tensors.
    pub fn to_f32(&self) -> Result<Vec<f32>, TensorError> {
        decode_f32(self.dtype, &self.data)
            .ok_or_else(|| TensorError::NotFloat { name: self.name.clone(), dtype: self.dtype })
    }

    /// Overwrite the buffer with f32 values encoded in the tensor's own dtype
    pub(crate) fn store_f32(&mut self, values: &[f32]) -> Result<(), TensorError> {
        if values.len() != self.numel() {
            return Err(TensorError::BufferSize {
                name: self.name.clone(),
                expected: self.numel(),
                actual: values.len(),
            });
        }
        self.data = encode_f32(self.dtype, values)
            .ok_or_else(|| TensorError::NotFloat { name: self.name.clone(), dtype: self.dtype })?;
        Ok(())
    }

    /// Convert a floating-point tensor to another floating-point dtype
    ///
    /// Non-float tensors and tensors already stored as `dtype` are returned
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if `dtype` is not a floating-point type.
    pub fn cast(self, dtype: DType) -> Result<Self, TensorError> {
        if !dtype.is_float() {
            return Err(TensorError::NotFloat { name: self.name, dtype });
        }
        if self.dtype == dtype || !self.dtype.is_float() {
            return Ok(self);
        }
        let values = self.to_f32()?;
        Self::from_f32(self.name, self.shape, dtype, &values)
    }
}
