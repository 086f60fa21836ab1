//! Named tensors and tensor sets
//!
//! The shared data model of both pipelines: a model's weights are a
//! [`TensorSet`] of [`NamedTensor`]s, each carrying its raw bytes exactly as
//! they were loaded so that writing them back is bit-identical.

mod convert;
mod dtype;
mod named;
mod set;


pub use dtype::DType;
pub use named::NamedTensor;
pub use set::TensorSet;

use thiserror::Error;

/// Tensor construction and conversion errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TensorError {
    #[error("Invalid shape for {name}: {shape:?} (dimensions must be positive)")]
    InvalidShape { name: String, shape: Vec<usize> },

    #[error("Buffer size mismatch for {name}: expected {expected}, got {actual}")]
    BufferSize { name: String, expected: usize, actual: usize },

    #[error("Duplicate tensor name: {name}")]
    DuplicateName { name: String },

    #[error("Tensor {name} has non-floating-point dtype {dtype}")]
    NotFloat { name: String, dtype: DType },

    #[error("Unsupported dtype: {dtype}")]
    UnsupportedDtype { dtype: String },
}
