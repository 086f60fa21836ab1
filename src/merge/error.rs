//! Weight merge errors

use crate::tensor::{DType, TensorError};
use thiserror::Error;

/// Errors detected while combining adapter deltas with base weights
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MergeError {
    /// Adapter factor dimensions disagree with the base tensor's shape
    #[error("Shape mismatch for {tensor}: base tensor has shape {expected:?}, adapter delta has shape {actual:?}")]
    ShapeMismatch { tensor: String, expected: Vec<usize>, actual: Vec<usize> },

    /// Adapter names a tensor absent from the base set
    #[error("Unknown merge target: {tensor} is not a tensor of the base model")]
    UnknownTarget { tensor: String },

    /// Target tensor dtype cannot be up-cast for merging
    #[error("Cannot merge into {tensor}: dtype {dtype} is not F16, BF16 or F32")]
    UnsupportedDtype { tensor: String, dtype: DType },

    #[error("Tensor error: {0}")]
    Tensor(#[from] TensorError),
}
