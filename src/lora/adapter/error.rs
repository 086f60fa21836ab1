//! LoRA adapter errors

use crate::tensor::TensorError;
use thiserror::Error;

/// Adapter delta construction and PEFT configuration errors
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Adapter validation error: {0}")]
    Validation(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    #[error("Tensor error: {0}")]
    Tensor(#[from] TensorError),

    #[error("PEFT format error: {0}")]
    PeftFormatError(String),
}
