//! Model and adapter loading errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a model or an adapter
#[derive(Debug, Error)]
pub enum SourceError {
    /// Identifier is neither an existing path nor a reachable Hub repo
    #[error("Model not found: {model}")]
    ModelNotFound { model: String },

    /// Model exists but could not be read
    #[error("Failed to load model {model}: {reason}")]
    LoadFailure { model: String, reason: String },

    /// Adapter directory or one of its files is missing
    #[error("Adapter not found: {}", path.display())]
    AdapterNotFound { path: PathBuf },

    /// Adapter exists but is not a mergeable PEFT LoRA adapter
    #[error("Invalid adapter format in {}: {reason}", path.display())]
    InvalidAdapterFormat { path: PathBuf, reason: String },
}

impl SourceError {
    pub(crate) fn load_failure(model: impl Into<String>, reason: impl ToString) -> Self {
        Self::LoadFailure { model: model.into(), reason: reason.to_string() }
    }

    pub(crate) fn invalid_adapter(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::InvalidAdapterFormat { path: path.into(), reason: reason.to_string() }
    }
}
