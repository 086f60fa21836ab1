//! Crate-level error type

use crate::config::ConfigError;
use crate::export::StoreError;
use crate::merge::MergeError;
use crate::source::SourceError;
use crate::tensor::TensorError;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure of an export or merge run
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Tensor(#[from] TensorError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
