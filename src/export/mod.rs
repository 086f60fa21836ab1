//! Model export: tensor store, metadata sidecar, tokenizer files
//!
//! Output directory layout:
//!
//! ```text
//! out/
//! ├── model.safetensors              (or model-0000i-of-0000N.safetensors + index)
//! ├── config.json                    (merge only)
//! ├── tokenizer.json, ...            (unless --no-tokenizer)
//! └── meta.json                      (written last)
//! ```
//!
//! Every file is committed by rename from a hidden temporary sibling, so a
//! reader never observes a half-written file.

mod atomic;
mod format;
mod meta_writer;
mod metadata;
mod store;
mod tokenizer;


pub use format::{
    is_shard_file_name, shard_file_name, ContainerFormat, DEFAULT_MAX_SHARD_BYTES, INDEX_FILE_NAME, SINGLE_FILE_NAME,
};
pub use meta_writer::{ConfigWriter, MetadataWriter, META_FILENAME};
pub use metadata::{
    DefaultedField, MetadataBuilder, ModelMetadata, DEFAULT_CONTEXT_LENGTH, DEFAULT_DESCRIPTION,
    DEFAULT_EMBEDDING_SIZE, FORMAT_VERSION, FULL_PRECISION,
};
pub use store::{
    read_tensors, write_safetensors, IndexMetadata, ShardIndex, StoreLayout, StoreSummary,
    TensorEntry, TensorStoreReader, TensorStoreWriter,
};
pub use tokenizer::{DirectoryTokenizer, TokenizerExporter, TOKENIZER_FILES};

use crate::tensor::TensorError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors while writing or reading exported artifacts
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O failure at {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("No model.safetensors or model.safetensors.index.json in {}", dir.display())]
    MissingWeights { dir: PathBuf },

    #[error("Tensor error: {0}")]
    Tensor(#[from] TensorError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoFailure { path: path.into(), source }
    }
}
