//! Where models and adapters come from
//!
//! The pipelines only see the [`ModelSource`] and [`AdapterSource`] traits.
//! Provided implementations read local directories, PEFT adapter
//! directories, and (with the `hub` feature) HuggingFace Hub repositories.

mod error;
#[cfg(feature = "hub")]
mod hub;
mod local;
mod peft;

#[cfg(test)]
mod tests;

pub use error::SourceError;
#[cfg(feature = "hub")]
pub use hub::HubModelSource;
pub use local::LocalModelSource;
pub use peft::PeftAdapterSource;

use crate::config::ModelConfig;
use crate::lora::AdapterDelta;
use crate::tensor::TensorSet;
use std::path::{Path, PathBuf};

/// Everything a model source hands to the pipelines
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModel {
    /// Named tensors as stored
    pub tensors: TensorSet,
    /// Parsed `config.json`; empty if the model had none
    pub config: ModelConfig,
    /// The `config.json` the record was read from
    pub config_path: Option<PathBuf>,
    /// Directory holding tokenizer files, if any
    pub tokenizer_dir: Option<PathBuf>,
}

/// Supplies a model's tensors and configuration
pub trait ModelSource {
    /// Name used in metadata fallbacks and messages
    fn identifier(&self) -> &str;

    /// Load the model
    ///
    /// # Errors
    ///
    /// [`SourceError::ModelNotFound`] or [`SourceError::LoadFailure`].
    fn load(&self) -> Result<LoadedModel, SourceError>;
}

/// Supplies the low-rank deltas of one adapter
pub trait AdapterSource {
    /// Name used in messages
    fn identifier(&self) -> String;

    /// Load every delta, ordered by target name
    ///
    /// # Errors
    ///
    /// [`SourceError::AdapterNotFound`] or [`SourceError::InvalidAdapterFormat`].
    fn load(&self) -> Result<Vec<AdapterDelta>, SourceError>;
}

/// Pick a source for a user-supplied model identifier
///
/// An existing path is always read locally. Anything else goes to the Hub
/// when the `hub` feature is compiled in and `local_only` is false.
///
/// # Errors
///
/// Returns [`SourceError::ModelNotFound`] when no source can serve `id`.
pub fn resolve_model_source(id: &str, local_only: bool) -> Result<Box<dyn ModelSource>, SourceError> {
    resolve_model_source_at(id, local_only, "main")
}

/// [`resolve_model_source`] pinned to a Hub revision
///
/// # Errors
///
/// Returns [`SourceError::ModelNotFound`] when no source can serve `id`.
pub fn resolve_model_source_at(
    id: &str,
    local_only: bool,
    revision: &str,
) -> Result<Box<dyn ModelSource>, SourceError> {
    if Path::new(id).exists() {
        return Ok(Box::new(LocalModelSource::new(id)));
    }
    if local_only {
        return Err(SourceError::ModelNotFound { model: id.to_string() });
    }
    hub_source(id, revision)
}

#[cfg(feature = "hub")]
fn hub_source(id: &str, revision: &str) -> Result<Box<dyn ModelSource>, SourceError> {
    if !HubModelSource::is_repo_id(id) {
        return Err(SourceError::ModelNotFound { model: id.to_string() });
    }
    Ok(Box::new(HubModelSource::new(id).revision(revision)))
}

#[cfg(not(feature = "hub"))]
fn hub_source(id: &str, _revision: &str) -> Result<Box<dyn ModelSource>, SourceError> {
    tracing::debug!(model = id, "not a local path and hub support is not compiled in");
    Err(SourceError::ModelNotFound { model: id.to_string() })
}
