//! Models stored in a local directory or a single safetensors file

use super::{LoadedModel, ModelSource, SourceError};
use crate::config::{ModelConfig, CONFIG_FILENAME};
use crate::export::read_tensors;
use std::path::{Path, PathBuf};

/// Loads `config.json` and safetensors weights from disk
///
/// Accepts a model directory (single-file or sharded weights) or a path to
/// one `.safetensors` file; in the latter case the configuration and
/// tokenizer are looked up next to the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalModelSource {
    path: PathBuf,
    identifier: String,
}

impl LocalModelSource {
    /// Source reading from `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let identifier = path.display().to_string();
        Self { path, identifier }
    }

    /// Keep `identifier` as the reported name (used for Hub snapshots)
    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Path this source reads from
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn model_dir(&self) -> &Path {
        if self.path.is_file() {
            self.path.parent().unwrap_or_else(|| Path::new("."))
        } else {
            &self.path
        }
    }
}

impl ModelSource for LocalModelSource {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn load(&self) -> Result<LoadedModel, SourceError> {
        if !self.path.exists() {
            return Err(SourceError::ModelNotFound { model: self.identifier.clone() });
        }

        let tensors =
            read_tensors(&self.path).map_err(|e| SourceError::load_failure(&self.identifier, e))?;

        let dir = self.model_dir();
        let config_path = dir.join(CONFIG_FILENAME);
        let (config, config_path) = if config_path.is_file() {
            let config = ModelConfig::from_file(&config_path)
                .map_err(|e| SourceError::load_failure(&self.identifier, e))?;
            (config, Some(config_path))
        } else {
            (ModelConfig::default(), None)
        };

        Ok(LoadedModel { tensors, config, config_path, tokenizer_dir: Some(dir.to_path_buf()) })
    }
}
