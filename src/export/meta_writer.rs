//! `meta.json` and `config.json` writers

use super::atomic::{commit_bytes, commit_copy};
use super::metadata::ModelMetadata;
use super::StoreError;
use crate::config::{ModelConfig, CONFIG_FILENAME};
use std::path::{Path, PathBuf};

/// Metadata sidecar file name
pub const META_FILENAME: &str = "meta.json";

/// Writes [`ModelMetadata`] as `meta.json`
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataWriter;

impl MetadataWriter {
    /// Serialize `metadata` with a 2-space indent
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn render(metadata: &ModelMetadata) -> Result<String, StoreError> {
        serde_json::to_string_pretty(metadata).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Atomically write `meta.json` into `output_dir`
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written.
    pub fn write(&self, metadata: &ModelMetadata, output_dir: &Path) -> Result<PathBuf, StoreError> {
        let path = output_dir.join(META_FILENAME);
        commit_bytes(&path, Self::render(metadata)?.as_bytes())?;
        Ok(path)
    }

    /// Read a previously written `meta.json`
    ///
    /// # Errors
    ///
    /// Returns error if the file is unreadable or malformed.
    pub fn read(path: &Path) -> Result<ModelMetadata, StoreError> {
        let text = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        serde_json::from_str(&text)
            .map_err(|e| StoreError::Serialization(format!("{}: {e}", path.display())))
    }
}

/// Re-emits the base model's `config.json` next to merged weights
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigWriter;

impl ConfigWriter {
    /// Write the configuration record into `output_dir`
    ///
    /// The source file is copied byte-for-byte when known; otherwise the
    /// parsed document is re-serialized. Returns `None` for an empty record.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written.
    pub fn write(
        &self,
        config: &ModelConfig,
        source: Option<&Path>,
        output_dir: &Path,
    ) -> Result<Option<PathBuf>, StoreError> {
        let path = output_dir.join(CONFIG_FILENAME);
        match source {
            Some(src) => {
                commit_copy(src, &path)?;
            }
            None if config.is_empty() => return Ok(None),
            None => {
                let json =
                    config.to_json_pretty().map_err(|e| StoreError::Serialization(e.to_string()))?;
                commit_bytes(&path, json.as_bytes())?;
            }
        }
        Ok(Some(path))
    }
}
