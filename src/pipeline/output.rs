//! Shared tail of both pipelines: write tensors, config, tokenizer, then `meta.json`

use super::events::{EventSink, PipelineEvent};
use crate::config::ModelConfig;
use crate::error::Result;
use crate::export::{
    ConfigWriter, ContainerFormat, DefaultedField, DirectoryTokenizer, MetadataBuilder,
    MetadataWriter, ModelMetadata, StoreError, StoreSummary, TensorStoreWriter, TokenizerExporter,
    META_FILENAME,
};
use crate::tensor::TensorSet;
use std::path::{Path, PathBuf};

/// Files an export or merge committed
#[derive(Debug, Clone, PartialEq)]
pub struct OutputArtifacts {
    /// Metadata as written to `meta.json`
    pub metadata: ModelMetadata,
    /// Metadata fields that fell back to defaults
    pub defaulted: Vec<DefaultedField>,
    /// Weight files
    pub store: StoreSummary,
    /// `config.json`, when one was written
    pub config_path: Option<PathBuf>,
    /// Tokenizer files copied
    pub tokenizer_files: Vec<PathBuf>,
    /// `meta.json`
    pub meta_path: PathBuf,
}

pub(crate) struct OutputPlan<'a> {
    pub identifier: &'a str,
    pub config: &'a ModelConfig,
    /// File the configuration was read from
    pub config_path: Option<&'a Path>,
    /// Re-emit `config.json` next to the weights
    pub write_config: bool,
    pub tokenizer_dir: Option<&'a Path>,
    pub output_dir: &'a Path,
    pub format: ContainerFormat,
}

impl OutputPlan<'_> {
    /// Derive metadata and report defaults before anything touches disk
    pub(crate) fn metadata(&self, sink: &dyn EventSink) -> (ModelMetadata, Vec<DefaultedField>) {
        let builder = MetadataBuilder::new(self.config, self.identifier);
        let defaulted = builder.defaulted_fields();
        for &field in &defaulted {
            sink.emit(&PipelineEvent::MetadataDefaulted { field, value: builder.default_value(field) });
        }
        (builder.build(), defaulted)
    }

    pub(crate) fn write(
        &self,
        tensors: &TensorSet,
        metadata: ModelMetadata,
        defaulted: Vec<DefaultedField>,
        sink: &dyn EventSink,
    ) -> Result<OutputArtifacts> {
        std::fs::create_dir_all(self.output_dir).map_err(|e| StoreError::io(self.output_dir, e))?;
        self.remove_previous_metadata()?;

        let store = TensorStoreWriter::new(self.format).write(tensors, self.output_dir)?;
        sink.emit(&PipelineEvent::TensorsWritten {
            files: store.files.clone(),
            tensors: store.num_tensors,
            bytes: store.total_bytes,
        });

        let config_path = if self.write_config {
            ConfigWriter.write(self.config, self.config_path, self.output_dir)?
        } else {
            None
        };
        if let Some(path) = &config_path {
            sink.emit(&PipelineEvent::ConfigWritten { path: path.clone() });
        }

        let tokenizer_files = match self.tokenizer_dir {
            Some(dir) => DirectoryTokenizer::new(dir).export(self.output_dir)?,
            None => Vec::new(),
        };
        if self.tokenizer_dir.is_some() {
            sink.emit(&PipelineEvent::TokenizerWritten { files: tokenizer_files.clone() });
        }

        let meta_path = MetadataWriter.write(&metadata, self.output_dir)?;
        sink.emit(&PipelineEvent::MetadataWritten { path: meta_path.clone() });

        Ok(OutputArtifacts { metadata, defaulted, store, config_path, tokenizer_files, meta_path })
    }

    /// A `meta.json` left by an earlier run must not vouch for this one
    fn remove_previous_metadata(&self) -> Result<()> {
        let path = self.output_dir.join(META_FILENAME);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "removed previous meta.json");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path, e).into()),
        }
    }
}
