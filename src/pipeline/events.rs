//! Stage-boundary events and where they go

use crate::export::DefaultedField;
use crate::tensor::DType;
use std::path::PathBuf;

/// Something that happened while a pipeline ran
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Model tensors and configuration are in memory
    SourceLoaded { model: String, tensors: usize, parameters: u64 },
    /// One adapter's deltas are in memory
    AdaptersLoaded { adapter: String, deltas: usize },
    /// Floating-point tensors were cast before writing
    TensorsCast { dtype: DType, tensors: usize },
    /// A metadata field was filled from its default
    MetadataDefaulted { field: DefaultedField, value: String },
    /// All deltas were folded into the base weights
    MergeComplete { tensors_merged: usize, deltas_applied: usize },
    /// Weight files are committed
    TensorsWritten { files: Vec<PathBuf>, tensors: usize, bytes: u64 },
    /// `config.json` is committed
    ConfigWritten { path: PathBuf },
    /// Tokenizer files are committed
    TokenizerWritten { files: Vec<PathBuf> },
    /// `meta.json` is committed; the output directory is complete
    MetadataWritten { path: PathBuf },
}

/// Receives pipeline events
pub trait EventSink {
    fn emit(&self, event: &PipelineEvent);
}

impl<F> EventSink for F
where
    F: Fn(&PipelineEvent),
{
    fn emit(&self, event: &PipelineEvent) {
        self(event);
    }
}

/// Drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &PipelineEvent) {}
}

/// Forwards events to `tracing`: defaulted metadata at `warn`, the rest at `info`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::SourceLoaded { model, tensors, parameters } => {
                tracing::info!(model = %model, tensors, parameters, "model loaded");
            }
            PipelineEvent::AdaptersLoaded { adapter, deltas } => {
                tracing::info!(adapter = %adapter, deltas, "adapter loaded");
            }
            PipelineEvent::TensorsCast { dtype, tensors } => {
                tracing::info!(dtype = %dtype, tensors, "tensors cast");
            }
            PipelineEvent::MetadataDefaulted { field, value } => {
                tracing::warn!(
                    field = field.key(),
                    missing = field.source_key(),
                    value = %value,
                    "metadata field defaulted"
                );
            }
            PipelineEvent::MergeComplete { tensors_merged, deltas_applied } => {
                tracing::info!(tensors_merged, deltas_applied, "merge complete");
            }
            PipelineEvent::TensorsWritten { files, tensors, bytes } => {
                tracing::info!(files = files.len(), tensors, bytes, "tensors written");
            }
            PipelineEvent::ConfigWritten { path } => {
                tracing::info!(path = %path.display(), "config written");
            }
            PipelineEvent::TokenizerWritten { files } => {
                tracing::info!(files = files.len(), "tokenizer written");
            }
            PipelineEvent::MetadataWritten { path } => {
                tracing::info!(path = %path.display(), "metadata written");
            }
        }
    }
}
