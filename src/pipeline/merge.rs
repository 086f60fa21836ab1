//! Merge pipeline: fold PEFT adapters into a base model and write a standalone model

use super::events::{EventSink, PipelineEvent};
use super::output::{OutputArtifacts, OutputPlan};
use crate::error::Result;
use crate::export::ContainerFormat;
use crate::merge::WeightMerger;
use crate::source::{AdapterSource, ModelSource};
use std::path::PathBuf;

/// Merge settings
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOptions {
    pub(crate) output_dir: PathBuf,
    pub(crate) include_tokenizer: bool,
    pub(crate) format: ContainerFormat,
}

impl MergeOptions {
    /// Single-file output into `output_dir`, tokenizer included
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into(), include_tokenizer: true, format: ContainerFormat::Single }
    }

    /// Copy the base model's tokenizer files
    #[must_use]
    pub fn include_tokenizer(mut self, include: bool) -> Self {
        self.include_tokenizer = include;
        self
    }

    /// Tensor container layout
    #[must_use]
    pub fn format(mut self, format: ContainerFormat) -> Self {
        self.format = format;
        self
    }
}

/// Outcome of [`run_merge`]
#[derive(Debug, Clone, PartialEq)]
pub struct MergeReport {
    /// Base model identifier
    pub base_model: String,
    /// Distinct base tensors rewritten
    pub tensors_merged: usize,
    /// Deltas applied across all adapters
    pub deltas_applied: usize,
    /// Committed files
    pub artifacts: OutputArtifacts,
}

/// Merge `adapters`, in order, into `base` and write the result
///
/// The output directory is created only after every adapter has loaded and
/// the merge has succeeded, so a rejected adapter leaves nothing on disk.
///
/// # Errors
///
/// Returns the first load, merge or write failure.
pub fn run_merge(
    base: &dyn ModelSource,
    adapters: &[&dyn AdapterSource],
    options: &MergeOptions,
    sink: &dyn EventSink,
) -> Result<MergeReport> {
    let model = base.load()?;
    let identifier = base.identifier();
    sink.emit(&PipelineEvent::SourceLoaded {
        model: identifier.to_string(),
        tensors: model.tensors.len(),
        parameters: model.tensors.param_count(),
    });

    let mut merger = WeightMerger::new();
    for adapter in adapters {
        let deltas = adapter.load()?;
        sink.emit(&PipelineEvent::AdaptersLoaded { adapter: adapter.identifier(), deltas: deltas.len() });
        merger.extend(deltas);
    }

    let merged = merger.merge(model.tensors)?;
    sink.emit(&PipelineEvent::MergeComplete {
        tensors_merged: merged.tensors_merged,
        deltas_applied: merged.deltas_applied,
    });

    let plan = OutputPlan {
        identifier,
        config: &model.config,
        config_path: model.config_path.as_deref(),
        write_config: true,
        tokenizer_dir: model.tokenizer_dir.as_deref().filter(|_| options.include_tokenizer),
        output_dir: &options.output_dir,
        format: options.format,
    };
    let (metadata, defaulted) = plan.metadata(sink);
    let artifacts = plan.write(&merged.tensors, metadata, defaulted, sink)?;

    Ok(MergeReport {
        base_model: identifier.to_string(),
        tensors_merged: merged.tensors_merged,
        deltas_applied: merged.deltas_applied,
        artifacts,
    })
}
