//! Export pipeline: load a model and write it out with a `meta.json` sidecar

use super::events::{EventSink, PipelineEvent};
use super::output::{OutputArtifacts, OutputPlan};
use crate::error::Result;
use crate::export::ContainerFormat;
use crate::source::ModelSource;
use crate::tensor::DType;
use std::path::PathBuf;

/// Export settings
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub(crate) output_dir: PathBuf,
    pub(crate) include_tokenizer: bool,
    pub(crate) dtype: Option<DType>,
    pub(crate) format: ContainerFormat,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::new(".")
    }
}

impl ExportOptions {
    /// Single-file export into `output_dir`, tokenizer included, dtypes kept
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            include_tokenizer: true,
            dtype: None,
            format: ContainerFormat::Single,
        }
    }

    /// Copy tokenizer files
    #[must_use]
    pub fn include_tokenizer(mut self, include: bool) -> Self {
        self.include_tokenizer = include;
        self
    }

    /// Cast floating-point tensors to `dtype` before writing
    #[must_use]
    pub fn dtype(mut self, dtype: Option<DType>) -> Self {
        self.dtype = dtype;
        self
    }

    /// Tensor container layout
    #[must_use]
    pub fn format(mut self, format: ContainerFormat) -> Self {
        self.format = format;
        self
    }
}

/// Outcome of [`run_export`]
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    /// Model identifier that was exported
    pub model: String,
    /// Committed files
    pub artifacts: OutputArtifacts,
}

/// Load `source` and write tensors, tokenizer and `meta.json` into the output directory
///
/// # Errors
///
/// Returns the first load, cast or write failure. `meta.json` is only
/// written after every other file is committed.
pub fn run_export(
    source: &dyn ModelSource,
    options: &ExportOptions,
    sink: &dyn EventSink,
) -> Result<ExportReport> {
    let model = source.load()?;
    let identifier = source.identifier();
    sink.emit(&PipelineEvent::SourceLoaded {
        model: identifier.to_string(),
        tensors: model.tensors.len(),
        parameters: model.tensors.param_count(),
    });

    let tensors = match options.dtype {
        Some(dtype) => {
            let cast = model.tensors.cast_floats(dtype)?;
            let floats = cast.iter().filter(|t| t.dtype() == dtype).count();
            sink.emit(&PipelineEvent::TensorsCast { dtype, tensors: floats });
            cast
        }
        None => model.tensors,
    };

    let plan = OutputPlan {
        identifier,
        config: &model.config,
        config_path: model.config_path.as_deref(),
        write_config: false,
        tokenizer_dir: model.tokenizer_dir.as_deref().filter(|_| options.include_tokenizer),
        output_dir: &options.output_dir,
        format: options.format,
    };
    let (metadata, defaulted) = plan.metadata(sink);
    let artifacts = plan.write(&tensors, metadata, defaulted, sink)?;

    Ok(ExportReport { model: identifier.to_string(), artifacts })
}
