//! Inspect command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::cli::{InspectArgs, OutputFormat};
use crate::export::{
    MetadataWriter, ModelMetadata, StoreLayout, TensorEntry, TensorStoreReader, META_FILENAME,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

const MAX_LISTED: usize = 20;

#[derive(Debug, Serialize)]
pub(super) struct TensorRow {
    pub name: String,
    pub dtype: String,
    pub shape: Vec<usize>,
}

/// Tensors of a file or model directory, sorted by name
#[derive(Debug, Serialize)]
pub(super) struct InspectReport {
    pub files: Vec<PathBuf>,
    pub parameters: u64,
    pub tensors: Vec<TensorRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ModelMetadata>,
}

pub fn run_inspect(args: InspectArgs, level: LogLevel) -> Result<(), String> {
    let report = build_report(&args.path)?;

    match args.output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| format!("Failed to serialize report: {e}"))?;
            if level != LogLevel::Quiet {
                println!("{json}");
            }
        }
        OutputFormat::Text => log_report(&report, level),
    }
    Ok(())
}

pub(super) fn build_report(path: &Path) -> Result<InspectReport, String> {
    if !path.exists() {
        return Err(format!("Path not found: {}", path.display()));
    }

    let (files, metadata) = if path.is_dir() {
        let layout = StoreLayout::locate(path).map_err(|e| e.to_string())?;
        let files = layout.files().into_iter().map(Path::to_path_buf).collect();
        let meta_path = path.join(META_FILENAME);
        let metadata = if meta_path.is_file() {
            Some(MetadataWriter::read(&meta_path).map_err(|e| e.to_string())?)
        } else {
            None
        };
        (files, metadata)
    } else {
        (vec![path.to_path_buf()], None)
    };

    let mut entries: Vec<TensorEntry> = Vec::new();
    for file in &files {
        let reader = TensorStoreReader::open(file).map_err(|e| e.to_string())?;
        entries.extend(reader.entries().map_err(|e| e.to_string())?);
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let parameters = entries.iter().map(|e| e.numel() as u64).sum();
    let tensors = entries
        .into_iter()
        .map(|e| TensorRow { name: e.name, dtype: e.dtype.to_string(), shape: e.shape })
        .collect();

    Ok(InspectReport { files, parameters, tensors, metadata })
}

fn log_report(report: &InspectReport, level: LogLevel) {
    log(level, LogLevel::Normal, "Model Information:");
    log(level, LogLevel::Normal, &format!("  Files: {}", report.files.len()));
    log(
        level,
        LogLevel::Normal,
        &format!("  Parameters: {:.2}B", report.parameters as f64 / 1e9),
    );
    log(level, LogLevel::Normal, &format!("  Tensors: {}", report.tensors.len()));

    let limit = if level == LogLevel::Verbose { report.tensors.len() } else { MAX_LISTED };
    log(level, LogLevel::Normal, "\nTensor Details:");
    for row in report.tensors.iter().take(limit) {
        log(
            level,
            LogLevel::Normal,
            &format!("  {}: {:?} ({})", row.name, row.shape, row.dtype),
        );
    }
    if report.tensors.len() > limit {
        log(
            level,
            LogLevel::Normal,
            &format!("  ... and {} more tensors", report.tensors.len() - limit),
        );
    }

    if let Some(meta) = &report.metadata {
        log(level, LogLevel::Normal, "\nMetadata:");
        log(level, LogLevel::Normal, &format!("  name: {}", meta.name));
        log(level, LogLevel::Normal, &format!("  description: {}", meta.description));
        log(level, LogLevel::Normal, &format!("  context_length: {}", meta.context_length));
        log(level, LogLevel::Normal, &format!("  embedding_size: {}", meta.embedding_size));
    }
}
