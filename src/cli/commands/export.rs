//! Export command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::cli::ExportArgs;
use crate::pipeline::{self, ExportOptions, TracingSink};
use crate::source::resolve_model_source_at;

pub fn run_export(args: ExportArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("Exporting {} to {}", args.model, args.output_dir.display()),
    );
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "  dtype: {}, format: {}, tokenizer: {}",
            args.dtype,
            args.format,
            !args.no_tokenizer
        ),
    );

    let source = resolve_model_source_at(&args.model, args.local, &args.revision)
        .map_err(|e| e.to_string())?;

    let options = ExportOptions::new(&args.output_dir)
        .include_tokenizer(!args.no_tokenizer)
        .dtype(args.dtype.target())
        .format(args.format.with_limit(args.max_shard_size));

    let report =
        pipeline::run_export(source.as_ref(), &options, &TracingSink).map_err(|e| e.to_string())?;

    let artifacts = &report.artifacts;
    log(
        level,
        LogLevel::Normal,
        &format!(
            "Wrote {} tensors ({} bytes) in {} file(s)",
            artifacts.store.num_tensors,
            artifacts.store.total_bytes,
            artifacts.store.files.len()
        ),
    );
    if !artifacts.tokenizer_files.is_empty() {
        log(
            level,
            LogLevel::Verbose,
            &format!("  tokenizer files: {}", artifacts.tokenizer_files.len()),
        );
    }
    log(
        level,
        LogLevel::Normal,
        &format!("Metadata: {}", artifacts.meta_path.display()),
    );
    Ok(())
}
