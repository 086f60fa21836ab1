//! Merge command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::cli::MergeArgs;
use crate::pipeline::{self, MergeOptions, TracingSink};
use crate::source::{resolve_model_source, AdapterSource, PeftAdapterSource};

pub fn run_merge(args: MergeArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!(
            "Merging {} adapter(s) into {}",
            args.adapters.len(),
            args.base_model
        ),
    );
    for (i, adapter) in args.adapters.iter().enumerate() {
        log(
            level,
            LogLevel::Verbose,
            &format!("  Adapter {}: {}", i + 1, adapter.display()),
        );
    }
    log(
        level,
        LogLevel::Verbose,
        &format!("  Output: {}", args.output.display()),
    );

    let base = resolve_model_source(&args.base_model, args.local).map_err(|e| e.to_string())?;
    let peft: Vec<PeftAdapterSource> = args.adapters.iter().map(PeftAdapterSource::new).collect();
    let adapters: Vec<&dyn AdapterSource> = peft.iter().map(|a| a as &dyn AdapterSource).collect();

    let options = MergeOptions::new(&args.output)
        .include_tokenizer(!args.no_tokenizer)
        .format(args.format.with_limit(args.max_shard_size));

    let report = pipeline::run_merge(base.as_ref(), &adapters, &options, &TracingSink)
        .map_err(|e| e.to_string())?;

    log(
        level,
        LogLevel::Normal,
        &format!(
            "Merged {} deltas into {} tensors",
            report.deltas_applied, report.tensors_merged
        ),
    );
    log(
        level,
        LogLevel::Normal,
        &format!("Merged model saved to: {}", args.output.display()),
    );
    Ok(())
}
