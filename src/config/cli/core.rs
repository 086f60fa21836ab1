//! Top-level CLI definition

use clap::{Parser, Subcommand};

use super::args::{ExportArgs, InspectArgs, MergeArgs};

/// Fusionar: LoRA merging and model export
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "fusionar")]
#[command(author = "PAIML")]
#[command(version)]
#[command(about = "Merge LoRA adapters into base models and export portable model directories")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Export a model's tensors, metadata and tokenizer
    Export(ExportArgs),

    /// Merge LoRA adapters into a base model
    Merge(MergeArgs),

    /// List the tensors of a safetensors file or model directory
    Inspect(InspectArgs),
}

/// Parse CLI arguments from an iterator (for testing)
///
/// # Errors
///
/// Returns the clap error for invalid or missing arguments.
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}
