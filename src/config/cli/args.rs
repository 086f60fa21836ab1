//! Per-command argument structs

use clap::Parser;
use std::path::PathBuf;

use super::types::{ByteSize, ContainerFormatArg, DTypeArg, OutputFormat};

/// Arguments for the export command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ExportArgs {
    /// Model ID (`org/name`) or local path
    #[arg(short, long, value_name = "MODEL")]
    pub model: String,

    /// Directory to write output files into
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Skip copying tokenizer files
    #[arg(long)]
    pub no_tokenizer: bool,

    /// Never contact the Hub; MODEL must be a local path
    #[arg(long)]
    pub local: bool,

    /// Cast floating-point tensors before writing (keep, f16, bf16, f32)
    #[arg(long, default_value = "keep")]
    pub dtype: DTypeArg,

    /// Tensor container layout (single or sharded)
    #[arg(short, long, default_value = "single")]
    pub format: ContainerFormatArg,

    /// Largest shard when writing the sharded layout
    #[arg(long, default_value = "5GB")]
    pub max_shard_size: ByteSize,

    /// Hub revision to download
    #[arg(long, default_value = "main")]
    pub revision: String,
}

/// Arguments for the merge command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct MergeArgs {
    /// Base model ID or local path
    #[arg(short, long, value_name = "MODEL")]
    pub base_model: String,

    /// PEFT adapter directories, applied in the order given
    #[arg(short, long = "adapter", value_name = "DIR", required = true, num_args = 1..)]
    pub adapters: Vec<PathBuf>,

    /// Output directory for the merged model
    #[arg(short, long)]
    pub output: PathBuf,

    /// Tensor container layout (single or sharded)
    #[arg(short, long, default_value = "single")]
    pub format: ContainerFormatArg,

    /// Largest shard when writing the sharded layout
    #[arg(long, default_value = "5GB")]
    pub max_shard_size: ByteSize,

    /// Skip copying tokenizer files
    #[arg(long)]
    pub no_tokenizer: bool,

    /// Never contact the Hub; the base model must be a local path
    #[arg(long)]
    pub local: bool,
}

/// Arguments for the inspect command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InspectArgs {
    /// A `.safetensors` file or an exported model directory
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    pub output: OutputFormat,
}
