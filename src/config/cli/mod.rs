//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! fusionar export --model meta-llama/Llama-2-7b-hf --output-dir ./out
//! fusionar export --model ./checkpoint --local --dtype f16 --format sharded
//! fusionar merge --base-model ./base --adapter ./lora-a --adapter ./lora-b --output ./merged
//! fusionar inspect ./merged
//! ```

mod args;
mod core;
mod types;

pub use args::{ExportArgs, InspectArgs, MergeArgs};
pub use core::{parse_args, Cli, Command};
pub use types::{ByteSize, ContainerFormatArg, DTypeArg, OutputFormat};
