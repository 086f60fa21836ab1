//! Fusionar CLI
//!
//! # Usage
//!
//! ```bash
//! # Export a Hub model with its metadata sidecar
//! fusionar export --model meta-llama/Llama-2-7b-hf --output-dir ./llama
//!
//! # Export a local checkpoint as f16 shards
//! fusionar export --model ./checkpoint --local --dtype f16 --format sharded --max-shard-size 2GB
//!
//! # Merge LoRA adapters into a base model
//! fusionar merge --base-model ./base --adapter ./lora-a --adapter ./lora-b --output ./merged
//!
//! # List tensors and metadata
//! fusionar inspect ./merged
//! ```

use clap::Parser;
use fusionar::cli::{run_command, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
