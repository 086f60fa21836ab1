//! Fusionar: LoRA adapter merging and portable model export
//!
//! Two pipelines share one data model of named tensors:
//!
//! - **export** loads a model through a [`source::ModelSource`] and writes its
//!   tensors, tokenizer files and a `meta.json` sidecar
//!   ([`pipeline::run_export`]).
//! - **merge** folds one or more PEFT adapters into a base model's weights,
//!   `W' = W + (alpha / r) · B @ A`, and writes a standalone model directory
//!   ([`pipeline::run_merge`]).
//!
//! # Example
//!
//! ```no_run
//! use fusionar::pipeline::{run_merge, MergeOptions, TracingSink};
//! use fusionar::source::{AdapterSource, LocalModelSource, PeftAdapterSource};
//!
//! # fn main() -> fusionar::Result<()> {
//! let base = LocalModelSource::new("./base");
//! let adapter = PeftAdapterSource::new("./lora");
//! let adapters: [&dyn AdapterSource; 1] = [&adapter];
//! let report = run_merge(&base, &adapters, &MergeOptions::new("./merged"), &TracingSink)?;
//! println!("merged {} tensors", report.tensors_merged);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod lora;
pub mod merge;
pub mod pipeline;
pub mod source;
pub mod tensor;

pub use error::{Error, Result};
pub use export::ModelMetadata;
pub use merge::{MergedModel, WeightMerger};
pub use tensor::{DType, NamedTensor, TensorSet};
