//! Export and merge orchestration
//!
//! ```text
//! export: ModelSource ─► [cast] ─► MetadataBuilder ─► tensors, tokenizer, meta.json
//! merge:  ModelSource + AdapterSource* ─► WeightMerger ─► MetadataBuilder
//!                                     ─► tensors, config.json, tokenizer, meta.json
//! ```

mod events;
mod export;
mod merge;
mod output;

#[cfg(test)]
mod tests;

pub use events::{EventSink, NullSink, PipelineEvent, TracingSink};
pub use export::{run_export, ExportOptions, ExportReport};
pub use merge::{run_merge, MergeOptions, MergeReport};
pub use output::OutputArtifacts;
