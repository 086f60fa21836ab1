//! Adapter merging
//!
//! Folds low-rank adapter deltas into a base model's weights:
//! `W' = W + (alpha / r) · up @ down`, computed in f32 and cast back to the
//! base tensor's dtype once per tensor.

mod error;
mod merger;


pub use error::MergeError;
pub use merger::{merge_deltas, MergedModel, WeightMerger};
