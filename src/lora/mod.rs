//! LoRA (Low-Rank Adaptation) adapters
//!
//! An adapter is a set of [`AdapterDelta`]s, one per target weight matrix,
//! each a low-rank factor pair whose scaled product is added to the base
//! weight during a merge.

pub mod adapter;
mod delta;

#[cfg(test)]
mod tests;

pub use adapter::{AdapterError, PeftAdapterConfig};
pub use delta::AdapterDelta;
