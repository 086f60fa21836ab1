//! CLI module for fusionar
//!
//! Command handlers and output utilities.

mod commands;
mod logging;

pub use commands::run_command;
pub use logging::{init_tracing, LogLevel};

// Re-export Cli from config for convenience
pub use crate::config::cli::Cli;
