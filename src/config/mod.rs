//! Configuration: the model's `config.json` record and CLI arguments

pub mod cli;
mod model_config;

pub use model_config::{ConfigError, ModelConfig, CONFIG_FILENAME};
