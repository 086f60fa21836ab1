//! PEFT adapter format support
//!
//! Parses the HuggingFace PEFT adapter layout (`adapter_config.json` plus
//! `adapter_model.safetensors`) into configuration and factor names so the
//! adapter source can assemble [`AdapterDelta`](super::AdapterDelta)s.

mod error;
mod naming;
mod peft_config;

pub use error::AdapterError;
pub use naming::{parse_peft_tensor_name, LoraFactor, PeftTensorName};
pub use peft_config::{
    PeftAdapterConfig, TargetModules, ADAPTER_CONFIG_FILENAME, ADAPTER_WEIGHTS_FILENAME,
};
