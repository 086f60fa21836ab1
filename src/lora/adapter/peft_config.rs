//! PEFT `adapter_config.json` parsing
//!
//! Reads the adapter configuration written by the HuggingFace PEFT library
//! and checks that the adapter is a plain additive LoRA decomposition.

use super::error::AdapterError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// File name of the PEFT adapter configuration
pub const ADAPTER_CONFIG_FILENAME: &str = "adapter_config.json";

/// File name of the PEFT adapter weights
pub const ADAPTER_WEIGHTS_FILENAME: &str = "adapter_model.safetensors";

/// Target module specification: an explicit list or a single pattern
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TargetModules {
    List(Vec<String>),
    Pattern(String),
}

impl Default for TargetModules {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

/// PEFT adapter configuration matching the HuggingFace PEFT schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeftAdapterConfig {
    /// PEFT method type ("LORA" for LoRA adapters)
    pub peft_type: String,
    /// LoRA rank
    pub r: usize,
    /// LoRA alpha scaling parameter
    pub lora_alpha: f32,
    /// Target module names for LoRA adaptation
    #[serde(default)]
    pub target_modules: TargetModules,
    /// LoRA dropout rate (irrelevant once merged)
    #[serde(default)]
    pub lora_dropout: f32,
    /// Bias handling: "none", "all", or "lora_only"
    #[serde(default = "default_bias")]
    pub bias: String,
    /// Base model name or path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_model_name_or_path: Option<String>,
    /// Task type (e.g., "CAUSAL_LM")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    /// Base layer stores weights transposed (GPT-2 Conv1D)
    #[serde(default)]
    pub fan_in_fan_out: bool,
    /// Inference mode
    #[serde(default)]
    pub inference_mode: bool,
    /// Weight-decomposed LoRA
    #[serde(default)]
    pub use_dora: bool,
    /// Rank-stabilized scaling `alpha / sqrt(r)`
    #[serde(default)]
    pub use_rslora: bool,
    /// Per-module rank overrides
    #[serde(default)]
    pub rank_pattern: BTreeMap<String, serde_json::Value>,
    /// Per-module alpha overrides
    #[serde(default)]
    pub alpha_pattern: BTreeMap<String, serde_json::Value>,
}

fn default_bias() -> String {
    "none".to_string()
}

impl PeftAdapterConfig {
    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check that merging reduces to `W + (alpha / r) · B @ A` for every target
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::PeftFormatError`] naming the first unsupported
    /// setting.
    pub fn validate_mergeable(&self) -> Result<(), AdapterError> {
        if !self.peft_type.eq_ignore_ascii_case("LORA") {
            return Err(AdapterError::PeftFormatError(format!(
                "unsupported peft_type {:?} (only LORA adapters can be merged)",
                self.peft_type
            )));
        }
        if self.r == 0 {
            return Err(AdapterError::PeftFormatError("rank r must be positive".into()));
        }
        if !self.lora_alpha.is_finite() {
            return Err(AdapterError::PeftFormatError(format!(
                "lora_alpha must be finite, got {}",
                self.lora_alpha
            )));
        }
        let unsupported = [
            (self.fan_in_fan_out, "fan_in_fan_out"),
            (self.use_dora, "use_dora"),
            (self.use_rslora, "use_rslora"),
            (!self.rank_pattern.is_empty(), "rank_pattern"),
            (!self.alpha_pattern.is_empty(), "alpha_pattern"),
        ];
        if let Some((_, name)) = unsupported.iter().find(|(enabled, _)| *enabled) {
            return Err(AdapterError::PeftFormatError(format!(
                "{name} adapters are not a plain low-rank decomposition"
            )));
        }
        if self.bias != "none" {
            return Err(AdapterError::PeftFormatError(format!(
                "bias={:?} adapters carry trained biases that cannot be merged as low-rank deltas",
                self.bias
            )));
        }
        Ok(())
    }
}
