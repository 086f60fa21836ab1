//! HuggingFace `config.json` configuration record
//!
//! Only the handful of fields the exporter needs are typed; everything else
//! stays in the raw document so it can be written back unmodified.

use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// File name of the configuration record inside a model directory
pub const CONFIG_FILENAME: &str = "config.json";

/// Configuration parsing errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Model configuration record
///
/// Parsing is lenient: a known field with the wrong JSON type, an empty
/// string, or a zero count is treated as absent.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// `_name_or_path`
    pub name_or_path: Option<String>,
    /// `summary`
    pub description: Option<String>,
    /// Maximum sequence length
    pub max_position_embeddings: Option<u64>,
    /// Embedding / hidden width
    pub hidden_size: Option<u64>,
    /// Model class names
    pub architectures: Vec<String>,
    /// Model family, e.g. `llama`
    pub model_type: Option<String>,
    /// Transformer block count
    pub num_hidden_layers: Option<u64>,
    /// Vocabulary size
    pub vocab_size: Option<u64>,
    /// Storage dtype recorded by the producer
    pub torch_dtype: Option<String>,
    raw: Value,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name_or_path: None,
            description: None,
            max_position_embeddings: None,
            hidden_size: None,
            architectures: Vec::new(),
            model_type: None,
            num_hidden_layers: None,
            vocab_size: None,
            torch_dtype: None,
            raw: Value::Object(serde_json::Map::new()),
        }
    }
}

impl ModelConfig {
    /// Parse from a JSON string
    ///
    /// # Errors
    ///
    /// Returns error if the text is not JSON or not a JSON object.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Build from an already-parsed JSON document
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotAnObject`] for non-object documents.
    pub fn from_value(raw: Value) -> Result<Self, ConfigError> {
        let Value::Object(map) = &raw else {
            return Err(ConfigError::NotAnObject(json_kind(&raw)));
        };

        let string = |key: &str| {
            map.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()).map(str::to_string)
        };
        let count = |key: &str| map.get(key).and_then(Value::as_u64).filter(|&n| n > 0);

        let architectures = map
            .get("architectures")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();

        Ok(Self {
            name_or_path: string("_name_or_path"),
            description: string("summary"),
            max_position_embeddings: count("max_position_embeddings"),
            hidden_size: count("hidden_size"),
            architectures,
            model_type: string("model_type"),
            num_hidden_layers: count("num_hidden_layers"),
            vocab_size: count("vocab_size"),
            torch_dtype: string("torch_dtype"),
            raw,
        })
    }

    /// Load `config.json` from disk
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        Self::from_json(&text)
    }

    /// The document as it was read
    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Whether the record came from an actual file with content
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.as_object().map_or(true, serde_json::Map::is_empty)
    }

    /// Re-serialize the raw document (2-space indent)
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.raw)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
