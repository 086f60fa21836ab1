//! `meta.json` document and its derivation from a configuration record

use crate::config::ModelConfig;
use serde::{Deserialize, Serialize};

/// Schema version written as `gguf_version`
pub const FORMAT_VERSION: &str = "2";

/// Context length used when the configuration has no `max_position_embeddings`
pub const DEFAULT_CONTEXT_LENGTH: u64 = 2048;

/// Embedding size used when the configuration has no `hidden_size`
pub const DEFAULT_EMBEDDING_SIZE: u64 = 4096;

/// Description used when the configuration has no `summary`
pub const DEFAULT_DESCRIPTION: &str = "Model converted from source format";

/// Full-precision marker; this pipeline never quantizes
pub const FULL_PRECISION: f64 = 1.0;

/// Model metadata sidecar
///
/// Field order is the on-disk key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(rename = "gguf_version")]
    pub format_version: String,
    pub name: String,
    pub description: String,
    pub context_length: u64,
    pub embedding_size: u64,
    pub is_quantized: bool,
    pub precision: f64,
}

/// A metadata field filled from its default instead of the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultedField {
    Name,
    Description,
    ContextLength,
    EmbeddingSize,
}

impl DefaultedField {
    /// Key in `meta.json`
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::ContextLength => "context_length",
            Self::EmbeddingSize => "embedding_size",
        }
    }

    /// Configuration key that was missing
    #[must_use]
    pub fn source_key(self) -> &'static str {
        match self {
            Self::Name => "_name_or_path",
            Self::Description => "summary",
            Self::ContextLength => "max_position_embeddings",
            Self::EmbeddingSize => "hidden_size",
        }
    }
}

impl std::fmt::Display for DefaultedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Derives [`ModelMetadata`] from a [`ModelConfig`]
///
/// `fallback_name` (usually the model identifier the user passed) stands in
/// for a missing `_name_or_path`.
#[derive(Debug, Clone)]
pub struct MetadataBuilder<'a> {
    config: &'a ModelConfig,
    fallback_name: String,
}

impl<'a> MetadataBuilder<'a> {
    /// Create a builder over `config`
    #[must_use]
    pub fn new(config: &'a ModelConfig, fallback_name: impl Into<String>) -> Self {
        Self { config, fallback_name: fallback_name.into() }
    }

    /// Fields that [`MetadataBuilder::build`] fills from defaults
    #[must_use]
    pub fn defaulted_fields(&self) -> Vec<DefaultedField> {
        let mut fields = Vec::new();
        if self.config.name_or_path.is_none() {
            fields.push(DefaultedField::Name);
        }
        if self.config.description.is_none() {
            fields.push(DefaultedField::Description);
        }
        if self.config.max_position_embeddings.is_none() {
            fields.push(DefaultedField::ContextLength);
        }
        if self.config.hidden_size.is_none() {
            fields.push(DefaultedField::EmbeddingSize);
        }
        fields
    }

    /// Value written for `field`
    #[must_use]
    pub fn default_value(&self, field: DefaultedField) -> String {
        match field {
            DefaultedField::Name => self.fallback_name.clone(),
            DefaultedField::Description => DEFAULT_DESCRIPTION.to_string(),
            DefaultedField::ContextLength => DEFAULT_CONTEXT_LENGTH.to_string(),
            DefaultedField::EmbeddingSize => DEFAULT_EMBEDDING_SIZE.to_string(),
        }
    }

    /// Build the metadata document
    #[must_use]
    pub fn build(&self) -> ModelMetadata {
        let config = self.config;
        ModelMetadata {
            format_version: FORMAT_VERSION.to_string(),
            name: config.name_or_path.clone().unwrap_or_else(|| self.fallback_name.clone()),
            description: config
                .description
                .clone()
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            context_length: config.max_position_embeddings.unwrap_or(DEFAULT_CONTEXT_LENGTH),
            embedding_size: config.hidden_size.unwrap_or(DEFAULT_EMBEDDING_SIZE),
            is_quantized: false,
            precision: FULL_PRECISION,
        }
    }
}
