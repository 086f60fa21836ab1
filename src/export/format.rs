//! Tensor container layouts

/// Single-file weights name
pub const SINGLE_FILE_NAME: &str = "model.safetensors";

/// Shard index name
pub const INDEX_FILE_NAME: &str = "model.safetensors.index.json";

/// Default shard limit, matching `save_pretrained`
pub const DEFAULT_MAX_SHARD_BYTES: u64 = 5_000_000_000;

/// How tensors are laid out on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerFormat {
    /// Everything in `model.safetensors`
    #[default]
    Single,
    /// `model-0000i-of-0000N.safetensors` files plus an index
    Sharded {
        /// Upper bound on tensor bytes per shard
        max_shard_bytes: u64,
    },
}

impl ContainerFormat {
    /// Sharded layout with the default limit
    #[must_use]
    pub fn sharded() -> Self {
        Self::Sharded { max_shard_bytes: DEFAULT_MAX_SHARD_BYTES }
    }
}

impl std::fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Sharded { max_shard_bytes } => write!(f, "sharded (max {max_shard_bytes} bytes)"),
        }
    }
}

/// File name of shard `index` (0-based) out of `count`
#[must_use]
pub fn shard_file_name(index: usize, count: usize) -> String {
    format!("model-{:05}-of-{count:05}.safetensors", index + 1)
}

/// Whether `name` follows the `model-*-of-*.safetensors` shard pattern
#[must_use]
pub fn is_shard_file_name(name: &str) -> bool {
    name.strip_prefix("model-")
        .and_then(|rest| rest.strip_suffix(".safetensors"))
        .is_some_and(|middle| middle.contains("-of-"))
}
