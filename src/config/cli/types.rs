//! Value types parsed from CLI flags

use crate::export::ContainerFormat;
use crate::tensor::DType;

/// Target dtype for `export --dtype`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DTypeArg {
    /// Write tensors as loaded
    #[default]
    Keep,
    F16,
    BF16,
    F32,
}

impl DTypeArg {
    /// The cast target, `None` for [`DTypeArg::Keep`]
    #[must_use]
    pub fn target(self) -> Option<DType> {
        match self {
            DTypeArg::Keep => None,
            DTypeArg::F16 => Some(DType::F16),
            DTypeArg::BF16 => Some(DType::BF16),
            DTypeArg::F32 => Some(DType::F32),
        }
    }
}

impl std::str::FromStr for DTypeArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keep" | "auto" => Ok(DTypeArg::Keep),
            "f16" | "fp16" | "float16" => Ok(DTypeArg::F16),
            "bf16" | "bfloat16" => Ok(DTypeArg::BF16),
            "f32" | "fp32" | "float32" => Ok(DTypeArg::F32),
            _ => Err(format!("Unknown dtype: {s}. Valid dtypes: keep, f16, bf16, f32")),
        }
    }
}

impl std::fmt::Display for DTypeArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DTypeArg::Keep => write!(f, "keep"),
            DTypeArg::F16 => write!(f, "f16"),
            DTypeArg::BF16 => write!(f, "bf16"),
            DTypeArg::F32 => write!(f, "f32"),
        }
    }
}

/// Tensor container layout flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerFormatArg {
    /// One `model.safetensors`
    #[default]
    Single,
    /// Size-limited shards plus an index file
    Sharded,
}

impl ContainerFormatArg {
    /// Combine with the shard size limit
    #[must_use]
    pub fn with_limit(self, max_shard_size: ByteSize) -> ContainerFormat {
        match self {
            ContainerFormatArg::Single => ContainerFormat::Single,
            ContainerFormatArg::Sharded => {
                ContainerFormat::Sharded { max_shard_bytes: max_shard_size.bytes() }
            }
        }
    }
}

impl std::str::FromStr for ContainerFormatArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" => Ok(ContainerFormatArg::Single),
            "sharded" | "shards" => Ok(ContainerFormatArg::Sharded),
            _ => Err(format!("Unknown container format: {s}. Valid formats: single, sharded")),
        }
    }
}

impl std::fmt::Display for ContainerFormatArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerFormatArg::Single => write!(f, "single"),
            ContainerFormatArg::Sharded => write!(f, "sharded"),
        }
    }
}

/// Byte count written with an optional decimal unit (`5GB`, `500MB`, `1024`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ByteSize(u64);

impl ByteSize {
    /// Wrap a raw byte count
    #[must_use]
    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Byte count
    #[must_use]
    pub const fn bytes(self) -> u64 {
        self.0
    }
}

impl std::str::FromStr for ByteSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed.find(|c: char| !c.is_ascii_digit()).unwrap_or(trimmed.len());
        let (digits, unit) = trimmed.split_at(split);

        let value: u64 =
            digits.parse().map_err(|_| format!("Invalid size: {s}. Expected e.g. 5GB, 500MB"))?;
        let multiplier: u64 = match unit.trim().to_uppercase().as_str() {
            "" | "B" => 1,
            "KB" | "K" => 1_000,
            "MB" | "M" => 1_000_000,
            "GB" | "G" => 1_000_000_000,
            "TB" | "T" => 1_000_000_000_000,
            other => {
                return Err(format!("Unknown size unit: {other}. Valid units: B, KB, MB, GB, TB"))
            }
        };

        let bytes = value.checked_mul(multiplier).ok_or_else(|| format!("Size too large: {s}"))?;
        if bytes == 0 {
            return Err("Size must be greater than zero".to_string());
        }
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for ByteSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const UNITS: [(u64, &str); 4] =
            [(1_000_000_000_000, "TB"), (1_000_000_000, "GB"), (1_000_000, "MB"), (1_000, "KB")];
        for (scale, unit) in UNITS {
            if self.0 >= scale && self.0 % scale == 0 {
                return write!(f, "{}{unit}", self.0 / scale);
            }
        }
        write!(f, "{}B", self.0)
    }
}

/// Output format for the inspect command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {s}. Valid formats: text, json")),
        }
    }
}
