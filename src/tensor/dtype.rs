//! Element types understood by the tensor container

use super::TensorError;
use safetensors::Dtype;
use serde::{Deserialize, Serialize};

/// Tensor element type
///
/// Mirrors the byte-addressable subset of the safetensors dtype table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DType {
    F16,
    BF16,
    F32,
    F64,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    Bool,
}

impl DType {
    /// Bytes per element
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        match self {
            Self::I8 | Self::U8 | Self::Bool => 1,
            Self::F16 | Self::BF16 | Self::I16 | Self::U16 => 2,
            Self::F32 | Self::I32 | Self::U32 => 4,
            Self::F64 | Self::I64 | Self::U64 => 8,
        }
    }

    /// Floating point types
    #[must_use]
    pub fn is_float(&self) -> bool {
        matches!(self, Self::F16 | Self::BF16 | Self::F32 | Self::F64)
    }

    /// Types the weight merger can up-cast to f32 and write back
    #[must_use]
    pub fn is_mergeable(&self) -> bool {
        matches!(self, Self::F16 | Self::BF16 | Self::F32)
    }

    /// Canonical name as written in safetensors headers
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::F16 => "F16",
            Self::BF16 => "BF16",
            Self::F32 => "F32",
            Self::F64 => "F64",
            Self::I8 => "I8",
            Self::I16 => "I16",
            Self::I32 => "I32",
            Self::I64 => "I64",
            Self::U8 => "U8",
            Self::U16 => "U16",
            Self::U32 => "U32",
            Self::U64 => "U64",
            Self::Bool => "BOOL",
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DType {
    type Err = TensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "F16" | "FLOAT16" => Ok(Self::F16),
            "BF16" | "BFLOAT16" => Ok(Self::BF16),
            "F32" | "FLOAT32" => Ok(Self::F32),
            "F64" | "FLOAT64" => Ok(Self::F64),
            "I8" => Ok(Self::I8),
            "I16" => Ok(Self::I16),
            "I32" => Ok(Self::I32),
            "I64" => Ok(Self::I64),
            "U8" => Ok(Self::U8),
            "U16" => Ok(Self::U16),
            "U32" => Ok(Self::U32),
            "U64" => Ok(Self::U64),
            "BOOL" => Ok(Self::Bool),
            _ => Err(TensorError::UnsupportedDtype { dtype: s.to_string() }),
        }
    }
}

impl From<DType> for Dtype {
    fn from(dtype: DType) -> Self {
        match dtype {
            DType::F16 => Dtype::F16,
            DType::BF16 => Dtype::BF16,
            DType::F32 => Dtype::F32,
            DType::F64 => Dtype::F64,
            DType::I8 => Dtype::I8,
            DType::I16 => Dtype::I16,
            DType::I32 => Dtype::I32,
            DType::I64 => Dtype::I64,
            DType::U8 => Dtype::U8,
            DType::U16 => Dtype::U16,
            DType::U32 => Dtype::U32,
            DType::U64 => Dtype::U64,
            DType::Bool => Dtype::BOOL,
        }
    }
}

impl TryFrom<Dtype> for DType {
    type Error = TensorError;

    fn try_from(dtype: Dtype) -> Result<Self, Self::Error> {
        match dtype {
            Dtype::F16 => Ok(Self::F16),
            Dtype::BF16 => Ok(Self::BF16),
            Dtype::F32 => Ok(Self::F32),
            Dtype::F64 => Ok(Self::F64),
            Dtype::I8 => Ok(Self::I8),
            Dtype::I16 => Ok(Self::I16),
            Dtype::I32 => Ok(Self::I32),
            Dtype::I64 => Ok(Self::I64),
            Dtype::U8 => Ok(Self::U8),
            Dtype::U16 => Ok(Self::U16),
            Dtype::U32 => Ok(Self::U32),
            Dtype::U64 => Ok(Self::U64),
            Dtype::BOOL => Ok(Self::Bool),
            other => Err(TensorError::UnsupportedDtype { dtype: format!("{other:?}") }),
        }
    }
}
