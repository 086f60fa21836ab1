//! PEFT LoRA adapter directories

use super::{AdapterSource, SourceError};
use crate::export::TensorStoreReader;
use crate::lora::adapter::{
    parse_peft_tensor_name, LoraFactor, ADAPTER_CONFIG_FILENAME, ADAPTER_WEIGHTS_FILENAME,
};
use crate::lora::{AdapterDelta, PeftAdapterConfig};
use crate::tensor::NamedTensor;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Reads `adapter_config.json` + `adapter_model.safetensors`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeftAdapterSource {
    dir: PathBuf,
}

#[derive(Default)]
struct FactorPair {
    down: Option<NamedTensor>,
    up: Option<NamedTensor>,
}

impl PeftAdapterSource {
    /// Source reading the adapter in `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Adapter directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Parse and validate `adapter_config.json`
    ///
    /// # Errors
    ///
    /// [`SourceError::AdapterNotFound`] if the file is missing,
    /// [`SourceError::InvalidAdapterFormat`] if it is malformed or describes
    /// an adapter that is not a plain low-rank decomposition.
    pub fn config(&self) -> Result<PeftAdapterConfig, SourceError> {
        let path = self.dir.join(ADAPTER_CONFIG_FILENAME);
        if !path.is_file() {
            return Err(SourceError::AdapterNotFound { path });
        }
        let text =
            std::fs::read_to_string(&path).map_err(|e| SourceError::invalid_adapter(&path, e))?;
        let config =
            PeftAdapterConfig::from_json(&text).map_err(|e| SourceError::invalid_adapter(&path, e))?;
        config.validate_mergeable().map_err(|e| SourceError::invalid_adapter(&path, e))?;
        Ok(config)
    }

    fn pair_factors(&self, weights: &Path) -> Result<BTreeMap<String, FactorPair>, SourceError> {
        let tensors = TensorStoreReader::open(weights)
            .and_then(|reader| reader.read_all())
            .map_err(|e| SourceError::invalid_adapter(weights, e))?;

        let mut pairs: BTreeMap<String, FactorPair> = BTreeMap::new();
        for tensor in tensors {
            let Some(parsed) = parse_peft_tensor_name(tensor.name()) else {
                return Err(SourceError::invalid_adapter(
                    weights,
                    format!("tensor {} is not a linear LoRA factor", tensor.name()),
                ));
            };

            let pair = pairs.entry(parsed.target).or_default();
            let slot = match parsed.factor {
                LoraFactor::Down => &mut pair.down,
                LoraFactor::Up => &mut pair.up,
            };
            if let Some(previous) = slot.replace(tensor) {
                return Err(SourceError::invalid_adapter(
                    weights,
                    format!("duplicate factor {}", previous.name()),
                ));
            }
        }
        Ok(pairs)
    }
}

impl AdapterSource for PeftAdapterSource {
    fn identifier(&self) -> String {
        self.dir.display().to_string()
    }

    fn load(&self) -> Result<Vec<AdapterDelta>, SourceError> {
        if !self.dir.is_dir() {
            return Err(SourceError::AdapterNotFound { path: self.dir.clone() });
        }
        let config = self.config()?;

        let weights = self.dir.join(ADAPTER_WEIGHTS_FILENAME);
        if !weights.is_file() {
            return Err(SourceError::AdapterNotFound { path: weights });
        }

        let pairs = self.pair_factors(&weights)?;
        let mut deltas = Vec::with_capacity(pairs.len());
        for (target, pair) in pairs {
            let (Some(down), Some(up)) = (pair.down, pair.up) else {
                return Err(SourceError::invalid_adapter(
                    &weights,
                    format!("{target} is missing its lora_A or lora_B factor"),
                ));
            };
            if down.shape().first() != Some(&config.r) {
                return Err(SourceError::invalid_adapter(
                    &weights,
                    format!(
                        "{} has shape {:?}, expected rank {} from {ADAPTER_CONFIG_FILENAME}",
                        down.name(),
                        down.shape(),
                        config.r
                    ),
                ));
            }
            let delta = AdapterDelta::from_tensors(target, &down, &up, config.lora_alpha)
                .map_err(|e| SourceError::invalid_adapter(&weights, e))?;
            deltas.push(delta);
        }
        Ok(deltas)
    }
}
