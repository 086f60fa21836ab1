//! Tests for local model and PEFT adapter sources

use super::*;
use crate::export::write_safetensors;
use crate::tensor::{DType, NamedTensor};
use std::fs;
use tempfile::TempDir;

const ADAPTER_CONFIG: &str = r#"{
    "peft_type": "LORA",
    "r": 2,
    "lora_alpha": 4,
    "target_modules": ["q_proj", "v_proj"],
    "lora_dropout": 0.05,
    "bias": "none",
    "task_type": "CAUSAL_LM"
}"#;

fn tensor(name: &str, shape: Vec<usize>, value: f32) -> NamedTensor {
    let numel: usize = shape.iter().product();
    NamedTensor::from_f32(name, shape, DType::F32, &vec![value; numel]).unwrap()
}

fn write_model_dir(dir: &Path) {
    let tensors = [tensor("layers.0.q_proj.weight", vec![4, 3], 1.0), tensor("norm.weight", vec![4], 0.5)];
    write_safetensors(tensors.iter(), &dir.join("model.safetensors")).unwrap();
    fs::write(dir.join("config.json"), r#"{"_name_or_path": "org/tiny", "hidden_size": 4}"#).unwrap();
    fs::write(dir.join("tokenizer.json"), "{}").unwrap();
}

fn write_adapter(dir: &Path, config: &str, tensors: &[NamedTensor]) {
    fs::write(dir.join("adapter_config.json"), config).unwrap();
    write_safetensors(tensors.iter(), &dir.join("adapter_model.safetensors")).unwrap();
}

fn factor_pair(module: &str, d_out: usize, d_in: usize, rank: usize) -> [NamedTensor; 2] {
    [
        tensor(&format!("base_model.model.{module}.lora_A.weight"), vec![rank, d_in], 0.5),
        tensor(&format!("base_model.model.{module}.lora_B.weight"), vec![d_out, rank], 0.25),
    ]
}

// ---------------------------------------------------------------------------
// LocalModelSource
// ---------------------------------------------------------------------------

#[test]
fn test_local_directory_load() {
    let dir = TempDir::new().unwrap();
    write_model_dir(dir.path());

    let source = LocalModelSource::new(dir.path());
    let loaded = source.load().unwrap();

    assert_eq!(loaded.tensors.len(), 2);
    assert_eq!(loaded.tensors.get("norm.weight").unwrap().shape(), &[4]);
    assert_eq!(loaded.config.name_or_path.as_deref(), Some("org/tiny"));
    assert_eq!(loaded.config_path, Some(dir.path().join("config.json")));
    assert_eq!(loaded.tokenizer_dir.as_deref(), Some(dir.path()));
    assert_eq!(source.identifier(), dir.path().display().to_string());
}

#[test]
fn test_local_single_file_load() {
    let dir = TempDir::new().unwrap();
    write_model_dir(dir.path());

    let loaded = LocalModelSource::new(dir.path().join("model.safetensors")).load().unwrap();
    assert_eq!(loaded.tensors.len(), 2);
    assert_eq!(loaded.config.hidden_size, Some(4));
    assert_eq!(loaded.tokenizer_dir.as_deref(), Some(dir.path()));
}

#[test]
fn test_local_without_config_uses_empty_record() {
    let dir = TempDir::new().unwrap();
    write_model_dir(dir.path());
    fs::remove_file(dir.path().join("config.json")).unwrap();

    let loaded = LocalModelSource::new(dir.path()).load().unwrap();
    assert!(loaded.config.is_empty());
    assert!(loaded.config_path.is_none());
}

#[test]
fn test_local_missing_path() {
    let dir = TempDir::new().unwrap();
    let err = LocalModelSource::new(dir.path().join("nope")).load().unwrap_err();
    assert!(matches!(err, SourceError::ModelNotFound { .. }));
}

#[test]
fn test_local_directory_without_weights() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("config.json"), "{}").unwrap();
    let err = LocalModelSource::new(dir.path()).load().unwrap_err();
    assert!(matches!(err, SourceError::LoadFailure { .. }));
}

#[test]
fn test_local_invalid_config() {
    let dir = TempDir::new().unwrap();
    write_model_dir(dir.path());
    fs::write(dir.path().join("config.json"), "not json").unwrap();
    let err = LocalModelSource::new(dir.path()).load().unwrap_err();
    assert!(matches!(err, SourceError::LoadFailure { .. }));
}

#[test]
fn test_resolve_existing_path_is_local() {
    let dir = TempDir::new().unwrap();
    write_model_dir(dir.path());
    let id = dir.path().display().to_string();

    let source = resolve_model_source(&id, false).unwrap();
    assert_eq!(source.identifier(), id);
    assert_eq!(source.load().unwrap().tensors.len(), 2);
}

#[test]
fn test_resolve_local_only_missing_path() {
    let err = resolve_model_source("org/definitely-not-on-disk", true).err().unwrap();
    assert!(matches!(err, SourceError::ModelNotFound { .. }));
}

#[cfg(not(feature = "hub"))]
#[test]
fn test_resolve_without_hub_support() {
    let err = resolve_model_source("org/definitely-not-on-disk", false).err().unwrap();
    assert!(matches!(err, SourceError::ModelNotFound { .. }));
}

// ---------------------------------------------------------------------------
// PeftAdapterSource
// ---------------------------------------------------------------------------

#[test]
fn test_peft_adapter_load_sorted_by_target() {
    let dir = TempDir::new().unwrap();
    let mut tensors = Vec::new();
    tensors.extend(factor_pair("model.layers.1.v_proj", 4, 3, 2));
    tensors.extend(factor_pair("model.layers.0.q_proj", 4, 3, 2));
    write_adapter(dir.path(), ADAPTER_CONFIG, &tensors);

    let deltas = PeftAdapterSource::new(dir.path()).load().unwrap();
    let targets: Vec<&str> = deltas.iter().map(AdapterDelta::target).collect();
    assert_eq!(targets, vec!["model.layers.0.q_proj.weight", "model.layers.1.v_proj.weight"]);

    let first = &deltas[0];
    assert_eq!(first.rank(), 2);
    assert_eq!(first.alpha(), 4.0);
    assert_eq!(first.delta_shape(), [4, 3]);
}

#[test]
fn test_peft_adapter_named_factors() {
    let dir = TempDir::new().unwrap();
    let tensors = [
        tensor("base_model.model.lm_head.lora_A.default.weight", vec![2, 3], 1.0),
        tensor("base_model.model.lm_head.lora_B.default.weight", vec![5, 2], 1.0),
    ];
    write_adapter(dir.path(), ADAPTER_CONFIG, &tensors);

    let deltas = PeftAdapterSource::new(dir.path()).load().unwrap();
    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].target(), "lm_head.weight");
    assert_eq!(deltas[0].delta_shape(), [5, 3]);
}

#[test]
fn test_peft_missing_directory() {
    let dir = TempDir::new().unwrap();
    let err = PeftAdapterSource::new(dir.path().join("missing")).load().unwrap_err();
    assert!(matches!(err, SourceError::AdapterNotFound { .. }));
}

#[test]
fn test_peft_missing_weights() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("adapter_config.json"), ADAPTER_CONFIG).unwrap();
    let err = PeftAdapterSource::new(dir.path()).load().unwrap_err();
    match err {
        SourceError::AdapterNotFound { path } => {
            assert_eq!(path, dir.path().join("adapter_model.safetensors"));
        }
        other => panic!("expected AdapterNotFound, got {other:?}"),
    }
}

#[test]
fn test_peft_missing_config() {
    let dir = TempDir::new().unwrap();
    write_safetensors(factor_pair("q_proj", 4, 3, 2).iter(), &dir.path().join("adapter_model.safetensors"))
        .unwrap();
    let err = PeftAdapterSource::new(dir.path()).load().unwrap_err();
    assert!(matches!(err, SourceError::AdapterNotFound { .. }));
}

#[test]
fn test_peft_dora_rejected() {
    let dir = TempDir::new().unwrap();
    let config = ADAPTER_CONFIG.replace("\"bias\": \"none\"", "\"bias\": \"none\", \"use_dora\": true");
    write_adapter(dir.path(), &config, &factor_pair("q_proj", 4, 3, 2));

    let err = PeftAdapterSource::new(dir.path()).load().unwrap_err();
    assert!(matches!(err, SourceError::InvalidAdapterFormat { .. }));
    assert!(err.to_string().contains("use_dora"));
}

#[test]
fn test_peft_unpaired_factor_rejected() {
    let dir = TempDir::new().unwrap();
    let [down, _] = factor_pair("q_proj", 4, 3, 2);
    write_adapter(dir.path(), ADAPTER_CONFIG, &[down]);

    let err = PeftAdapterSource::new(dir.path()).load().unwrap_err();
    assert!(err.to_string().contains("q_proj.weight"));
    assert!(matches!(err, SourceError::InvalidAdapterFormat { .. }));
}

#[test]
fn test_peft_embedding_factor_rejected() {
    let dir = TempDir::new().unwrap();
    let mut tensors = factor_pair("q_proj", 4, 3, 2).to_vec();
    tensors.push(tensor("base_model.model.embed_tokens.lora_embedding_A", vec![2, 10], 0.0));
    write_adapter(dir.path(), ADAPTER_CONFIG, &tensors);

    let err = PeftAdapterSource::new(dir.path()).load().unwrap_err();
    assert!(err.to_string().contains("lora_embedding_A"));
}

#[test]
fn test_peft_rank_disagrees_with_config() {
    let dir = TempDir::new().unwrap();
    write_adapter(dir.path(), ADAPTER_CONFIG, &factor_pair("q_proj", 4, 3, 3));

    let err = PeftAdapterSource::new(dir.path()).load().unwrap_err();
    assert!(matches!(err, SourceError::InvalidAdapterFormat { .. }));
    assert!(err.to_string().contains("expected rank 2"));
}

#[test]
fn test_peft_duplicate_factor_rejected() {
    let dir = TempDir::new().unwrap();
    let mut tensors = factor_pair("q_proj", 4, 3, 2).to_vec();
    tensors.push(tensor("base_model.model.q_proj.lora_A.default.weight", vec![2, 3], 0.5));
    write_adapter(dir.path(), ADAPTER_CONFIG, &tensors);

    let err = PeftAdapterSource::new(dir.path()).load().unwrap_err();
    assert!(err.to_string().contains("duplicate factor"));
}

#[test]
fn test_peft_config_accessor() {
    let dir = TempDir::new().unwrap();
    write_adapter(dir.path(), ADAPTER_CONFIG, &factor_pair("q_proj", 4, 3, 2));

    let source = PeftAdapterSource::new(dir.path());
    let config = source.config().unwrap();
    assert_eq!(config.r, 2);
    assert_eq!(source.identifier(), dir.path().display().to_string());
    assert_eq!(source.dir(), dir.path());
}
