//! Tests for the export and merge pipelines

use super::*;
use crate::config::ModelConfig;
use crate::error::Error;
use crate::export::{read_tensors, ContainerFormat, DefaultedField, MetadataWriter, StoreError};
use crate::lora::AdapterDelta;
use crate::merge::MergeError;
use crate::source::{AdapterSource, LoadedModel, ModelSource, SourceError};
use crate::tensor::{DType, NamedTensor, TensorSet};
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct MemorySource {
    tensors: TensorSet,
    config: ModelConfig,
    tokenizer_dir: Option<PathBuf>,
}

impl ModelSource for MemorySource {
    fn identifier(&self) -> &str {
        "memory/tiny"
    }

    fn load(&self) -> Result<LoadedModel, SourceError> {
        Ok(LoadedModel {
            tensors: self.tensors.clone(),
            config: self.config.clone(),
            config_path: None,
            tokenizer_dir: self.tokenizer_dir.clone(),
        })
    }
}

struct MemoryAdapter(Vec<AdapterDelta>);

impl AdapterSource for MemoryAdapter {
    fn identifier(&self) -> String {
        "memory-adapter".to_string()
    }

    fn load(&self) -> Result<Vec<AdapterDelta>, SourceError> {
        Ok(self.0.clone())
    }
}

fn filled(name: &str, shape: Vec<usize>, value: f32) -> NamedTensor {
    let numel: usize = shape.iter().product();
    NamedTensor::from_f32(name, shape, DType::F32, &vec![value; numel]).unwrap()
}

fn three_tensor_source(config: &str) -> MemorySource {
    MemorySource {
        tensors: TensorSet::from_tensors(vec![
            filled("layer.0.weight", vec![4, 4], 1.0),
            filled("layer.1.weight", vec![4, 4], 1.0),
            filled("norm.weight", vec![4], 1.0),
        ])
        .unwrap(),
        config: ModelConfig::from_json(config).unwrap(),
        tokenizer_dir: None,
    }
}

fn ones_delta(target: &str) -> AdapterDelta {
    AdapterDelta::new(target, vec![1.0; 8], &[2, 4], vec![1.0; 8], &[4, 2], 2.0).unwrap()
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[test]
fn test_export_writes_tensors_then_meta() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let source = three_tensor_source(
        r#"{"_name_or_path": "org/tiny", "summary": "tiny", "max_position_embeddings": 64, "hidden_size": 4}"#,
    );
    let events = RefCell::new(Vec::new());
    let sink = |e: &PipelineEvent| events.borrow_mut().push(e.clone());

    let report = run_export(&source, &ExportOptions::new(&out), &sink).unwrap();

    assert_eq!(report.model, "memory/tiny");
    assert!(report.artifacts.defaulted.is_empty());
    assert_eq!(report.artifacts.meta_path, out.join("meta.json"));
    assert_eq!(read_tensors(&out).unwrap(), source.tensors);

    let events = events.into_inner();
    assert!(matches!(events.first(), Some(PipelineEvent::SourceLoaded { tensors: 3, parameters: 36, .. })));
    assert!(matches!(events.last(), Some(PipelineEvent::MetadataWritten { .. })));
    assert!(!events.iter().any(|e| matches!(e, PipelineEvent::ConfigWritten { .. })));
}

#[test]
fn test_export_reports_defaulted_fields() {
    let dir = TempDir::new().unwrap();
    let source = three_tensor_source("{}");
    let events = RefCell::new(Vec::new());
    let sink = |e: &PipelineEvent| events.borrow_mut().push(e.clone());

    let report = run_export(&source, &ExportOptions::new(dir.path()), &sink).unwrap();

    assert_eq!(
        report.artifacts.defaulted,
        vec![
            DefaultedField::Name,
            DefaultedField::Description,
            DefaultedField::ContextLength,
            DefaultedField::EmbeddingSize,
        ]
    );
    let meta = MetadataWriter::read(&report.artifacts.meta_path).unwrap();
    assert_eq!(meta.name, "memory/tiny");
    assert_eq!(meta.context_length, 2048);
    assert_eq!(meta.embedding_size, 4096);

    let defaulted = events
        .borrow()
        .iter()
        .filter(|e| matches!(e, PipelineEvent::MetadataDefaulted { .. }))
        .count();
    assert_eq!(defaulted, 4);
}

#[test]
fn test_export_casts_floats() {
    let dir = TempDir::new().unwrap();
    let source = three_tensor_source("{}");
    let options = ExportOptions::new(dir.path()).dtype(Some(DType::BF16));

    let events = RefCell::new(Vec::new());
    let sink = |e: &PipelineEvent| events.borrow_mut().push(e.clone());
    run_export(&source, &options, &sink).unwrap();

    let written = read_tensors(dir.path()).unwrap();
    assert!(written.iter().all(|t| t.dtype() == DType::BF16));
    assert!(events
        .borrow()
        .iter()
        .any(|e| *e == PipelineEvent::TensorsCast { dtype: DType::BF16, tensors: 3 }));
}

#[test]
fn test_export_copies_tokenizer_unless_disabled() {
    let dir = TempDir::new().unwrap();
    let tok = dir.path().join("tok");
    fs::create_dir_all(&tok).unwrap();
    fs::write(tok.join("tokenizer.json"), r#"{"model": {}}"#).unwrap();
    let mut source = three_tensor_source("{}");
    source.tokenizer_dir = Some(tok);

    let with = dir.path().join("with");
    let report = run_export(&source, &ExportOptions::new(&with), &NullSink).unwrap();
    assert_eq!(report.artifacts.tokenizer_files, vec![with.join("tokenizer.json")]);
    assert_eq!(fs::read_to_string(with.join("tokenizer.json")).unwrap(), r#"{"model": {}}"#);

    let without = dir.path().join("without");
    let options = ExportOptions::new(&without).include_tokenizer(false);
    let report = run_export(&source, &options, &NullSink).unwrap();
    assert!(report.artifacts.tokenizer_files.is_empty());
    assert!(!without.join("tokenizer.json").exists());
}

#[test]
fn test_export_sharded() {
    let dir = TempDir::new().unwrap();
    let source = three_tensor_source("{}");
    let options =
        ExportOptions::new(dir.path()).format(ContainerFormat::Sharded { max_shard_bytes: 64 });

    let report = run_export(&source, &options, &NullSink).unwrap();

    assert_eq!(report.artifacts.store.files.len(), 3);
    assert!(report.artifacts.store.index.is_some());
    assert_eq!(read_tensors(dir.path()).unwrap(), source.tensors);
}

#[test]
fn test_failed_rerun_removes_previous_meta() {
    let dir = TempDir::new().unwrap();
    let tok = dir.path().join("tok");
    fs::create_dir_all(&tok).unwrap();
    fs::write(tok.join("tokenizer.json"), r#"{"model": {}}"#).unwrap();
    let mut source = three_tensor_source("{}");
    source.tokenizer_dir = Some(tok);

    let out = dir.path().join("out");
    run_export(&source, &ExportOptions::new(&out), &NullSink).unwrap();
    assert!(out.join("meta.json").is_file());

    // A directory in place of tokenizer.json makes the copy fail after the weights land
    fs::remove_file(out.join("tokenizer.json")).unwrap();
    fs::create_dir_all(out.join("tokenizer.json").join("blocker")).unwrap();

    let err = run_export(&source, &ExportOptions::new(&out), &NullSink).unwrap_err();

    assert!(matches!(err, Error::Store(StoreError::IoFailure { .. })), "{err}");
    assert!(out.join("model.safetensors").is_file());
    assert!(!out.join("meta.json").exists());
}

#[test]
fn test_export_source_error() {
    struct Missing;
    impl ModelSource for Missing {
        fn identifier(&self) -> &str {
            "missing"
        }
        fn load(&self) -> Result<LoadedModel, SourceError> {
            Err(SourceError::ModelNotFound { model: "missing".into() })
        }
    }

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let err = run_export(&Missing, &ExportOptions::new(&out), &NullSink).unwrap_err();

    assert!(matches!(err, Error::Source(SourceError::ModelNotFound { .. })));
    assert!(!out.exists());
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

#[test]
fn test_merge_all_ones() {
    let dir = TempDir::new().unwrap();
    let source = three_tensor_source(r#"{"_name_or_path": "org/tiny", "hidden_size": 4}"#);
    let adapter = MemoryAdapter(vec![ones_delta("layer.0.weight")]);
    let events = RefCell::new(Vec::new());
    let sink = |e: &PipelineEvent| events.borrow_mut().push(e.clone());

    let report = run_merge(&source, &[&adapter], &MergeOptions::new(dir.path()), &sink).unwrap();

    assert_eq!(report.tensors_merged, 1);
    assert_eq!(report.deltas_applied, 1);
    let merged = read_tensors(dir.path()).unwrap();
    assert_eq!(merged.get("layer.0.weight").unwrap().to_f32().unwrap(), vec![3.0; 16]);
    assert_eq!(merged.get("layer.1.weight"), source.tensors.get("layer.1.weight"));
    assert_eq!(merged.get("norm.weight"), source.tensors.get("norm.weight"));

    let config = fs::read_to_string(dir.path().join("config.json")).unwrap();
    assert_eq!(ModelConfig::from_json(&config).unwrap().hidden_size, Some(4));

    let events = events.into_inner();
    let merge_at = events
        .iter()
        .position(|e| *e == PipelineEvent::MergeComplete { tensors_merged: 1, deltas_applied: 1 })
        .unwrap();
    let written_at =
        events.iter().position(|e| matches!(e, PipelineEvent::TensorsWritten { .. })).unwrap();
    assert!(merge_at < written_at);
    assert!(matches!(events.last(), Some(PipelineEvent::MetadataWritten { .. })));
}

#[test]
fn test_merge_adapters_in_order() {
    let dir = TempDir::new().unwrap();
    let source = three_tensor_source("{}");
    let first = MemoryAdapter(vec![ones_delta("layer.0.weight")]);
    let second = MemoryAdapter(vec![ones_delta("layer.0.weight"), ones_delta("layer.1.weight")]);

    let report =
        run_merge(&source, &[&first, &second], &MergeOptions::new(dir.path()), &NullSink).unwrap();

    assert_eq!(report.tensors_merged, 2);
    assert_eq!(report.deltas_applied, 3);
    let merged = read_tensors(dir.path()).unwrap();
    assert_eq!(merged.get("layer.0.weight").unwrap().to_f32().unwrap(), vec![5.0; 16]);
    assert_eq!(merged.get("layer.1.weight").unwrap().to_f32().unwrap(), vec![3.0; 16]);
}

#[test]
fn test_merge_unknown_target_leaves_no_output() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("merged");
    let source = three_tensor_source("{}");
    let adapter = MemoryAdapter(vec![ones_delta("layer.99.weight")]);

    let err = run_merge(&source, &[&adapter], &MergeOptions::new(&out), &NullSink).unwrap_err();

    match err {
        Error::Merge(MergeError::UnknownTarget { tensor }) => assert_eq!(tensor, "layer.99.weight"),
        other => panic!("expected UnknownTarget, got {other:?}"),
    }
    assert!(!out.exists());
}

#[test]
fn test_merge_without_adapters_copies_base() {
    let dir = TempDir::new().unwrap();
    let source = three_tensor_source("{}");

    let report = run_merge(&source, &[], &MergeOptions::new(dir.path()), &NullSink).unwrap();

    assert_eq!(report.tensors_merged, 0);
    assert_eq!(read_tensors(dir.path()).unwrap(), source.tensors);
    assert!(report.artifacts.config_path.is_none());
}
