//! SafeTensors tensor store: single-file and sharded layouts

use super::atomic::{commit_bytes, commit_with};
use super::format::{
    is_shard_file_name, shard_file_name, ContainerFormat, INDEX_FILE_NAME, SINGLE_FILE_NAME,
};
use super::StoreError;
use crate::tensor::{DType, NamedTensor, TensorSet};
use memmap2::Mmap;
use safetensors::tensor::TensorView;
use safetensors::SafeTensors;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};

/// `model.safetensors.index.json`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShardIndex {
    #[serde(default)]
    pub metadata: IndexMetadata,
    /// Tensor name → shard file name
    pub weight_map: BTreeMap<String, String>,
}

/// Index-level metadata
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Sum of tensor byte lengths over all shards
    #[serde(default)]
    pub total_size: u64,
}

impl ShardIndex {
    /// Read and parse an index file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a valid index.
    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let text = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        serde_json::from_str(&text)
            .map_err(|e| StoreError::Serialization(format!("{}: {e}", path.display())))
    }

    /// Shard file names in sorted order, without duplicates
    #[must_use]
    pub fn shard_files(&self) -> Vec<&str> {
        let files: BTreeSet<&str> = self.weight_map.values().map(String::as_str).collect();
        files.into_iter().collect()
    }
}

/// What [`TensorStoreWriter::write`] produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSummary {
    /// Weight files, in shard order
    pub files: Vec<PathBuf>,
    /// Index file for sharded output
    pub index: Option<PathBuf>,
    /// Number of tensors written
    pub num_tensors: usize,
    /// Tensor payload bytes, excluding headers
    pub total_bytes: u64,
}

/// Writes a [`TensorSet`] into an output directory
#[derive(Debug, Clone, Copy, Default)]
pub struct TensorStoreWriter {
    format: ContainerFormat,
}

impl TensorStoreWriter {
    /// Create a writer for the given layout
    #[must_use]
    pub fn new(format: ContainerFormat) -> Self {
        Self { format }
    }

    /// Layout this writer produces
    #[must_use]
    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    /// Write every tensor of `tensors` into `output_dir`
    ///
    /// A sharded layout that fits in one shard is written as a plain
    /// `model.safetensors` with no index. Once the new files are committed,
    /// weight files of any earlier layout in `output_dir` are removed.
    ///
    /// # Errors
    ///
    /// Returns error if a file cannot be written; already committed shards
    /// stay on disk but the index is only written after all shards.
    pub fn write(&self, tensors: &TensorSet, output_dir: &Path) -> Result<StoreSummary, StoreError> {
        let shards = match self.format {
            ContainerFormat::Single => vec![tensors.iter().collect()],
            ContainerFormat::Sharded { max_shard_bytes } => plan_shards(tensors, max_shard_bytes),
        };

        let summary = if shards.len() <= 1 {
            let path = output_dir.join(SINGLE_FILE_NAME);
            write_safetensors(tensors.iter(), &path)?;
            StoreSummary { files: vec![path], index: None, num_tensors: 0, total_bytes: 0 }
        } else {
            let count = shards.len();
            let mut index = ShardIndex::default();
            let mut files = Vec::with_capacity(count);

            for (i, shard) in shards.iter().enumerate() {
                let file_name = shard_file_name(i, count);
                let path = output_dir.join(&file_name);
                write_safetensors(shard.iter().copied(), &path)?;
                for tensor in shard {
                    index.weight_map.insert(tensor.name().to_string(), file_name.clone());
                }
                files.push(path);
            }

            index.metadata.total_size = tensors.total_bytes();
            let index_path = output_dir.join(INDEX_FILE_NAME);
            let json = serde_json::to_vec_pretty(&index)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            commit_bytes(&index_path, &json)?;
            StoreSummary { files, index: Some(index_path), num_tensors: 0, total_bytes: 0 }
        };

        remove_stale_layout(output_dir, &summary)?;

        Ok(StoreSummary {
            num_tensors: tensors.len(),
            total_bytes: tensors.total_bytes(),
            ..summary
        })
    }
}

/// Delete weight files in `output_dir` that `summary` did not produce
///
/// Covers `model.safetensors`, the shard index and `model-*-of-*` shards,
/// so [`StoreLayout::locate`] only ever sees the layout just written.
fn remove_stale_layout(output_dir: &Path, summary: &StoreSummary) -> Result<(), StoreError> {
    let entries = std::fs::read_dir(output_dir).map_err(|e| StoreError::io(output_dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| StoreError::io(output_dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let is_weight_file =
            name == SINGLE_FILE_NAME || name == INDEX_FILE_NAME || is_shard_file_name(name);
        if !is_weight_file {
            continue;
        }

        let path = entry.path();
        if summary.files.contains(&path) || summary.index.as_ref() == Some(&path) {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "removed stale weight file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::io(&path, e)),
        }
    }
    Ok(())
}

/// Greedy name-ordered packing; an oversized tensor gets a shard of its own
fn plan_shards(tensors: &TensorSet, max_shard_bytes: u64) -> Vec<Vec<&NamedTensor>> {
    let mut shards: Vec<Vec<&NamedTensor>> = Vec::new();
    let mut current_bytes = 0u64;

    for tensor in tensors {
        let size = tensor.byte_len() as u64;
        match shards.last_mut() {
            Some(shard) if current_bytes + size <= max_shard_bytes => {
                shard.push(tensor);
                current_bytes += size;
            }
            _ => {
                shards.push(vec![tensor]);
                current_bytes = size;
            }
        }
    }
    shards
}

/// Atomically write one safetensors file
///
/// # Errors
///
/// Returns error if serialization or the file commit fails.
pub fn write_safetensors<'a>(
    tensors: impl IntoIterator<Item = &'a NamedTensor>,
    path: &Path,
) -> Result<(), StoreError> {
    let views = tensors
        .into_iter()
        .map(|t| {
            TensorView::new(t.dtype().into(), t.shape().to_vec(), t.data())
                .map(|view| (t.name(), view))
                .map_err(|e| StoreError::Serialization(format!("{}: {e}", t.name())))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut metadata = HashMap::new();
    metadata.insert("format".to_string(), "pt".to_string());

    commit_with(path, |tmp| {
        safetensors::serialize_to_file(views, Some(metadata), tmp)
            .map_err(|e| StoreError::Serialization(format!("{}: {e}", path.display())))
    })
}

/// Header entry of one stored tensor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorEntry {
    pub name: String,
    pub dtype: DType,
    pub shape: Vec<usize>,
}

impl TensorEntry {
    /// Element count
    #[must_use]
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Memory-mapped reader over one safetensors file
pub struct TensorStoreReader {
    path: PathBuf,
    mmap: Mmap,
}

impl TensorStoreReader {
    /// Map `path` and validate its header
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or is not valid safetensors.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
        // SAFETY: the map is read-only and dropped with the reader; files
        // are only ever replaced by rename, never rewritten in place.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| StoreError::io(path, e))?;

        let reader = Self { path: path.to_path_buf(), mmap };
        reader.parse()?;
        Ok(reader)
    }

    /// File this reader maps
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mapped file size
    #[must_use]
    pub fn file_len(&self) -> u64 {
        self.mmap.len() as u64
    }

    fn parse(&self) -> Result<SafeTensors<'_>, StoreError> {
        SafeTensors::deserialize(&self.mmap)
            .map_err(|e| StoreError::Serialization(format!("{}: {e}", self.path.display())))
    }

    /// Header entries sorted by name, without copying tensor data
    ///
    /// # Errors
    ///
    /// Returns error if a tensor uses a dtype this crate cannot represent.
    pub fn entries(&self) -> Result<Vec<TensorEntry>, StoreError> {
        let st = self.parse()?;
        let mut entries = st
            .tensors()
            .into_iter()
            .map(|(name, view)| {
                Ok(TensorEntry { name, dtype: DType::try_from(view.dtype())?, shape: view.shape().to_vec() })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Copy every tensor into `set`, returning how many were added
    ///
    /// # Errors
    ///
    /// Returns error on unsupported dtypes or names already in `set`.
    pub fn read_into(&self, set: &mut TensorSet) -> Result<usize, StoreError> {
        let st = self.parse()?;
        let mut added = 0;
        for (name, view) in st.tensors() {
            let dtype = DType::try_from(view.dtype())?;
            set.insert(NamedTensor::new(name, view.shape().to_vec(), dtype, view.data().to_vec())?)?;
            added += 1;
        }
        Ok(added)
    }

    /// Copy every tensor into a new set
    ///
    /// # Errors
    ///
    /// See [`TensorStoreReader::read_into`].
    pub fn read_all(&self) -> Result<TensorSet, StoreError> {
        let mut set = TensorSet::new();
        self.read_into(&mut set)?;
        Ok(set)
    }
}

/// On-disk weight layout of a model directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLayout {
    /// `model.safetensors`
    Single(PathBuf),
    /// Index plus the shard files it names
    Sharded { index: PathBuf, shards: Vec<PathBuf> },
}

impl StoreLayout {
    /// Find the weights in `dir`, preferring a single file over an index
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingWeights`] if neither exists, or an error
    /// if the index cannot be parsed.
    pub fn locate(dir: &Path) -> Result<Self, StoreError> {
        let single = dir.join(SINGLE_FILE_NAME);
        if single.is_file() {
            return Ok(Self::Single(single));
        }
        let index = dir.join(INDEX_FILE_NAME);
        if index.is_file() {
            let shards =
                ShardIndex::from_file(&index)?.shard_files().into_iter().map(|f| dir.join(f)).collect();
            return Ok(Self::Sharded { index, shards });
        }
        Err(StoreError::MissingWeights { dir: dir.to_path_buf() })
    }

    /// Every weight file, in shard order
    #[must_use]
    pub fn files(&self) -> Vec<&Path> {
        match self {
            Self::Single(path) => vec![path.as_path()],
            Self::Sharded { shards, .. } => shards.iter().map(PathBuf::as_path).collect(),
        }
    }
}

/// Read a `.safetensors` file or a model directory (single or sharded)
///
/// # Errors
///
/// Returns error if no weights are found, a file is invalid, or a sharded
/// index names a tensor that no shard contains.
pub fn read_tensors(path: &Path) -> Result<TensorSet, StoreError> {
    if path.is_file() {
        return TensorStoreReader::open(path)?.read_all();
    }

    match StoreLayout::locate(path)? {
        StoreLayout::Single(file) => TensorStoreReader::open(file)?.read_all(),
        StoreLayout::Sharded { index, shards } => {
            let mut set = TensorSet::new();
            for shard in &shards {
                TensorStoreReader::open(shard)?.read_into(&mut set)?;
            }
            let listed = ShardIndex::from_file(&index)?;
            if let Some(missing) = listed.weight_map.keys().find(|name| !set.contains(name)) {
                return Err(StoreError::Serialization(format!(
                    "{} lists tensor {missing} but no shard contains it",
                    index.display()
                )));
            }
            Ok(set)
        }
    }
}
