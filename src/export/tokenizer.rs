//! Tokenizer file export

use super::atomic::commit_copy;
use super::StoreError;
use std::path::{Path, PathBuf};

/// Tokenizer artifacts carried over from a model directory
pub const TOKENIZER_FILES: &[&str] = &[
    "tokenizer.json",
    "tokenizer_config.json",
    "special_tokens_map.json",
    "tokenizer.model",
    "vocab.json",
    "vocab.txt",
    "merges.txt",
    "added_tokens.json",
    "chat_template.jinja",
];

/// Something that can place a model's tokenizer files in a directory
pub trait TokenizerExporter {
    /// Write the tokenizer into `output_dir`, returning the files written
    ///
    /// # Errors
    ///
    /// Returns error if a file cannot be written.
    fn export(&self, output_dir: &Path) -> Result<Vec<PathBuf>, StoreError>;
}

/// Copies tokenizer files unmodified from a source directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryTokenizer {
    source_dir: PathBuf,
}

impl DirectoryTokenizer {
    /// Exporter reading from `source_dir`
    #[must_use]
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self { source_dir: source_dir.into() }
    }

    /// Directory the files are copied from
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Known tokenizer files present in the source directory
    #[must_use]
    pub fn files(&self) -> Vec<PathBuf> {
        TOKENIZER_FILES
            .iter()
            .map(|name| self.source_dir.join(name))
            .filter(|path| path.is_file())
            .collect()
    }
}

impl TokenizerExporter for DirectoryTokenizer {
    fn export(&self, output_dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
        let mut written = Vec::new();
        for src in self.files() {
            let Some(name) = src.file_name() else { continue };
            let dst = output_dir.join(name);
            if dst == src {
                written.push(dst);
                continue;
            }
            commit_copy(&src, &dst)?;
            written.push(dst);
        }
        Ok(written)
    }
}
