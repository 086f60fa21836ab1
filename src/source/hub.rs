//! HuggingFace Hub model source
//!
//! Downloads `config.json`, the safetensors weights (single file or shards
//! listed in the index) and any tokenizer files into the HF cache, then
//! reads the snapshot directory like any local model.

use super::local::LocalModelSource;
use super::{LoadedModel, ModelSource, SourceError};
use crate::config::CONFIG_FILENAME;
use crate::export::{ShardIndex, INDEX_FILE_NAME, SINGLE_FILE_NAME, TOKENIZER_FILES};
use hf_hub::api::sync::{Api, ApiBuilder, ApiRepo};
use hf_hub::{Repo, RepoType};
use std::path::{Path, PathBuf};

/// Model hosted on the HuggingFace Hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubModelSource {
    repo_id: String,
    revision: String,
    token: Option<String>,
    cache_dir: Option<PathBuf>,
}

impl HubModelSource {
    /// Source for `org/name` at `main`, authenticated from the environment
    #[must_use]
    pub fn new(repo_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            revision: "main".into(),
            token: Self::resolve_token(),
            cache_dir: None,
        }
    }

    /// Download a specific branch, tag or commit
    #[must_use]
    pub fn revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    /// Use an explicit access token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Override the HF cache location
    #[must_use]
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Token from `HF_TOKEN`, then the token files written by `huggingface-cli login`
    #[must_use]
    pub fn resolve_token() -> Option<String> {
        if let Ok(token) = std::env::var("HF_TOKEN") {
            if !token.is_empty() {
                return Some(token);
            }
        }

        let candidates = [
            dirs::cache_dir().map(|d| d.join("huggingface").join("token")),
            dirs::home_dir().map(|d| d.join(".huggingface").join("token")),
        ];
        candidates.into_iter().flatten().find_map(|path| {
            let token = std::fs::read_to_string(path).ok()?.trim().to_string();
            (!token.is_empty()).then_some(token)
        })
    }

    /// Whether `id` has the shape of a Hub repository (`org/name` or a legacy `name`)
    #[must_use]
    pub fn is_repo_id(id: &str) -> bool {
        let valid_part = |part: &str| {
            !part.is_empty()
                && !part.starts_with(['.', '-'])
                && part.chars().all(|c| c.is_ascii_alphanumeric() || "-_.".contains(c))
        };
        let parts: Vec<&str> = id.split('/').collect();
        (1..=2).contains(&parts.len()) && parts.iter().all(|p| valid_part(p))
    }

    fn build_api(&self) -> Result<Api, SourceError> {
        let mut builder = ApiBuilder::new();
        if let Some(dir) = &self.cache_dir {
            builder = builder.with_cache_dir(dir.clone());
        }
        if let Some(token) = &self.token {
            builder = builder.with_token(Some(token.clone()));
        }
        builder.build().map_err(|e| {
            SourceError::load_failure(&self.repo_id, format!("failed to initialize HF API: {e}"))
        })
    }

    /// Fetch a file, mapping "not found" to `None`
    fn fetch_optional(&self, repo: &ApiRepo, file: &str) -> Result<Option<PathBuf>, SourceError> {
        match repo.get(file) {
            Ok(path) => Ok(Some(path)),
            Err(e) if e.to_string().contains("404") => Ok(None),
            Err(e) => Err(SourceError::load_failure(
                &self.repo_id,
                format!("download of {file} failed: {e}"),
            )),
        }
    }

    fn fetch_required(&self, repo: &ApiRepo, file: &str) -> Result<PathBuf, SourceError> {
        self.fetch_optional(repo, file)?.ok_or_else(|| {
            SourceError::load_failure(&self.repo_id, format!("{file} is missing from the repository"))
        })
    }

    /// Download everything the exporter needs; returns the snapshot directory
    ///
    /// # Errors
    ///
    /// [`SourceError::ModelNotFound`] if the repository has neither a
    /// configuration nor safetensors weights, [`SourceError::LoadFailure`]
    /// for other download failures.
    pub fn download(&self) -> Result<PathBuf, SourceError> {
        if !Self::is_repo_id(&self.repo_id) {
            return Err(SourceError::ModelNotFound { model: self.repo_id.clone() });
        }

        let api = self.build_api()?;
        let repo = api.repo(Repo::with_revision(
            self.repo_id.clone(),
            RepoType::Model,
            self.revision.clone(),
        ));

        let config = self.fetch_optional(&repo, CONFIG_FILENAME)?;
        let weights = match self.fetch_optional(&repo, SINGLE_FILE_NAME)? {
            Some(path) => Some(path),
            None => match self.fetch_optional(&repo, INDEX_FILE_NAME)? {
                Some(index_path) => {
                    let index = ShardIndex::from_file(&index_path)
                        .map_err(|e| SourceError::load_failure(&self.repo_id, e))?;
                    for shard in index.shard_files() {
                        self.fetch_required(&repo, shard)?;
                    }
                    Some(index_path)
                }
                None => None,
            },
        };

        let Some(weights) = weights else {
            return Err(match config {
                None => SourceError::ModelNotFound { model: self.repo_id.clone() },
                Some(_) => SourceError::load_failure(
                    &self.repo_id,
                    "repository has no safetensors weights",
                ),
            });
        };

        for file in TOKENIZER_FILES {
            self.fetch_optional(&repo, file)?;
        }

        Ok(weights.parent().map(Path::to_path_buf).unwrap_or_default())
    }
}

impl ModelSource for HubModelSource {
    fn identifier(&self) -> &str {
        &self.repo_id
    }

    fn load(&self) -> Result<LoadedModel, SourceError> {
        let snapshot = self.download()?;
        tracing::debug!(repo = %self.repo_id, snapshot = %snapshot.display(), "hub snapshot ready");
        LocalModelSource::new(snapshot).with_identifier(self.repo_id.clone()).load()
    }
}
