//! Write-to-temp-then-rename file commits

use super::StoreError;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Hidden sibling used while `path` is being written
pub(crate) fn temp_sibling(path: &Path) -> PathBuf {
    let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    path.with_file_name(format!(".{file_name}.tmp-{}", std::process::id()))
}

/// Produce `path` atomically
///
/// `write` fills the temporary sibling it is given. The result is synced and
/// renamed over `path` only if `write` succeeds; otherwise the temporary
/// file is removed and `path` is left as it was.
pub(crate) fn commit_with<F>(path: &Path, write: F) -> Result<(), StoreError>
where
    F: FnOnce(&Path) -> Result<(), StoreError>,
{
    let tmp = temp_sibling(path);
    let result = write(&tmp)
        .and_then(|()| sync(&tmp))
        .and_then(|()| fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e)));

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Atomically write `bytes` to `path`
pub(crate) fn commit_bytes(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    commit_with(path, |tmp| fs::write(tmp, bytes).map_err(|e| StoreError::io(tmp, e)))
}

/// Atomically copy `src` to `dst`, returning the bytes copied
pub(crate) fn commit_copy(src: &Path, dst: &Path) -> Result<u64, StoreError> {
    let mut copied = 0;
    commit_with(dst, |tmp| {
        copied = fs::copy(src, tmp).map_err(|e| StoreError::io(src, e))?;
        Ok(())
    })?;
    Ok(copied)
}

fn sync(path: &Path) -> Result<(), StoreError> {
    File::open(path).and_then(|f| f.sync_all()).map_err(|e| StoreError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_commit_bytes_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("meta.json");
        commit_bytes(&path, b"{}").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"{}");
        assert!(!temp_sibling(&path).exists());
    }

    #[test]
    fn test_failed_write_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.safetensors");

        let err = commit_with(&path, |tmp| {
            fs::write(tmp, b"partial").unwrap();
            Err(StoreError::Serialization("boom".into()))
        })
        .unwrap_err();

        assert!(matches!(err, StoreError::Serialization(_)));
        assert!(!path.exists());
        assert!(!temp_sibling(&path).exists());
    }

    #[test]
    fn test_failed_write_keeps_previous_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("meta.json");
        fs::write(&path, b"old").unwrap();

        let _ = commit_with(&path, |_| Err(StoreError::Serialization("boom".into())));
        assert_eq!(fs::read(&path).unwrap(), b"old");
    }

    #[test]
    fn test_temp_sibling_is_hidden() {
        let tmp = temp_sibling(Path::new("/out/model.safetensors"));
        assert_eq!(tmp.parent(), Some(Path::new("/out")));
        assert!(tmp.file_name().unwrap().to_string_lossy().starts_with(".model.safetensors.tmp-"));
    }

    #[test]
    fn test_commit_copy() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.txt");
        fs::write(&src, b"hello").unwrap();
        let dst = dir.path().join("b.txt");

        assert_eq!(commit_copy(&src, &dst).unwrap(), 5);
        assert_eq!(fs::read(&dst).unwrap(), b"hello");
    }

    #[test]
    fn test_commit_copy_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = commit_copy(&dir.path().join("missing"), &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, StoreError::IoFailure { .. }));
        assert!(!dir.path().join("out").exists());
    }
}
