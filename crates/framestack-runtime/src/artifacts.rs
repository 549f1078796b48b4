use std::path::PathBuf;

use framestack_core::content_hash;
use framestack_types::{Error, Result};

/// Content-addressed blob storage under `.data/artifacts/` (spec.md §6).
/// Events reference artifacts by an `artifact:<hash>` URI; writing the
/// same bytes twice is a no-op past the first call.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn put(&self, bytes: &[u8]) -> Result<String> {
        let hash = content_hash(bytes);
        let path = self.dir.join(&hash);
        if !path.exists() {
            std::fs::write(&path, bytes).map_err(|e| Error::internal(e.to_string()))?;
        }
        Ok(format!("artifact:{hash}"))
    }

    pub fn get(&self, uri: &str) -> Result<Vec<u8>> {
        let hash = uri
            .strip_prefix("artifact:")
            .ok_or_else(|| Error::invalid_argument(format!("not an artifact uri: {uri}")))?;
        std::fs::read(self.dir.join(hash)).map_err(|_| Error::not_found(format!("artifact {uri} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn put_then_get_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().to_path_buf());
        let uri = store.put(b"hello world").unwrap();
        assert!(uri.starts_with("artifact:"));
        assert_eq!(store.get(&uri).unwrap(), b"hello world");
    }

    #[test]
    fn put_is_idempotent_for_identical_bytes() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().to_path_buf());
        let a = store.put(b"same").unwrap();
        let b = store.put(b"same").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn get_unknown_uri_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().to_path_buf());
        let err = store.get("artifact:deadbeef").unwrap_err();
        assert_eq!(err.kind(), framestack_types::ErrorKind::NotFound);
    }

    #[test]
    fn get_rejects_non_artifact_uri() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().to_path_buf());
        let err = store.get("file:///etc/passwd").unwrap_err();
        assert_eq!(err.kind(), framestack_types::ErrorKind::InvalidArgument);
    }
}
