//! Filesystem-backed object store.

use super::{BlobError, ObjectStore};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Stores blobs under a root directory, serving URLs under a base URL.
///
/// Keys map directly to relative paths; keys containing `..` or
/// absolute components are rejected before touching the filesystem.
pub struct FsObjectStore {
    root: PathBuf,
    base_url: String,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            root: root.into(),
            base_url,
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, BlobError> {
        let rel = Path::new(path);
        let traversal = rel.components().any(|c| {
            !matches!(c, Component::Normal(_))
        });
        if path.is_empty() || traversal {
            return Err(BlobError::InvalidPath {
                path: path.to_string(),
                reason: "key must be a relative path without traversal".to_string(),
            });
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<String, BlobError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BlobError::WriteFailed {
                    path: path.to_string(),
                    reason: e.to_string(),
                })?;
        }
        tokio::fs::write(&full, bytes)
            .await
            .map_err(|e| BlobError::WriteFailed {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        Ok(format!("{}/{}", self.base_url, path))
    }

    async fn delete(&self, path: &str) -> Result<(), BlobError> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(BlobError::NotFound {
                path: path.to_string(),
            }),
            Err(e) => Err(BlobError::DeleteFailed {
                path: path.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool, BlobError> {
        let full = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&full).await.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (FsObjectStore, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("bd-blob-{}", uuid::Uuid::new_v4()));
        (
            FsObjectStore::new(&dir, "http://localhost:8080/files/"),
            dir,
        )
    }

    #[tokio::test]
    async fn test_put_get_delete_cycle() {
        let (store, dir) = temp_store();
        let url = store
            .put("org-1/inc-1/evidence/report-1-abc.csv", b"a,b\n1,2\n")
            .await
            .unwrap();
        assert_eq!(
            url,
            "http://localhost:8080/files/org-1/inc-1/evidence/report-1-abc.csv"
        );
        assert!(store
            .exists("org-1/inc-1/evidence/report-1-abc.csv")
            .await
            .unwrap());

        store
            .delete("org-1/inc-1/evidence/report-1-abc.csv")
            .await
            .unwrap();
        assert!(!store
            .exists("org-1/inc-1/evidence/report-1-abc.csv")
            .await
            .unwrap());

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let (store, dir) = temp_store();
        let err = store.delete("org-1/inc-1/nothing.txt").await.unwrap_err();
        assert!(matches!(err, BlobError::NotFound { .. }));
        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn test_traversal_keys_rejected() {
        let (store, dir) = temp_store();
        for bad in ["../escape.txt", "/abs.txt", ""] {
            let err = store.put(bad, b"x").await.unwrap_err();
            assert!(matches!(err, BlobError::InvalidPath { .. }), "{bad:?}");
        }
        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
