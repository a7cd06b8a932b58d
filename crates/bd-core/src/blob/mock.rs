//! In-memory object store for tests.

use super::{BlobError, ObjectStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

/// Mock store backed by a `HashMap`, with switches to script failures.
#[derive(Default)]
pub struct MockObjectStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
    put_count: AtomicU64,
    delete_count: AtomicU64,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `put` fail.
    pub fn fail_puts(&self) {
        self.fail_puts.store(true, Ordering::SeqCst);
    }

    /// Makes every subsequent `delete` fail.
    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub fn put_count(&self) -> u64 {
        self.put_count.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> u64 {
        self.delete_count.load(Ordering::SeqCst)
    }

    /// Snapshot of all stored keys.
    pub fn keys(&self) -> Vec<String> {
        match self.blobs.read() {
            Ok(guard) => guard.keys().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.blobs.read().ok()?.get(path).cloned()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<String, BlobError> {
        self.put_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(BlobError::WriteFailed {
                path: path.to_string(),
                reason: "simulated write failure".to_string(),
            });
        }
        if let Ok(mut guard) = self.blobs.write() {
            guard.insert(path.to_string(), bytes.to_vec());
        }
        Ok(format!("mock://{path}"))
    }

    async fn delete(&self, path: &str) -> Result<(), BlobError> {
        self.delete_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(BlobError::DeleteFailed {
                path: path.to_string(),
                reason: "simulated delete failure".to_string(),
            });
        }
        let removed = self
            .blobs
            .write()
            .map(|mut guard| guard.remove(path).is_some())
            .unwrap_or(false);
        if removed {
            Ok(())
        } else {
            Err(BlobError::NotFound {
                path: path.to_string(),
            })
        }
    }

    async fn exists(&self, path: &str) -> Result<bool, BlobError> {
        Ok(self
            .blobs
            .read()
            .map(|guard| guard.contains_key(path))
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_put_and_delete() {
        let store = MockObjectStore::new();
        let url = store.put("a/b.txt", b"hello").await.unwrap();
        assert_eq!(url, "mock://a/b.txt");
        assert_eq!(store.contents("a/b.txt").as_deref(), Some(&b"hello"[..]));

        store.delete("a/b.txt").await.unwrap();
        assert!(!store.exists("a/b.txt").await.unwrap());
        assert_eq!(store.put_count(), 1);
        assert_eq!(store.delete_count(), 1);
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let store = MockObjectStore::new();
        store.put("a.txt", b"x").await.unwrap();

        store.fail_deletes();
        assert!(matches!(
            store.delete("a.txt").await.unwrap_err(),
            BlobError::DeleteFailed { .. }
        ));
        // Blob survives the failed delete.
        assert!(store.exists("a.txt").await.unwrap());

        store.fail_puts();
        assert!(store.put("b.txt", b"y").await.is_err());
    }
}
