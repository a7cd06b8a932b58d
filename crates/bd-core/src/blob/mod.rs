//! Object storage seam for evidence blobs.
//!
//! The evidence manager talks to storage through the [`ObjectStore`]
//! trait so the filesystem backend can be swapped for a bucket-backed
//! one without touching upload logic. Paths are forward-slash keys
//! relative to the store root.

pub mod fs;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

pub use fs::FsObjectStore;
pub use mock::MockObjectStore;

/// Errors from blob storage operations.
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob not found: {path}")]
    NotFound { path: String },

    #[error("blob write failed for {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("blob delete failed for {path}: {reason}")]
    DeleteFailed { path: String, reason: String },

    #[error("invalid blob path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },
}

/// Abstract blob store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes a blob at the given key, returning a URL the API can hand
    /// to clients.
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<String, BlobError>;

    /// Deletes the blob at the given key. Deleting a missing blob is
    /// `NotFound`, not success; callers decide whether that matters.
    async fn delete(&self, path: &str) -> Result<(), BlobError>;

    /// Whether a blob exists at the given key.
    async fn exists(&self, path: &str) -> Result<bool, BlobError>;
}
