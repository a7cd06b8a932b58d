//! Evidence attachment management.
//!
//! Evidence files are spreadsheets, exports, and notes attached to an
//! incident during intake. Uploads are validated against a type and
//! size allow-list, written to the object store under a
//! collision-resistant key, and then linked onto the incident record.
//! Uploads for the `draft` sentinel incident skip the linkage write;
//! the intake wizard attaches them when the incident is first saved.

use crate::blob::{BlobError, ObjectStore};
use crate::store::{IncidentRepository, StoreError};
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Sentinel incident id for uploads that precede the incident record.
pub const DRAFT_INCIDENT_ID: &str = "draft";

const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Length of the random path suffix. Eight alphanumeric characters keep
/// collisions negligible even across tens of thousands of same-named
/// uploads in the same millisecond.
const SUFFIX_LEN: usize = 8;

/// Errors from evidence operations.
#[derive(Debug, Error)]
pub enum EvidenceError {
    #[error("file name is missing or empty")]
    MissingFileName,

    #[error("file extension {extension:?} is not allowed")]
    UnsupportedExtension { extension: String },

    #[error("content type {mime_type:?} is not allowed")]
    UnsupportedMimeType { mime_type: String },

    #[error("file is {size} bytes, exceeding the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    #[error(transparent)]
    Blob(#[from] BlobError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One evidence artifact attached to an incident.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvidenceItem {
    /// Original file name as uploaded.
    pub file_name: String,
    /// Object store key.
    pub file_path: String,
    /// Client-facing URL for the stored blob.
    pub file_url: String,
    /// Size in bytes.
    pub file_size: u64,
    pub mime_type: String,
    /// User who uploaded the file.
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Validation limits for evidence uploads.
#[derive(Debug, Clone)]
pub struct EvidenceConfig {
    pub max_file_size: u64,
    pub allowed_extensions: Vec<String>,
    pub allowed_mime_types: Vec<String>,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_extensions: ["json", "csv", "xls", "xlsx", "txt"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_mime_types: [
                "application/json",
                "text/csv",
                "application/vnd.ms-excel",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                "text/plain",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Validates, stores, links, and removes evidence files.
pub struct EvidenceManager {
    blobs: Arc<dyn ObjectStore>,
    incidents: Arc<dyn IncidentRepository>,
    config: EvidenceConfig,
}

impl EvidenceManager {
    pub fn new(
        blobs: Arc<dyn ObjectStore>,
        incidents: Arc<dyn IncidentRepository>,
        config: EvidenceConfig,
    ) -> Self {
        Self {
            blobs,
            incidents,
            config,
        }
    }

    /// Uploads an evidence file for an incident.
    ///
    /// Validation happens before any write. For the `draft` sentinel
    /// the blob is stored but no incident linkage is written.
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        organization_id: &str,
        incident_id: &str,
        file_name: &str,
        mime_type: &str,
        bytes: &[u8],
        uploaded_by: &str,
    ) -> Result<EvidenceItem, EvidenceError> {
        let extension = self.validate(file_name, mime_type, bytes.len() as u64)?;

        let path = evidence_path(organization_id, incident_id, file_name, &extension);
        let url = self.blobs.put(&path, bytes).await?;

        let item = EvidenceItem {
            file_name: file_name.to_string(),
            file_path: path,
            file_url: url,
            file_size: bytes.len() as u64,
            mime_type: mime_type.to_string(),
            uploaded_by: uploaded_by.to_string(),
            uploaded_at: Utc::now(),
        };

        if incident_id == DRAFT_INCIDENT_ID {
            tracing::debug!(file = %item.file_name, "draft upload, skipping incident linkage");
            return Ok(item);
        }

        self.incidents.link_evidence(incident_id, &item).await?;
        tracing::info!(incident_id, path = %item.file_path, "evidence attached");
        Ok(item)
    }

    /// Size ceiling uploads are validated against, in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.config.max_file_size
    }

    /// Removes an evidence file.
    ///
    /// The incident linkage is removed first; blob deletion is advisory.
    /// A failed blob delete leaves an orphan in storage, which is
    /// preferable to an incident record pointing at a blob that may or
    /// may not exist. Returns whether the blob itself was removed.
    #[tracing::instrument(skip(self))]
    pub async fn delete(
        &self,
        incident_id: &str,
        file_path: &str,
    ) -> Result<bool, EvidenceError> {
        if incident_id != DRAFT_INCIDENT_ID {
            self.incidents.unlink_evidence(incident_id, file_path).await?;
        }

        match self.blobs.delete(file_path).await {
            Ok(()) => Ok(true),
            Err(e) => {
                tracing::warn!(file_path, error = %e, "evidence blob deletion failed, leaving orphan");
                Ok(false)
            }
        }
    }

    fn validate(
        &self,
        file_name: &str,
        mime_type: &str,
        size: u64,
    ) -> Result<String, EvidenceError> {
        if file_name.trim().is_empty() {
            return Err(EvidenceError::MissingFileName);
        }
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        if !self.config.allowed_extensions.contains(&extension) {
            return Err(EvidenceError::UnsupportedExtension { extension });
        }
        if !self
            .config
            .allowed_mime_types
            .iter()
            .any(|m| m == mime_type)
        {
            return Err(EvidenceError::UnsupportedMimeType {
                mime_type: mime_type.to_string(),
            });
        }
        if size > self.config.max_file_size {
            return Err(EvidenceError::FileTooLarge {
                size,
                limit: self.config.max_file_size,
            });
        }
        Ok(extension)
    }
}

/// Builds the object store key for an upload.
///
/// Key shape: `{org}/{incident}/evidence/{base}-{millis}-{suffix}.{ext}`
/// where `base` is the sanitized original name and `suffix` is random,
/// so repeated uploads of the same file never collide.
pub fn evidence_path(
    organization_id: &str,
    incident_id: &str,
    file_name: &str,
    extension: &str,
) -> String {
    let base = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name);
    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(80)
        .collect();

    let millis = Utc::now().timestamp_millis();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect();

    format!("{organization_id}/{incident_id}/evidence/{sanitized}-{millis}-{suffix}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MockObjectStore;
    use crate::store::mocks::MockIncidentRepository;
    use crate::IncidentRecord;
    use std::collections::HashSet;

    fn manager_with(
        blobs: Arc<MockObjectStore>,
        incidents: Arc<MockIncidentRepository>,
    ) -> EvidenceManager {
        EvidenceManager::new(blobs, incidents, EvidenceConfig::default())
    }

    fn seeded_incidents() -> Arc<MockIncidentRepository> {
        Arc::new(MockIncidentRepository::with_incidents(vec![
            IncidentRecord::new("inc-1", "org-1", Utc::now()),
        ]))
    }

    #[tokio::test]
    async fn test_upload_stores_and_links() {
        let blobs = Arc::new(MockObjectStore::new());
        let incidents = seeded_incidents();
        let mgr = manager_with(blobs.clone(), incidents.clone());

        let item = mgr
            .upload("org-1", "inc-1", "export.csv", "text/csv", b"a,b\n", "user-1")
            .await
            .unwrap();

        assert!(item.file_path.starts_with("org-1/inc-1/evidence/export-"));
        assert!(item.file_path.ends_with(".csv"));
        assert_eq!(item.file_size, 4);
        assert!(blobs.contents(&item.file_path).is_some());

        let stored = incidents.snapshot("inc-1").await.unwrap();
        assert_eq!(stored.evidence.len(), 1);
        assert_eq!(stored.evidence[0].file_path, item.file_path);
    }

    #[tokio::test]
    async fn test_draft_upload_skips_linkage() {
        let blobs = Arc::new(MockObjectStore::new());
        let incidents = seeded_incidents();
        let mgr = manager_with(blobs.clone(), incidents.clone());

        let item = mgr
            .upload("org-1", DRAFT_INCIDENT_ID, "notes.txt", "text/plain", b"x", "user-1")
            .await
            .unwrap();

        assert!(item.file_path.starts_with("org-1/draft/evidence/"));
        assert_eq!(blobs.put_count(), 1);
        // No incident writes of any kind happened.
        assert_eq!(incidents.write_count(), 0);
    }

    #[tokio::test]
    async fn test_validation_rejects_before_any_write() {
        let blobs = Arc::new(MockObjectStore::new());
        let incidents = seeded_incidents();
        let mgr = manager_with(blobs.clone(), incidents.clone());

        let cases: Vec<(&str, &str, Vec<u8>)> = vec![
            ("payload.exe", "text/plain", b"x".to_vec()),
            ("export.csv", "application/zip", b"x".to_vec()),
            ("", "text/plain", b"x".to_vec()),
            ("big.txt", "text/plain", vec![0u8; (DEFAULT_MAX_FILE_SIZE + 1) as usize]),
        ];
        for (name, mime, bytes) in cases {
            assert!(
                mgr.upload("org-1", "inc-1", name, mime, &bytes, "user-1")
                    .await
                    .is_err(),
                "accepted {name:?} / {mime:?}"
            );
        }
        assert_eq!(blobs.put_count(), 0);
        assert_eq!(incidents.write_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_unlinks_even_when_blob_delete_fails() {
        let blobs = Arc::new(MockObjectStore::new());
        let incidents = seeded_incidents();
        let mgr = manager_with(blobs.clone(), incidents.clone());

        let item = mgr
            .upload("org-1", "inc-1", "export.csv", "text/csv", b"a,b\n", "user-1")
            .await
            .unwrap();

        blobs.fail_deletes();
        let removed = mgr.delete("inc-1", &item.file_path).await.unwrap();
        assert!(!removed);

        // Linkage is gone regardless of the orphaned blob.
        let stored = incidents.snapshot("inc-1").await.unwrap();
        assert!(stored.evidence.is_empty());
        assert!(blobs.exists(&item.file_path).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_success_reports_removed() {
        let blobs = Arc::new(MockObjectStore::new());
        let incidents = seeded_incidents();
        let mgr = manager_with(blobs.clone(), incidents.clone());

        let item = mgr
            .upload("org-1", "inc-1", "export.csv", "text/csv", b"a,b\n", "user-1")
            .await
            .unwrap();
        assert!(mgr.delete("inc-1", &item.file_path).await.unwrap());
        assert!(!blobs.exists(&item.file_path).await.unwrap());
    }

    #[test]
    fn test_path_sanitizes_base_name() {
        let path = evidence_path("org-1", "inc-1", "q3 report (final)!.xlsx", "xlsx");
        let base = path.rsplit('/').next().unwrap();
        assert!(base.starts_with("q3_report__final__-"));
        assert!(base.ends_with(".xlsx"));
        assert!(!path.contains(' '));
    }

    #[test]
    fn test_same_name_uploads_get_distinct_paths() {
        let mut paths = HashSet::new();
        for _ in 0..10_000 {
            paths.insert(evidence_path("org-1", "inc-1", "export.csv", "csv"));
        }
        assert_eq!(paths.len(), 10_000);
    }
}
