//! Mock implementation of IncidentRepository for testing.

use crate::evidence::EvidenceItem;
use crate::incident::IncidentRecord;
use crate::store::{IncidentRepository, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock implementation of IncidentRepository using in-memory storage.
///
/// Every mutation increments a write counter so tests can assert that a
/// code path performed no incident writes at all.
pub struct MockIncidentRepository {
    incidents: Arc<RwLock<HashMap<String, IncidentRecord>>>,
    write_count: AtomicU64,
}

impl Default for MockIncidentRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MockIncidentRepository {
    pub fn new() -> Self {
        Self {
            incidents: Arc::new(RwLock::new(HashMap::new())),
            write_count: AtomicU64::new(0),
        }
    }

    /// Creates a mock repository pre-populated with incidents.
    pub fn with_incidents(incidents: Vec<IncidentRecord>) -> Self {
        let map: HashMap<String, IncidentRecord> = incidents
            .into_iter()
            .map(|i| (i.id.clone(), i))
            .collect();
        Self {
            incidents: Arc::new(RwLock::new(map)),
            write_count: AtomicU64::new(0),
        }
    }

    /// Gets a snapshot of one incident.
    pub async fn snapshot(&self, id: &str) -> Option<IncidentRecord> {
        self.incidents.read().await.get(id).cloned()
    }

    /// Number of writes performed since construction.
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IncidentRepository for MockIncidentRepository {
    async fn get(&self, id: &str) -> Result<Option<IncidentRecord>, StoreError> {
        Ok(self.incidents.read().await.get(id).cloned())
    }

    async fn put(&self, incident: &IncidentRecord) -> Result<IncidentRecord, StoreError> {
        self.write_count.fetch_add(1, Ordering::SeqCst);
        self.incidents
            .write()
            .await
            .insert(incident.id.clone(), incident.clone());
        Ok(incident.clone())
    }

    async fn link_evidence(
        &self,
        incident_id: &str,
        item: &EvidenceItem,
    ) -> Result<(), StoreError> {
        self.write_count.fetch_add(1, Ordering::SeqCst);
        let mut incidents = self.incidents.write().await;
        let incident = incidents.get_mut(incident_id).ok_or_else(|| {
            StoreError::NotFound {
                entity: "Incident".to_string(),
                id: incident_id.to_string(),
            }
        })?;
        incident.evidence.push(item.clone());
        incident.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn unlink_evidence(
        &self,
        incident_id: &str,
        file_path: &str,
    ) -> Result<(), StoreError> {
        self.write_count.fetch_add(1, Ordering::SeqCst);
        let mut incidents = self.incidents.write().await;
        let incident = incidents.get_mut(incident_id).ok_or_else(|| {
            StoreError::NotFound {
                entity: "Incident".to_string(),
                id: incident_id.to_string(),
            }
        })?;
        incident.evidence.retain(|e| e.file_path != file_path);
        incident.updated_at = chrono::Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_write_counter_tracks_mutations() {
        let repo = MockIncidentRepository::new();
        assert_eq!(repo.write_count(), 0);

        repo.put(&IncidentRecord::new("inc-1", "org-1", Utc::now()))
            .await
            .unwrap();
        assert_eq!(repo.write_count(), 1);

        let item = EvidenceItem {
            file_name: "a.txt".to_string(),
            file_path: "org-1/inc-1/evidence/a.txt".to_string(),
            file_url: "mock://a".to_string(),
            file_size: 1,
            mime_type: "text/plain".to_string(),
            uploaded_by: "user-1".to_string(),
            uploaded_at: Utc::now(),
        };
        repo.link_evidence("inc-1", &item).await.unwrap();
        repo.unlink_evidence("inc-1", &item.file_path).await.unwrap();
        assert_eq!(repo.write_count(), 3);
        assert!(repo.snapshot("inc-1").await.unwrap().evidence.is_empty());
    }
}
