//! Mock implementation of AnalysisStatusRepository for testing.

use crate::analysis::AnalysisStatus;
use crate::store::{AnalysisStatusRepository, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Mock implementation of AnalysisStatusRepository using in-memory
/// storage.
pub struct MockAnalysisStatusRepository {
    statuses: Arc<RwLock<HashMap<Uuid, AnalysisStatus>>>,
}

impl Default for MockAnalysisStatusRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAnalysisStatusRepository {
    pub fn new() -> Self {
        Self {
            statuses: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Creates a mock repository pre-populated with runs.
    pub fn with_statuses(statuses: Vec<AnalysisStatus>) -> Self {
        let map: HashMap<Uuid, AnalysisStatus> =
            statuses.into_iter().map(|s| (s.id, s)).collect();
        Self {
            statuses: Arc::new(RwLock::new(map)),
        }
    }

    /// Gets a snapshot of all runs in the mock.
    pub async fn snapshot(&self) -> Vec<AnalysisStatus> {
        self.statuses.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl AnalysisStatusRepository for MockAnalysisStatusRepository {
    async fn insert(&self, status: &AnalysisStatus) -> Result<AnalysisStatus, StoreError> {
        let mut statuses = self.statuses.write().await;
        if statuses.contains_key(&status.id) {
            return Err(StoreError::Constraint(format!(
                "analysis status with id '{}' already exists",
                status.id
            )));
        }
        statuses.insert(status.id, status.clone());
        Ok(status.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<AnalysisStatus>, StoreError> {
        Ok(self.statuses.read().await.get(&id).cloned())
    }

    async fn update(&self, status: &AnalysisStatus) -> Result<AnalysisStatus, StoreError> {
        let mut statuses = self.statuses.write().await;
        if !statuses.contains_key(&status.id) {
            return Err(StoreError::NotFound {
                entity: "AnalysisStatus".to_string(),
                id: status.id.to_string(),
            });
        }
        statuses.insert(status.id, status.clone());
        Ok(status.clone())
    }

    async fn list_for_incident(
        &self,
        incident_id: &str,
    ) -> Result<Vec<AnalysisStatus>, StoreError> {
        let statuses = self.statuses.read().await;
        let mut result: Vec<AnalysisStatus> = statuses
            .values()
            .filter(|s| s.incident_id == incident_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(result)
    }

    async fn latest_for_incident(
        &self,
        incident_id: &str,
    ) -> Result<Option<AnalysisStatus>, StoreError> {
        Ok(self
            .list_for_incident(incident_id)
            .await?
            .into_iter()
            .next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisType;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_insert_rejects_duplicates() {
        let repo = MockAnalysisStatusRepository::new();
        let status = AnalysisStatus::new("inc-1", "org-1", AnalysisType::Combined);
        repo.insert(&status).await.unwrap();
        assert!(matches!(
            repo.insert(&status).await.unwrap_err(),
            StoreError::Constraint(_)
        ));
    }

    #[tokio::test]
    async fn test_latest_respects_created_at_then_id() {
        let repo = MockAnalysisStatusRepository::new();
        let mut older = AnalysisStatus::new("inc-1", "org-1", AnalysisType::Combined);
        older.created_at = Utc::now() - Duration::minutes(1);
        let newer = AnalysisStatus::new("inc-1", "org-1", AnalysisType::Combined);
        repo.insert(&older).await.unwrap();
        repo.insert(&newer).await.unwrap();

        let latest = repo.latest_for_incident("inc-1").await.unwrap().unwrap();
        assert_eq!(latest.id, newer.id);
    }
}
