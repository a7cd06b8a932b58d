//! Incident repository.
//!
//! Incident records are owned by the intake workflow; this repository
//! reads them and maintains the evidence linkage list. `put` exists for
//! seeding and local development, not for the request path.

use super::StoreError;
use crate::evidence::EvidenceItem;
use crate::incident::{DataScope, IncidentRecord, IncidentStatus};
use async_trait::async_trait;

/// Repository for incident records.
#[async_trait]
pub trait IncidentRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<IncidentRecord>, StoreError>;

    /// Inserts or replaces a full incident record.
    async fn put(&self, incident: &IncidentRecord) -> Result<IncidentRecord, StoreError>;

    /// Appends an evidence item to an incident's evidence list.
    async fn link_evidence(
        &self,
        incident_id: &str,
        item: &EvidenceItem,
    ) -> Result<(), StoreError>;

    /// Removes the evidence item with the given path from an incident.
    /// Removing a path that is not linked is a no-op.
    async fn unlink_evidence(
        &self,
        incident_id: &str,
        file_path: &str,
    ) -> Result<(), StoreError>;
}

/// SQLite implementation of IncidentRepository.
#[cfg(feature = "database")]
pub struct SqliteIncidentRepository {
    pool: sqlx::SqlitePool,
}

#[cfg(feature = "database")]
impl SqliteIncidentRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: &str) -> Result<Option<IncidentRecord>, StoreError> {
        let row: Option<IncidentRow> = sqlx::query_as(
            r#"SELECT id, organization_id, status, discovered_at, data_scope, evidence, created_at, updated_at FROM incidents WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row.try_into()?)),
            None => Ok(None),
        }
    }

    async fn write_evidence(
        &self,
        incident_id: &str,
        evidence: &[EvidenceItem],
    ) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(evidence)?;
        let updated_at = chrono::Utc::now().to_rfc3339();

        sqlx::query("UPDATE incidents SET evidence = ?, updated_at = ? WHERE id = ?")
            .bind(&serialized)
            .bind(&updated_at)
            .bind(incident_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(feature = "database")]
#[async_trait]
impl IncidentRepository for SqliteIncidentRepository {
    async fn get(&self, id: &str) -> Result<Option<IncidentRecord>, StoreError> {
        self.fetch(id).await
    }

    async fn put(&self, incident: &IncidentRecord) -> Result<IncidentRecord, StoreError> {
        let status = incident.status.as_db_str();
        let discovered_at = incident.discovered_at.to_rfc3339();
        let data_scope = serde_json::to_string(&incident.data_scope)?;
        let evidence = serde_json::to_string(&incident.evidence)?;
        let created_at = incident.created_at.to_rfc3339();
        let updated_at = incident.updated_at.to_rfc3339();

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO incidents (id, organization_id, status, discovered_at, data_scope, evidence, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&incident.id)
        .bind(&incident.organization_id)
        .bind(status)
        .bind(&discovered_at)
        .bind(&data_scope)
        .bind(&evidence)
        .bind(&created_at)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;

        Ok(incident.clone())
    }

    async fn link_evidence(
        &self,
        incident_id: &str,
        item: &EvidenceItem,
    ) -> Result<(), StoreError> {
        let mut incident = self.fetch(incident_id).await?.ok_or_else(|| {
            StoreError::NotFound {
                entity: "Incident".to_string(),
                id: incident_id.to_string(),
            }
        })?;
        incident.evidence.push(item.clone());
        self.write_evidence(incident_id, &incident.evidence).await
    }

    async fn unlink_evidence(
        &self,
        incident_id: &str,
        file_path: &str,
    ) -> Result<(), StoreError> {
        let mut incident = self.fetch(incident_id).await?.ok_or_else(|| {
            StoreError::NotFound {
                entity: "Incident".to_string(),
                id: incident_id.to_string(),
            }
        })?;
        incident.evidence.retain(|e| e.file_path != file_path);
        self.write_evidence(incident_id, &incident.evidence).await
    }
}

/// Creates the SQLite-backed repository.
#[cfg(feature = "database")]
pub fn create_incident_repository(
    pool: &sqlx::SqlitePool,
) -> std::sync::Arc<dyn IncidentRepository> {
    std::sync::Arc::new(SqliteIncidentRepository::new(pool.clone()))
}

// Helper struct for SQLx row mapping

#[cfg(feature = "database")]
#[derive(sqlx::FromRow)]
struct IncidentRow {
    id: String,
    organization_id: String,
    status: String,
    discovered_at: String,
    data_scope: String,
    evidence: String,
    created_at: String,
    updated_at: String,
}

#[cfg(feature = "database")]
impl TryFrom<IncidentRow> for IncidentRecord {
    type Error = StoreError;

    fn try_from(row: IncidentRow) -> Result<Self, Self::Error> {
        let parse_ts = |s: &str| {
            chrono::DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&chrono::Utc))
                .map_err(|e| StoreError::Serialization(format!("invalid timestamp {s:?}: {e}")))
        };

        let data_scope: DataScope = serde_json::from_str(&row.data_scope)?;
        let evidence: Vec<EvidenceItem> = serde_json::from_str(&row.evidence)?;

        Ok(IncidentRecord {
            id: row.id,
            organization_id: row.organization_id,
            status: IncidentStatus::from_db_str(&row.status),
            discovered_at: parse_ts(&row.discovered_at)?,
            data_scope,
            evidence,
            created_at: parse_ts(&row.created_at)?,
            updated_at: parse_ts(&row.updated_at)?,
        })
    }
}

#[cfg(all(test, feature = "database"))]
mod tests {
    use super::*;
    use crate::store::{create_pool, run_migrations};
    use chrono::Utc;

    async fn repo() -> SqliteIncidentRepository {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteIncidentRepository::new(pool)
    }

    fn item(path: &str) -> EvidenceItem {
        EvidenceItem {
            file_name: "export.csv".to_string(),
            file_path: path.to_string(),
            file_url: format!("http://files.local/{path}"),
            file_size: 10,
            mime_type: "text/csv".to_string(),
            uploaded_by: "user-1".to_string(),
            uploaded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_put_and_get_round_trip() {
        let repo = repo().await;
        let incident = IncidentRecord::new("inc-1", "org-1", Utc::now());
        repo.put(&incident).await.unwrap();

        let fetched = repo.get("inc-1").await.unwrap().unwrap();
        assert_eq!(fetched.id, "inc-1");
        assert_eq!(fetched.status, IncidentStatus::Draft);
        assert!(fetched.evidence.is_empty());
    }

    #[tokio::test]
    async fn test_legacy_completed_status_readable() {
        let repo = repo().await;
        let mut incident = IncidentRecord::new("inc-1", "org-1", Utc::now());
        incident.status = IncidentStatus::SimulationCompleted;
        repo.put(&incident).await.unwrap();

        // Overwrite the status column with the legacy value.
        sqlx::query("UPDATE incidents SET status = 'completed' WHERE id = 'inc-1'")
            .execute(&repo.pool)
            .await
            .unwrap();

        let fetched = repo.get("inc-1").await.unwrap().unwrap();
        assert_eq!(fetched.status, IncidentStatus::SimulationCompleted);
    }

    #[tokio::test]
    async fn test_link_and_unlink_evidence() {
        let repo = repo().await;
        repo.put(&IncidentRecord::new("inc-1", "org-1", Utc::now()))
            .await
            .unwrap();

        repo.link_evidence("inc-1", &item("org-1/inc-1/evidence/a.csv"))
            .await
            .unwrap();
        repo.link_evidence("inc-1", &item("org-1/inc-1/evidence/b.csv"))
            .await
            .unwrap();
        assert_eq!(repo.get("inc-1").await.unwrap().unwrap().evidence.len(), 2);

        repo.unlink_evidence("inc-1", "org-1/inc-1/evidence/a.csv")
            .await
            .unwrap();
        let remaining = repo.get("inc-1").await.unwrap().unwrap().evidence;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].file_path, "org-1/inc-1/evidence/b.csv");

        // Unknown path is a no-op, not an error.
        repo.unlink_evidence("inc-1", "missing.csv").await.unwrap();
    }

    #[tokio::test]
    async fn test_link_to_missing_incident_is_not_found() {
        let repo = repo().await;
        let err = repo
            .link_evidence("inc-404", &item("p.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
