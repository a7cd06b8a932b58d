//! Analysis status repository.

use super::StoreError;
use crate::analysis::{AnalysisState, AnalysisStatus, AnalysisType};
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for analysis run records.
///
/// Rows are append-only across runs: `insert` creates, `update` mutates
/// a single run's lifecycle fields, and nothing deletes. "Latest" is
/// `created_at` descending with id descending as the tie-break.
#[async_trait]
pub trait AnalysisStatusRepository: Send + Sync {
    async fn insert(&self, status: &AnalysisStatus) -> Result<AnalysisStatus, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<AnalysisStatus>, StoreError>;

    /// Persists lifecycle changes to an existing run.
    async fn update(&self, status: &AnalysisStatus) -> Result<AnalysisStatus, StoreError>;

    /// All runs for an incident, newest first.
    async fn list_for_incident(
        &self,
        incident_id: &str,
    ) -> Result<Vec<AnalysisStatus>, StoreError>;

    /// The newest run for an incident, if any.
    async fn latest_for_incident(
        &self,
        incident_id: &str,
    ) -> Result<Option<AnalysisStatus>, StoreError>;
}

/// SQLite implementation of AnalysisStatusRepository.
#[cfg(feature = "database")]
pub struct SqliteAnalysisStatusRepository {
    pool: sqlx::SqlitePool,
}

#[cfg(feature = "database")]
impl SqliteAnalysisStatusRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[cfg(feature = "database")]
#[async_trait]
impl AnalysisStatusRepository for SqliteAnalysisStatusRepository {
    async fn insert(&self, status: &AnalysisStatus) -> Result<AnalysisStatus, StoreError> {
        let id = status.id.to_string();
        let state = status.state.as_db_str();
        let analysis_type = status.analysis_type.as_db_str();
        let results = status
            .results
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let started_at = status.started_at.map(|t| t.to_rfc3339());
        let completed_at = status.completed_at.map(|t| t.to_rfc3339());
        let created_at = status.created_at.to_rfc3339();
        let updated_at = status.updated_at.to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO analysis_status (id, incident_id, organization_id, state, analysis_type, job_handle, results, error, started_at, completed_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&status.incident_id)
        .bind(&status.organization_id)
        .bind(state)
        .bind(analysis_type)
        .bind(&status.job_handle)
        .bind(&results)
        .bind(&status.error)
        .bind(&started_at)
        .bind(&completed_at)
        .bind(&created_at)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;

        Ok(status.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<AnalysisStatus>, StoreError> {
        let id_str = id.to_string();

        let row: Option<AnalysisStatusRow> = sqlx::query_as(
            r#"SELECT id, incident_id, organization_id, state, analysis_type, job_handle, results, error, started_at, completed_at, created_at, updated_at FROM analysis_status WHERE id = ?"#,
        )
        .bind(&id_str)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row.try_into()?)),
            None => Ok(None),
        }
    }

    async fn update(&self, status: &AnalysisStatus) -> Result<AnalysisStatus, StoreError> {
        let id = status.id.to_string();
        let state = status.state.as_db_str();
        let results = status
            .results
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let started_at = status.started_at.map(|t| t.to_rfc3339());
        let completed_at = status.completed_at.map(|t| t.to_rfc3339());
        let updated_at = status.updated_at.to_rfc3339();

        let result = sqlx::query(
            r#"
            UPDATE analysis_status SET
                state = ?, job_handle = ?, results = ?, error = ?,
                started_at = ?, completed_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(state)
        .bind(&status.job_handle)
        .bind(&results)
        .bind(&status.error)
        .bind(&started_at)
        .bind(&completed_at)
        .bind(&updated_at)
        .bind(&id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "AnalysisStatus".to_string(),
                id,
            });
        }

        Ok(status.clone())
    }

    async fn list_for_incident(
        &self,
        incident_id: &str,
    ) -> Result<Vec<AnalysisStatus>, StoreError> {
        let rows: Vec<AnalysisStatusRow> = sqlx::query_as(
            r#"SELECT id, incident_id, organization_id, state, analysis_type, job_handle, results, error, started_at, completed_at, created_at, updated_at FROM analysis_status WHERE incident_id = ? ORDER BY created_at DESC, id DESC"#,
        )
        .bind(incident_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn latest_for_incident(
        &self,
        incident_id: &str,
    ) -> Result<Option<AnalysisStatus>, StoreError> {
        let row: Option<AnalysisStatusRow> = sqlx::query_as(
            r#"SELECT id, incident_id, organization_id, state, analysis_type, job_handle, results, error, started_at, completed_at, created_at, updated_at FROM analysis_status WHERE incident_id = ? ORDER BY created_at DESC, id DESC LIMIT 1"#,
        )
        .bind(incident_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row.try_into()?)),
            None => Ok(None),
        }
    }
}

/// Creates the SQLite-backed repository.
#[cfg(feature = "database")]
pub fn create_analysis_status_repository(
    pool: &sqlx::SqlitePool,
) -> std::sync::Arc<dyn AnalysisStatusRepository> {
    std::sync::Arc::new(SqliteAnalysisStatusRepository::new(pool.clone()))
}

// Helper struct for SQLx row mapping

#[cfg(feature = "database")]
#[derive(sqlx::FromRow)]
struct AnalysisStatusRow {
    id: String,
    incident_id: String,
    organization_id: String,
    state: String,
    analysis_type: String,
    job_handle: Option<String>,
    results: Option<String>,
    error: Option<String>,
    started_at: Option<String>,
    completed_at: Option<String>,
    created_at: String,
    updated_at: String,
}

#[cfg(feature = "database")]
impl TryFrom<AnalysisStatusRow> for AnalysisStatus {
    type Error = StoreError;

    fn try_from(row: AnalysisStatusRow) -> Result<Self, Self::Error> {
        let parse_ts = |s: &str| {
            chrono::DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&chrono::Utc))
                .map_err(|e| StoreError::Serialization(format!("invalid timestamp {s:?}: {e}")))
        };

        Ok(AnalysisStatus {
            id: uuid::Uuid::parse_str(&row.id)
                .map_err(|e| StoreError::Serialization(format!("invalid id {:?}: {e}", row.id)))?,
            incident_id: row.incident_id,
            organization_id: row.organization_id,
            state: AnalysisState::from_db_str(&row.state).ok_or_else(|| {
                StoreError::Serialization(format!("unknown analysis state {:?}", row.state))
            })?,
            analysis_type: AnalysisType::from_db_str(&row.analysis_type).ok_or_else(|| {
                StoreError::Serialization(format!(
                    "unknown analysis type {:?}",
                    row.analysis_type
                ))
            })?,
            job_handle: row.job_handle,
            results: row
                .results
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            error: row.error,
            started_at: row.started_at.as_deref().map(parse_ts).transpose()?,
            completed_at: row.completed_at.as_deref().map(parse_ts).transpose()?,
            created_at: parse_ts(&row.created_at)?,
            updated_at: parse_ts(&row.updated_at)?,
        })
    }
}
