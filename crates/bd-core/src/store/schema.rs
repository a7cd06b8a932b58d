//! Database schema.

use super::{DbPool, StoreError};
use tracing::info;

/// SQL to create the incidents table.
///
/// `data_scope` and `evidence` are serialized JSON; the status column
/// stores the snake_case string form so legacy `completed` rows remain
/// readable.
const CREATE_INCIDENTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS incidents (
        id TEXT PRIMARY KEY,
        organization_id TEXT NOT NULL,
        status TEXT NOT NULL,
        discovered_at TEXT NOT NULL,
        data_scope TEXT NOT NULL DEFAULT '{}',
        evidence TEXT NOT NULL DEFAULT '[]',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_incidents_organization_id
        ON incidents(organization_id);
    CREATE INDEX IF NOT EXISTS idx_incidents_status ON incidents(status);
"#;

/// SQL to create the analysis_status table. Rows are append-only across
/// runs; there is no foreign key to incidents because requests may
/// precede the incident write.
const CREATE_ANALYSIS_STATUS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS analysis_status (
        id TEXT PRIMARY KEY,
        incident_id TEXT NOT NULL,
        organization_id TEXT NOT NULL,
        state TEXT NOT NULL,
        analysis_type TEXT NOT NULL,
        job_handle TEXT,
        results TEXT,
        error TEXT,
        started_at TEXT,
        completed_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_analysis_status_incident_id
        ON analysis_status(incident_id);
    CREATE INDEX IF NOT EXISTS idx_analysis_status_created_at
        ON analysis_status(created_at);
"#;

/// Creates all tables and indexes if they do not exist.
pub async fn run_migrations(pool: &DbPool) -> Result<(), StoreError> {
    info!("running SQLite migrations");
    for ddl in [CREATE_INCIDENTS_TABLE, CREATE_ANALYSIS_STATUS_TABLE] {
        for statement in ddl.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(pool).await?;
        }
    }
    info!("migrations completed");
    Ok(())
}
