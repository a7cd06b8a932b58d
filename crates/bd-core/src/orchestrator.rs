//! Analysis request orchestration.
//!
//! The orchestrator owns the write path for analysis runs: it records
//! requests, hands them to the worker, and persists the outcome. Every
//! dispatch failure is terminal for its run; a re-run is a brand new
//! request, so the stored history reads as an audit trail.

use crate::analysis::{AnalysisStateError, AnalysisStatus, AnalysisType};
use crate::store::{AnalysisStatusRepository, StoreError};
use crate::worker::{AnalysisWorker, DispatchError, DispatchRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Errors from orchestration operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("invalid analysis request: {0}")]
    Validation(String),

    #[error("analysis run not found: {id}")]
    NotFound { id: Uuid },

    /// Dispatch precondition failed before any state was written.
    #[error(transparent)]
    NotConfigured(DispatchError),

    #[error(transparent)]
    State(#[from] AnalysisStateError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Inputs for the worker that are not persisted on the status record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPayload {
    /// Signed URL of a data-governance export to scan.
    #[serde(default)]
    pub purview_scan_url: Option<String>,
    /// Structured intake data for the worker.
    #[serde(default)]
    pub incident_data: Option<serde_json::Value>,
}

/// A request to analyze an incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnalysisRequest {
    pub incident_id: String,
    pub organization_id: String,
    pub analysis_type: AnalysisType,
    #[serde(default)]
    pub payload: AnalysisPayload,
}

/// Drives analysis runs from request to terminal state.
pub struct AnalysisOrchestrator {
    statuses: Arc<dyn AnalysisStatusRepository>,
    worker: Arc<dyn AnalysisWorker>,
}

impl AnalysisOrchestrator {
    pub fn new(
        statuses: Arc<dyn AnalysisStatusRepository>,
        worker: Arc<dyn AnalysisWorker>,
    ) -> Self {
        Self { statuses, worker }
    }

    /// Records a new analysis request in `pending` state.
    ///
    /// The incident is deliberately not checked for existence: intake
    /// may still be writing it when the request arrives, and a run
    /// against an id that never materializes is harmless.
    #[instrument(skip(self, request), fields(incident_id = %request.incident_id))]
    pub async fn create_request(
        &self,
        request: &CreateAnalysisRequest,
    ) -> Result<AnalysisStatus, OrchestratorError> {
        if request.incident_id.trim().is_empty() {
            return Err(OrchestratorError::Validation(
                "incident id must not be empty".to_string(),
            ));
        }
        if request.organization_id.trim().is_empty() {
            return Err(OrchestratorError::Validation(
                "organization id must not be empty".to_string(),
            ));
        }

        let status = AnalysisStatus::new(
            &request.incident_id,
            &request.organization_id,
            request.analysis_type,
        );
        let stored = self.statuses.insert(&status).await?;
        info!(status_id = %stored.id, "analysis request recorded");
        Ok(stored)
    }

    /// Hands a pending run to the worker.
    ///
    /// Configuration is checked before any state mutation, so a missing
    /// worker URL surfaces as an error without burning the run. Any
    /// failure after the run is marked `analyzing` terminalizes it to
    /// `failed`; the persisted failed record is returned, not an error,
    /// so callers observe the same durable state the reconciler will.
    #[instrument(skip(self, payload))]
    pub async fn dispatch(
        &self,
        status_id: Uuid,
        payload: &AnalysisPayload,
    ) -> Result<AnalysisStatus, OrchestratorError> {
        self.worker
            .ensure_configured()
            .map_err(OrchestratorError::NotConfigured)?;

        let mut status = self
            .statuses
            .get(status_id)
            .await?
            .ok_or(OrchestratorError::NotFound { id: status_id })?;

        status.begin()?;
        self.statuses.update(&status).await?;

        let request = DispatchRequest {
            status_id: status.id,
            incident_id: status.incident_id.clone(),
            organization_id: status.organization_id.clone(),
            analysis_type: status.analysis_type.to_string(),
            purview_scan_url: payload.purview_scan_url.clone(),
            incident_data: payload.incident_data.clone(),
        };

        match self.worker.dispatch(&request).await {
            Ok(handle) => {
                status.job_handle = Some(handle.to_string());
                status.updated_at = chrono::Utc::now();
                let stored = self.statuses.update(&status).await?;
                info!(status_id = %stored.id, job_handle = %handle, "analysis dispatched");
                Ok(stored)
            }
            Err(e) => {
                warn!(status_id = %status.id, error = %e, "dispatch failed, marking run failed");
                status.fail(&e.to_string())?;
                let stored = self.statuses.update(&status).await?;
                Ok(stored)
            }
        }
    }

    /// Records a request and immediately dispatches it.
    pub async fn create_and_dispatch(
        &self,
        request: &CreateAnalysisRequest,
    ) -> Result<AnalysisStatus, OrchestratorError> {
        let status = self.create_request(request).await?;
        self.dispatch(status.id, &request.payload).await
    }

    /// Applies a worker completion callback.
    #[instrument(skip(self, results))]
    pub async fn record_completion(
        &self,
        status_id: Uuid,
        results: serde_json::Value,
    ) -> Result<AnalysisStatus, OrchestratorError> {
        let mut status = self
            .statuses
            .get(status_id)
            .await?
            .ok_or(OrchestratorError::NotFound { id: status_id })?;
        status.complete(results)?;
        let stored = self.statuses.update(&status).await?;
        info!(status_id = %stored.id, "analysis completed");
        Ok(stored)
    }

    /// Applies a worker failure callback.
    #[instrument(skip(self))]
    pub async fn record_failure(
        &self,
        status_id: Uuid,
        message: &str,
    ) -> Result<AnalysisStatus, OrchestratorError> {
        let mut status = self
            .statuses
            .get(status_id)
            .await?
            .ok_or(OrchestratorError::NotFound { id: status_id })?;
        status.fail(message)?;
        let stored = self.statuses.update(&status).await?;
        warn!(status_id = %stored.id, message, "analysis failed");
        Ok(stored)
    }

    /// The run history for an incident, newest first.
    pub async fn runs_for_incident(
        &self,
        incident_id: &str,
    ) -> Result<Vec<AnalysisStatus>, OrchestratorError> {
        Ok(self.statuses.list_for_incident(incident_id).await?)
    }

    /// The newest run for an incident, if any.
    pub async fn latest_for_incident(
        &self,
        incident_id: &str,
    ) -> Result<Option<AnalysisStatus>, OrchestratorError> {
        Ok(self.statuses.latest_for_incident(incident_id).await?)
    }
}
