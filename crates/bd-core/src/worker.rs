//! Dispatch contract with the external analysis worker.
//!
//! The worker is an external service reached over HTTP; this module
//! holds only the trait and wire types so orchestration logic can be
//! tested against mocks without a network stack.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while handing a job to the worker.
///
/// All variants are terminal for the run; there is no retry tier. A
/// failed dispatch is recorded and any re-run is a fresh request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// No worker endpoint configured. Raised before any state mutation.
    #[error("analysis worker URL is not configured")]
    NotConfigured,

    #[error("could not connect to the analysis worker: {0}")]
    ConnectionFailed(String),

    #[error("analysis worker did not accept the job within the timeout")]
    Timeout,

    /// Non-success acceptance response. `body` is truncated for logs.
    #[error("analysis worker rejected the job with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("analysis worker returned an unreadable response: {0}")]
    InvalidResponse(String),
}

/// Job payload sent to the worker. Field names follow the worker's
/// camelCase wire contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    /// Analysis status record the worker reports back against.
    pub status_id: Uuid,
    pub incident_id: String,
    pub organization_id: String,
    pub analysis_type: String,
    /// Signed URL of the data-governance export to scan, when the run
    /// includes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purview_scan_url: Option<String>,
    /// Structured intake data, when the run includes it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_data: Option<serde_json::Value>,
}

/// Worker-assigned identifier for an accepted job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobHandle(pub String);

impl JobHandle {
    /// Fallback handle when the worker's acceptance response carries no
    /// job id: the status record id stands in.
    pub fn from_status_id(status_id: Uuid) -> Self {
        JobHandle(status_id.to_string())
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client for the external analysis worker.
#[async_trait]
pub trait AnalysisWorker: Send + Sync {
    /// Checks the client is usable before any status mutation happens.
    /// The default assumes static configuration that cannot be missing.
    fn ensure_configured(&self) -> Result<(), DispatchError> {
        Ok(())
    }

    /// Hands a job to the worker and waits only for acceptance, not for
    /// the analysis itself.
    async fn dispatch(&self, request: &DispatchRequest) -> Result<JobHandle, DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_request_wire_shape_is_camel_case() {
        let req = DispatchRequest {
            status_id: Uuid::nil(),
            incident_id: "inc-1".to_string(),
            organization_id: "org-1".to_string(),
            analysis_type: "combined".to_string(),
            purview_scan_url: Some("https://example.com/export".to_string()),
            incident_data: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("statusId").is_some());
        assert!(json.get("incidentId").is_some());
        assert!(json.get("purviewScanUrl").is_some());
        // Absent optionals are omitted, not null.
        assert!(json.get("incidentData").is_none());
    }

    #[test]
    fn test_fallback_handle_is_status_id() {
        let id = Uuid::new_v4();
        assert_eq!(JobHandle::from_status_id(id).0, id.to_string());
    }
}
