//! Data Transfer Objects (DTOs) for API requests and responses.
//!
//! The wire contract is camelCase JSON throughout; enum values keep
//! their snake_case forms.

use bd_core::analysis::{AnalysisState, AnalysisStatus, AnalysisType};
use bd_core::evidence::EvidenceItem;
use bd_core::obligation::{Audience, NotificationObligation};
use bd_core::reconcile::DisplayStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// ============================================================================
// Analysis DTOs
// ============================================================================

/// Request to start an analysis run for an incident.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnalysisRequestDto {
    #[validate(length(min = 1, message = "organization id is required"))]
    pub organization_id: String,
    pub analysis_type: AnalysisType,
    /// Signed URL of a data-governance export to scan.
    #[serde(default)]
    pub purview_scan_url: Option<String>,
    /// Structured intake data for the worker.
    #[serde(default)]
    pub incident_data: Option<serde_json::Value>,
}

/// One analysis run in responses.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStatusResponse {
    pub id: Uuid,
    pub incident_id: String,
    pub organization_id: String,
    pub state: AnalysisState,
    pub analysis_type: AnalysisType,
    pub job_handle: Option<String>,
    pub results: Option<serde_json::Value>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AnalysisStatus> for AnalysisStatusResponse {
    fn from(status: AnalysisStatus) -> Self {
        Self {
            id: status.id,
            incident_id: status.incident_id,
            organization_id: status.organization_id,
            state: status.state,
            analysis_type: status.analysis_type,
            job_handle: status.job_handle,
            results: status.results,
            error: status.error,
            started_at: status.started_at,
            completed_at: status.completed_at,
            created_at: status.created_at,
            updated_at: status.updated_at,
        }
    }
}

/// Worker callback reporting successful completion.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteAnalysisRequest {
    pub results: serde_json::Value,
}

/// Worker callback reporting failure.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FailAnalysisRequest {
    #[validate(length(min = 1, message = "a failure message is required"))]
    pub error: String,
}

// ============================================================================
// Incident status DTOs
// ============================================================================

/// Reconciled status view of an incident.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentStatusResponse {
    pub incident_id: String,
    /// Status as declared by the intake workflow.
    pub incident_status: String,
    /// The single merged status the UI should display.
    pub display_status: DisplayStatus,
    /// The analysis run that informed the merge, if any.
    pub latest_analysis: Option<AnalysisStatusResponse>,
}

// ============================================================================
// Obligation DTOs
// ============================================================================

/// One notification deadline in responses.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObligationResponse {
    pub audience: Audience,
    pub jurisdiction_code: String,
    pub due_at: DateTime<Utc>,
    pub conditions_satisfied: bool,
    pub source_trigger_id: String,
    pub citation: Option<String>,
    pub review_notes: Vec<String>,
}

impl From<NotificationObligation> for ObligationResponse {
    fn from(o: NotificationObligation) -> Self {
        Self {
            audience: o.audience,
            jurisdiction_code: o.jurisdiction_code,
            due_at: o.due_at,
            conditions_satisfied: o.conditions_satisfied,
            source_trigger_id: o.source_trigger_id,
            citation: o.citation,
            review_notes: o.review_notes,
        }
    }
}

/// The computed notification schedule for an incident.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObligationsResponse {
    pub incident_id: String,
    /// Discovery timestamp the deadlines are anchored to.
    pub t0: DateTime<Utc>,
    pub obligations: Vec<ObligationResponse>,
}

// ============================================================================
// Evidence DTOs
// ============================================================================

/// One evidence item in responses.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceItemDto {
    pub file_name: String,
    pub file_path: String,
    pub file_url: String,
    pub file_size: u64,
    pub mime_type: String,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<EvidenceItem> for EvidenceItemDto {
    fn from(item: EvidenceItem) -> Self {
        Self {
            file_name: item.file_name,
            file_path: item.file_path,
            file_url: item.file_url,
            file_size: item.file_size,
            mime_type: item.mime_type,
            uploaded_by: item.uploaded_by,
            uploaded_at: item.uploaded_at,
        }
    }
}

/// Response for a successful evidence upload.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceUploadResponse {
    pub success: bool,
    pub scan: EvidenceItemDto,
}

/// Request to remove an evidence file.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEvidenceRequest {
    #[validate(length(min = 1, message = "file path is required"))]
    pub file_path: String,
}

/// Response for an evidence deletion.
///
/// `blob_removed` is advisory: the linkage is always gone, but the blob
/// may have been left behind.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceDeleteResponse {
    pub success: bool,
    pub blob_removed: bool,
}

// ============================================================================
// Health DTOs
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
