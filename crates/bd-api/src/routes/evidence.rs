//! Evidence upload and deletion endpoints.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use validator::Validate;

use crate::dto::{DeleteEvidenceRequest, EvidenceDeleteResponse, EvidenceUploadResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// Creates evidence routes, nested under `/incidents`.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/{incident_id}/evidence",
        post(upload_evidence).delete(delete_evidence),
    )
}

/// Uploads an evidence file for an incident.
///
/// Multipart fields: `file` (required), `organizationId` (required,
/// the incident may not exist yet so the owner cannot be looked up),
/// `uploadedBy` (optional). The `draft` incident id uploads the blob
/// without linking it to any incident.
async fn upload_evidence(
    State(state): State<AppState>,
    Path(incident_id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<EvidenceUploadResponse>), ApiError> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut organization_id: Option<String> = None;
    let mut uploaded_by = "unknown".to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let mime_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("unreadable file field: {e}")))?;
                file = Some((file_name, mime_type, bytes.to_vec()));
            }
            Some("organizationId") => {
                organization_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.to_string()))?,
                );
            }
            Some("uploadedBy") => {
                uploaded_by = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            }
            _ => {}
        }
    }

    let (file_name, mime_type, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("missing 'file' field".to_string()))?;
    let organization_id = organization_id
        .filter(|o| !o.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing 'organizationId' field".to_string()))?;

    let item = state
        .evidence
        .upload(
            &organization_id,
            &incident_id,
            &file_name,
            &mime_type,
            &bytes,
            &uploaded_by,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(EvidenceUploadResponse {
            success: true,
            scan: item.into(),
        }),
    ))
}

/// Removes an evidence file from an incident.
///
/// Blob removal is advisory; the response records whether the blob
/// itself was deleted.
async fn delete_evidence(
    State(state): State<AppState>,
    Path(incident_id): Path<String>,
    Json(body): Json<DeleteEvidenceRequest>,
) -> Result<Json<EvidenceDeleteResponse>, ApiError> {
    body.validate()?;

    let blob_removed = state.evidence.delete(&incident_id, &body.file_path).await?;
    Ok(Json(EvidenceDeleteResponse {
        success: true,
        blob_removed,
    }))
}
