//! Analysis run endpoints: reads and worker callbacks.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::{AnalysisStatusResponse, CompleteAnalysisRequest, FailAnalysisRequest};
use crate::error::ApiError;
use crate::state::AppState;

/// Creates analysis routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{status_id}", get(get_analysis))
        .route("/{status_id}/complete", post(complete_analysis))
        .route("/{status_id}/fail", post(fail_analysis))
}

/// Returns one analysis run.
async fn get_analysis(
    State(state): State<AppState>,
    Path(status_id): Path<Uuid>,
) -> Result<Json<AnalysisStatusResponse>, ApiError> {
    let status = state
        .statuses
        .get(status_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("analysis run {} not found", status_id)))?;
    Ok(Json(status.into()))
}

/// Worker callback: the analysis finished successfully.
async fn complete_analysis(
    State(state): State<AppState>,
    Path(status_id): Path<Uuid>,
    Json(body): Json<CompleteAnalysisRequest>,
) -> Result<Json<AnalysisStatusResponse>, ApiError> {
    let status = state
        .orchestrator
        .record_completion(status_id, body.results)
        .await?;
    Ok(Json(status.into()))
}

/// Worker callback: the analysis failed.
async fn fail_analysis(
    State(state): State<AppState>,
    Path(status_id): Path<Uuid>,
    Json(body): Json<FailAnalysisRequest>,
) -> Result<Json<AnalysisStatusResponse>, ApiError> {
    body.validate()?;
    let status = state
        .orchestrator
        .record_failure(status_id, &body.error)
        .await?;
    Ok(Json(status.into()))
}
