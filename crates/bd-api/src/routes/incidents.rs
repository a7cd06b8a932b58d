//! Incident analysis, status, and obligation endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::dto::{
    AnalysisStatusResponse, CreateAnalysisRequestDto, IncidentStatusResponse,
    ObligationResponse, ObligationsResponse,
};
use crate::error::ApiError;
use crate::state::AppState;
use bd_core::analysis::AnalysisState;
use bd_core::obligation::compute_obligations;
use bd_core::orchestrator::{AnalysisPayload, CreateAnalysisRequest};
use bd_core::reconcile::derive_display_status;

use super::evidence;

/// Creates incident routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{incident_id}/analysis", post(create_analysis))
        .route("/{incident_id}/status", get(get_status))
        .route("/{incident_id}/obligations", get(get_obligations))
        .merge(evidence::routes())
}

/// Records an analysis request and dispatches it to the worker.
///
/// The incident itself is not required to exist yet; intake may still
/// be writing it. A dispatch failure is returned as the persisted
/// `failed` run rather than a transport error, so callers observe the
/// same durable state the reconciler will.
async fn create_analysis(
    State(state): State<AppState>,
    Path(incident_id): Path<String>,
    Json(body): Json<CreateAnalysisRequestDto>,
) -> Result<(StatusCode, Json<AnalysisStatusResponse>), ApiError> {
    body.validate()?;

    let request = CreateAnalysisRequest {
        incident_id,
        organization_id: body.organization_id,
        analysis_type: body.analysis_type,
        payload: AnalysisPayload {
            purview_scan_url: body.purview_scan_url,
            incident_data: body.incident_data,
        },
    };

    let status = state.orchestrator.create_and_dispatch(&request).await?;
    Ok((StatusCode::CREATED, Json(status.into())))
}

/// Returns the reconciled status for an incident.
async fn get_status(
    State(state): State<AppState>,
    Path(incident_id): Path<String>,
) -> Result<Json<IncidentStatusResponse>, ApiError> {
    let incident = state
        .incidents
        .get(&incident_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("incident {} not found", incident_id)))?;

    let latest = state.statuses.latest_for_incident(&incident_id).await?;
    let display_status = derive_display_status(&incident, latest.as_ref());

    Ok(Json(IncidentStatusResponse {
        incident_id,
        incident_status: incident.status.as_db_str().to_string(),
        display_status,
        latest_analysis: latest.map(AnalysisStatusResponse::from),
    }))
}

/// Returns the computed notification schedule for an incident.
///
/// Categories come from the latest completed analysis when one exists,
/// falling back to the phrases captured at intake. Deadlines are
/// anchored at the discovery timestamp.
async fn get_obligations(
    State(state): State<AppState>,
    Path(incident_id): Path<String>,
) -> Result<Json<ObligationsResponse>, ApiError> {
    let incident = state
        .incidents
        .get(&incident_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("incident {} not found", incident_id)))?;

    let latest = state.statuses.latest_for_incident(&incident_id).await?;
    let categories = latest
        .as_ref()
        .filter(|run| run.state == AnalysisState::Completed)
        .and_then(|run| run.results.as_ref())
        .and_then(extract_categories)
        .unwrap_or_else(|| incident.data_scope.category_phrases.clone());

    let matched = state.triggers.match_categories(&categories);
    let schedule = compute_obligations(&matched, incident.discovered_at, &incident.data_scope)?;

    Ok(Json(ObligationsResponse {
        incident_id,
        t0: incident.discovered_at,
        obligations: schedule.into_iter().map(ObligationResponse::from).collect(),
    }))
}

/// Pulls the `categories` array out of worker results.
fn extract_categories(results: &serde_json::Value) -> Option<Vec<String>> {
    let values = results.get("categories")?.as_array()?;
    Some(
        values
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_categories() {
        let results = json!({"categories": ["health", "government_identifier"], "score": 3});
        assert_eq!(
            extract_categories(&results),
            Some(vec![
                "health".to_string(),
                "government_identifier".to_string()
            ])
        );
        assert!(extract_categories(&json!({"score": 3})).is_none());
        assert!(extract_categories(&json!({"categories": "health"})).is_none());
    }
}
