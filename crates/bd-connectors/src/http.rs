//! HTTP client for the external analysis worker.
//!
//! Dispatch is a single acceptance call: one POST, a bounded wait for
//! the worker to accept the job, no retries. The worker reports results
//! later through the completion callbacks, so the timeout here covers
//! only acceptance, never the analysis itself.

use async_trait::async_trait;
use bd_core::worker::{AnalysisWorker, DispatchError, DispatchRequest, JobHandle};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_ACCEPT_TIMEOUT: Duration = Duration::from_secs(30);

/// How much of a rejection body to keep for logs and error messages.
const BODY_SNIPPET_LEN: usize = 500;

/// Worker client backed by reqwest.
///
/// The endpoint is optional so construction can happen from partial
/// configuration; `ensure_configured` surfaces the missing URL before
/// the orchestrator mutates any state.
pub struct HttpAnalysisWorker {
    client: Client,
    endpoint: Option<String>,
}

impl HttpAnalysisWorker {
    /// Creates a client for the given worker endpoint.
    pub fn new(endpoint: Option<String>) -> Result<Self, DispatchError> {
        Self::with_timeout(endpoint, DEFAULT_ACCEPT_TIMEOUT)
    }

    /// Creates a client with a custom acceptance timeout.
    pub fn with_timeout(
        endpoint: Option<String>,
        timeout: Duration,
    ) -> Result<Self, DispatchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::ConnectionFailed(e.to_string()))?;

        let endpoint = endpoint.filter(|e| !e.trim().is_empty());
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl AnalysisWorker for HttpAnalysisWorker {
    fn ensure_configured(&self) -> Result<(), DispatchError> {
        if self.endpoint.is_none() {
            return Err(DispatchError::NotConfigured);
        }
        Ok(())
    }

    async fn dispatch(&self, request: &DispatchRequest) -> Result<JobHandle, DispatchError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or(DispatchError::NotConfigured)?;

        debug!(status_id = %request.status_id, endpoint, "dispatching analysis job");

        let response = self
            .client
            .post(endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DispatchError::Timeout
                } else if e.is_connect() {
                    DispatchError::ConnectionFailed(e.to_string())
                } else {
                    DispatchError::InvalidResponse(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DispatchError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            let snippet: String = body.chars().take(BODY_SNIPPET_LEN).collect();
            warn!(status = status.as_u16(), body = %snippet, "worker rejected job");
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                body: snippet,
            });
        }

        Ok(parse_job_handle(&body, request))
    }
}

/// Extracts the worker's job id from an acceptance body.
///
/// An empty body, a non-JSON body, or a body without `jobId` all fall
/// back to the status record id; acceptance was still successful.
fn parse_job_handle(body: &str, request: &DispatchRequest) -> JobHandle {
    let job_id = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("jobId").and_then(|j| j.as_str()).map(String::from));

    match job_id {
        Some(id) if !id.is_empty() => JobHandle(id),
        _ => JobHandle::from_status_id(request.status_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn request() -> DispatchRequest {
        DispatchRequest {
            status_id: Uuid::new_v4(),
            incident_id: "inc-1".to_string(),
            organization_id: "org-1".to_string(),
            analysis_type: "combined".to_string(),
            purview_scan_url: None,
            incident_data: None,
        }
    }

    #[test]
    fn test_blank_endpoint_counts_as_unconfigured() {
        let worker = HttpAnalysisWorker::new(Some("   ".to_string())).unwrap();
        assert_eq!(
            worker.ensure_configured(),
            Err(DispatchError::NotConfigured)
        );

        let worker = HttpAnalysisWorker::new(None).unwrap();
        assert_eq!(
            worker.ensure_configured(),
            Err(DispatchError::NotConfigured)
        );

        let worker =
            HttpAnalysisWorker::new(Some("http://worker.local/jobs".to_string())).unwrap();
        assert!(worker.ensure_configured().is_ok());
    }

    #[tokio::test]
    async fn test_dispatch_without_endpoint_is_not_configured() {
        let worker = HttpAnalysisWorker::new(None).unwrap();
        assert_eq!(
            worker.dispatch(&request()).await,
            Err(DispatchError::NotConfigured)
        );
    }

    #[test]
    fn test_parse_job_handle_prefers_worker_id() {
        let req = request();
        assert_eq!(
            parse_job_handle(r#"{"jobId": "wk-99"}"#, &req).0,
            "wk-99"
        );
    }

    #[test]
    fn test_parse_job_handle_falls_back_to_status_id() {
        let req = request();
        let expected = req.status_id.to_string();
        assert_eq!(parse_job_handle("", &req).0, expected);
        assert_eq!(parse_job_handle("accepted", &req).0, expected);
        assert_eq!(parse_job_handle(r#"{"ok": true}"#, &req).0, expected);
        assert_eq!(parse_job_handle(r#"{"jobId": ""}"#, &req).0, expected);
    }
}
