//! Mock analysis worker for testing.

use async_trait::async_trait;
use bd_core::worker::{AnalysisWorker, DispatchError, DispatchRequest, JobHandle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Worker whose dispatch outcome is scripted at construction.
///
/// Counts dispatch calls and captures the last request so tests can
/// assert on the wire payload without a network stack.
pub struct MockAnalysisWorker {
    outcome: Result<JobHandle, DispatchError>,
    configured: bool,
    dispatch_count: AtomicU64,
    last_request: Mutex<Option<DispatchRequest>>,
}

impl MockAnalysisWorker {
    /// Worker that accepts every job with the given handle.
    pub fn accepting(handle: &str) -> Self {
        Self {
            outcome: Ok(JobHandle(handle.to_string())),
            configured: true,
            dispatch_count: AtomicU64::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Worker that fails every dispatch with the given error.
    pub fn failing(error: DispatchError) -> Self {
        Self {
            outcome: Err(error),
            configured: true,
            dispatch_count: AtomicU64::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Worker with no endpoint configured.
    pub fn unconfigured() -> Self {
        Self {
            outcome: Err(DispatchError::NotConfigured),
            configured: false,
            dispatch_count: AtomicU64::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn dispatch_count(&self) -> u64 {
        self.dispatch_count.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<DispatchRequest> {
        self.last_request.lock().ok().and_then(|g| g.clone())
    }
}

#[async_trait]
impl AnalysisWorker for MockAnalysisWorker {
    fn ensure_configured(&self) -> Result<(), DispatchError> {
        if self.configured {
            Ok(())
        } else {
            Err(DispatchError::NotConfigured)
        }
    }

    async fn dispatch(&self, request: &DispatchRequest) -> Result<JobHandle, DispatchError> {
        self.dispatch_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_request.lock() {
            *guard = Some(request.clone());
        }
        self.outcome.clone()
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
            analysis_type: "incident_data".to_string(),
            purview_scan_url: None,
            incident_data: None,
        }
    }

    #[tokio::test]
    async fn test_mock_counts_and_captures() {
        let worker = MockAnalysisWorker::accepting("job-7");
        let req = request();
        let handle = worker.dispatch(&req).await.unwrap();
        assert_eq!(handle.0, "job-7");
        assert_eq!(worker.dispatch_count(), 1);
        assert_eq!(worker.last_request().unwrap().incident_id, "inc-1");
    }

    #[tokio::test]
    async fn test_mock_scripted_failure() {
        let worker = MockAnalysisWorker::failing(DispatchError::Timeout);
        assert_eq!(
            worker.dispatch(&request()).await,
            Err(DispatchError::Timeout)
        );
    }
}
