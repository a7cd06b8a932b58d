//! Application state shared across handlers.

use bd_core::orchestrator::AnalysisOrchestrator;
use bd_core::store::{AnalysisStatusRepository, IncidentRepository};
use bd_core::taxonomy::TriggerStore;
use bd_core::EvidenceManager;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Analysis run store, shared with the orchestrator.
    pub statuses: Arc<dyn AnalysisStatusRepository>,
    /// Incident store (externally written; read + evidence linkage).
    pub incidents: Arc<dyn IncidentRepository>,
    /// Orchestrator driving analysis runs.
    pub orchestrator: Arc<AnalysisOrchestrator>,
    /// Evidence upload/delete manager.
    pub evidence: Arc<EvidenceManager>,
    /// Taxonomy and notification trigger reference data.
    pub triggers: Arc<TriggerStore>,
}
