//! Status reconciliation.
//!
//! The incident status and the analysis status are written by two
//! independent services with no transactional coordination, so either
//! record can lag the other. Reconciliation is a pure read-time merge:
//! it never writes back, so a stale input can never corrupt stored
//! state.

use crate::analysis::{AnalysisState, AnalysisStatus};
use crate::incident::{IncidentRecord, IncidentStatus};
use serde::{Deserialize, Serialize};

/// The single displayed status derived from both lifecycle records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    Draft,
    InProgress,
    SimulationInitialized,
    SimulationCompleted,
    Cancelled,
    Unknown,
}

impl std::fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DisplayStatus::Draft => "draft",
            DisplayStatus::InProgress => "in_progress",
            DisplayStatus::SimulationInitialized => "simulation_initialized",
            DisplayStatus::SimulationCompleted => "simulation_completed",
            DisplayStatus::Cancelled => "cancelled",
            DisplayStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Selects the most recent analysis run from a set.
///
/// "Most recent" is `created_at` descending with id descending as the
/// tie-break, so the selection is total and deterministic even when two
/// runs share a timestamp.
pub fn latest_analysis(runs: &[AnalysisStatus]) -> Option<&AnalysisStatus> {
    runs.iter()
        .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
}

/// Merges the declared incident status with the latest analysis run.
///
/// Rules, in priority order:
/// 1. A completed analysis wins over whatever the incident declares.
/// 2. A run still analyzing keeps a `simulation_initialized` incident in
///    that state (the incident side may already be stale).
/// 3. Otherwise the declared incident status is authoritative; failed,
///    pending, or absent runs never mask it.
pub fn derive_display_status(
    incident: &IncidentRecord,
    latest: Option<&AnalysisStatus>,
) -> DisplayStatus {
    if let Some(run) = latest {
        if run.state == AnalysisState::Completed {
            return DisplayStatus::SimulationCompleted;
        }
        if run.state == AnalysisState::Analyzing
            && incident.status == IncidentStatus::SimulationInitialized
        {
            return DisplayStatus::SimulationInitialized;
        }
    }
    match incident.status {
        IncidentStatus::Draft => DisplayStatus::Draft,
        IncidentStatus::InProgress => DisplayStatus::InProgress,
        IncidentStatus::SimulationInitialized => DisplayStatus::SimulationInitialized,
        IncidentStatus::SimulationCompleted => DisplayStatus::SimulationCompleted,
        IncidentStatus::Cancelled => DisplayStatus::Cancelled,
        IncidentStatus::Unknown => DisplayStatus::Unknown,
    }
}
