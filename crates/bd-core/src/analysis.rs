//! Analysis run records and their lifecycle.
//!
//! Every analysis request produces a new [`AnalysisStatus`] row; rows are
//! append-only and never reused across re-runs. The state machine is
//! `pending -> analyzing -> {completed | failed}`, with `failed` also
//! reachable directly from `pending` (dispatch can fail before the worker
//! accepts). Terminal states admit no further transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors from invalid analysis state transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisStateError {
    #[error("invalid analysis transition from {from} to {to}")]
    InvalidTransition {
        from: AnalysisState,
        to: AnalysisState,
    },
}

/// Lifecycle state of an analysis run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisState {
    /// Recorded, not yet handed to the worker.
    Pending,
    /// Handed to the worker; awaiting a completion callback.
    Analyzing,
    /// Worker reported success. Terminal.
    Completed,
    /// Dispatch or the worker reported failure. Terminal.
    Failed,
}

impl AnalysisState {
    /// Returns the database-compatible string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            AnalysisState::Pending => "pending",
            AnalysisState::Analyzing => "analyzing",
            AnalysisState::Completed => "completed",
            AnalysisState::Failed => "failed",
        }
    }

    /// Parses a state from a stored string.
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AnalysisState::Pending),
            "analyzing" => Some(AnalysisState::Analyzing),
            "completed" => Some(AnalysisState::Completed),
            "failed" => Some(AnalysisState::Failed),
            _ => None,
        }
    }

    /// Whether this state admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisState::Completed | AnalysisState::Failed)
    }
}

impl std::fmt::Display for AnalysisState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db_str())
    }
}

/// Kind of analysis requested.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    /// Scan of a data-governance export for sensitive categories.
    PurviewScan,
    /// Analysis of structured incident intake data.
    IncidentData,
    /// Both inputs combined in one run.
    Combined,
}

impl AnalysisType {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            AnalysisType::PurviewScan => "purview_scan",
            AnalysisType::IncidentData => "incident_data",
            AnalysisType::Combined => "combined",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "purview_scan" => Some(AnalysisType::PurviewScan),
            "incident_data" => Some(AnalysisType::IncidentData),
            "combined" => Some(AnalysisType::Combined),
            _ => None,
        }
    }
}

impl std::fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db_str())
    }
}

/// One analysis run for an incident.
///
/// The referenced incident is not required to exist; requests may be
/// recorded ahead of intake finishing its write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisStatus {
    /// Unique identifier for this run.
    pub id: Uuid,
    /// Incident this run belongs to (not validated against the incident
    /// store).
    pub incident_id: String,
    /// Organization that owns the incident.
    pub organization_id: String,
    /// Current lifecycle state.
    pub state: AnalysisState,
    /// Kind of analysis requested.
    pub analysis_type: AnalysisType,
    /// Worker-assigned job identifier, recorded once dispatch is
    /// accepted. Falls back to this record's id when the worker returns
    /// none.
    pub job_handle: Option<String>,
    /// Worker-reported results, present once completed.
    pub results: Option<serde_json::Value>,
    /// Failure message, present once failed.
    pub error: Option<String>,
    /// When dispatch began.
    pub started_at: Option<DateTime<Utc>>,
    /// When the run reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AnalysisStatus {
    /// Creates a new run in `pending` state.
    pub fn new(incident_id: &str, organization_id: &str, analysis_type: AnalysisType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            incident_id: incident_id.to_string(),
            organization_id: organization_id.to_string(),
            state: AnalysisState::Pending,
            analysis_type,
            job_handle: None,
            results: None,
            error: None,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transitions `pending -> analyzing`, recording the start time.
    pub fn begin(&mut self) -> Result<(), AnalysisStateError> {
        if self.state != AnalysisState::Pending {
            return Err(AnalysisStateError::InvalidTransition {
                from: self.state,
                to: AnalysisState::Analyzing,
            });
        }
        self.state = AnalysisState::Analyzing;
        let now = Utc::now();
        self.started_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Transitions `analyzing -> completed`, storing worker results.
    pub fn complete(&mut self, results: serde_json::Value) -> Result<(), AnalysisStateError> {
        if self.state != AnalysisState::Analyzing {
            return Err(AnalysisStateError::InvalidTransition {
                from: self.state,
                to: AnalysisState::Completed,
            });
        }
        self.state = AnalysisState::Completed;
        self.results = Some(results);
        let now = Utc::now();
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Transitions to `failed` with a message.
    ///
    /// Reachable from `pending` (dispatch failed before the worker
    /// accepted) and from `analyzing` (the worker reported failure).
    pub fn fail(&mut self, message: &str) -> Result<(), AnalysisStateError> {
        if self.state.is_terminal() {
            return Err(AnalysisStateError::InvalidTransition {
                from: self.state,
                to: AnalysisState::Failed,
            });
        }
        self.state = AnalysisState::Failed;
        self.error = Some(message.to_string());
        let now = Utc::now();
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pending() -> AnalysisStatus {
        AnalysisStatus::new("inc-1", "org-1", AnalysisType::Combined)
    }

    #[test]
    fn test_new_run_is_pending() {
        let run = pending();
        assert_eq!(run.state, AnalysisState::Pending);
        assert!(run.job_handle.is_none());
        assert!(run.started_at.is_none());
        assert!(!run.is_terminal());
    }

    #[test]
    fn test_full_success_lifecycle() {
        let mut run = pending();
        run.begin().unwrap();
        assert_eq!(run.state, AnalysisState::Analyzing);
        assert!(run.started_at.is_some());

        run.complete(json!({"categories": ["ssn"]})).unwrap();
        assert_eq!(run.state, AnalysisState::Completed);
        assert!(run.completed_at.is_some());
        assert!(run.is_terminal());
    }

    #[test]
    fn test_fail_from_pending_and_analyzing() {
        let mut run = pending();
        run.fail("worker url missing at dispatch").unwrap();
        assert_eq!(run.state, AnalysisState::Failed);

        let mut run = pending();
        run.begin().unwrap();
        run.fail("worker rejected job").unwrap();
        assert_eq!(run.state, AnalysisState::Failed);
        assert_eq!(run.error.as_deref(), Some("worker rejected job"));
    }

    #[test]
    fn test_terminal_states_reject_transitions() {
        let mut run = pending();
        run.begin().unwrap();
        run.complete(json!({})).unwrap();

        assert!(run.fail("too late").is_err());
        assert!(run.begin().is_err());
        assert!(run.complete(json!({})).is_err());

        let mut run = pending();
        run.fail("boom").unwrap();
        assert_eq!(
            run.begin(),
            Err(AnalysisStateError::InvalidTransition {
                from: AnalysisState::Failed,
                to: AnalysisState::Analyzing,
            })
        );
    }

    #[test]
    fn test_state_db_round_trip() {
        for state in [
            AnalysisState::Pending,
            AnalysisState::Analyzing,
            AnalysisState::Completed,
            AnalysisState::Failed,
        ] {
            assert_eq!(AnalysisState::from_db_str(state.as_db_str()), Some(state));
        }
        assert_eq!(AnalysisState::from_db_str("bogus"), None);
    }
}
