//! Incident data models for BreachDesk.
//!
//! This module defines the incident record as written by the intake
//! workflow. The record is owned by intake; this core reads it for
//! reconciliation, obligation computation, and evidence linkage. The
//! one field this core writes is the evidence list.

use crate::evidence::EvidenceItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reported security incident as persisted by the intake workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// Document-store identifier assigned by intake.
    pub id: String,
    /// Organization that reported the incident.
    pub organization_id: String,
    /// Declared lifecycle status, written by the intake workflow.
    pub status: IncidentStatus,
    /// When the breach was discovered (T0). All notification deadlines
    /// are anchored to this timestamp.
    pub discovered_at: DateTime<Utc>,
    /// Scope of the data involved in the incident.
    pub data_scope: DataScope,
    /// Evidence artifacts attached to this incident.
    pub evidence: Vec<EvidenceItem>,
    /// Timestamp when the record was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last update.
    pub updated_at: DateTime<Utc>,
}

impl IncidentRecord {
    /// Creates a new incident record in `draft` status.
    pub fn new(id: &str, organization_id: &str, discovered_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            organization_id: organization_id.to_string(),
            status: IncidentStatus::Draft,
            discovered_at,
            data_scope: DataScope::default(),
            evidence: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Derives a severity level from the estimated scope of the breach.
    pub fn severity(&self) -> Severity {
        self.data_scope.estimated_records_affected.severity()
    }
}

/// Status of an incident as declared by the intake workflow.
///
/// Transitions are monotonic except `cancelled`, which is terminal from
/// any state. Stored values this core does not recognize deserialize to
/// `Unknown` rather than failing the read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    /// Created by the intake wizard, not yet submitted.
    Draft,
    /// Submitted and under preparation.
    InProgress,
    /// A breach simulation/analysis run has been started.
    SimulationInitialized,
    /// The simulation/analysis run has finished.
    ///
    /// `completed` is accepted as a legacy alias for records written
    /// before the status was renamed.
    #[serde(alias = "completed")]
    SimulationCompleted,
    /// Terminal: the incident was withdrawn.
    Cancelled,
    /// Unrecognized stored value.
    #[serde(other)]
    Unknown,
}

impl IncidentStatus {
    /// Returns the database-compatible string representation (snake_case).
    pub fn as_db_str(&self) -> &'static str {
        match self {
            IncidentStatus::Draft => "draft",
            IncidentStatus::InProgress => "in_progress",
            IncidentStatus::SimulationInitialized => "simulation_initialized",
            IncidentStatus::SimulationCompleted => "simulation_completed",
            IncidentStatus::Cancelled => "cancelled",
            IncidentStatus::Unknown => "unknown",
        }
    }

    /// Parses an incident status from a stored string.
    ///
    /// Unrecognized values map to `Unknown`; the intake store is the
    /// writer and may be ahead of this reader.
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "draft" => IncidentStatus::Draft,
            "in_progress" => IncidentStatus::InProgress,
            "simulation_initialized" => IncidentStatus::SimulationInitialized,
            "simulation_completed" | "completed" => IncidentStatus::SimulationCompleted,
            "cancelled" => IncidentStatus::Cancelled,
            _ => IncidentStatus::Unknown,
        }
    }
}

impl std::fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncidentStatus::Draft => write!(f, "Draft"),
            IncidentStatus::InProgress => write!(f, "In Progress"),
            IncidentStatus::SimulationInitialized => write!(f, "Simulation Initialized"),
            IncidentStatus::SimulationCompleted => write!(f, "Simulation Completed"),
            IncidentStatus::Cancelled => write!(f, "Cancelled"),
            IncidentStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Scope of the data involved in an incident, as estimated at intake.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataScope {
    /// Bucketed estimate of the number of records affected.
    pub estimated_records_affected: RecordsBucket,
    /// Canonical taxonomy category phrases identified so far.
    pub category_phrases: Vec<String>,
    /// Whether affected individuals span multiple jurisdictions.
    pub cross_border: bool,
}

/// Bucketed estimate of affected record counts.
///
/// Intake collects a bucket rather than an exact count; obligation
/// thresholds evaluate against the bucket's upper bound so that an
/// uncertain estimate errs toward notification.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordsBucket {
    /// No estimate provided yet.
    #[default]
    Unknown,
    /// Fewer than 100 records.
    UpTo100,
    /// 100 to 10,000 records.
    UpTo10K,
    /// 10,000 to 100,000 records.
    UpTo100K,
    /// More than 100,000 records.
    Over100K,
}

impl RecordsBucket {
    /// Upper bound of the bucket, used for threshold conditions.
    pub fn upper_bound(&self) -> u64 {
        match self {
            RecordsBucket::Unknown => 0,
            RecordsBucket::UpTo100 => 100,
            RecordsBucket::UpTo10K => 10_000,
            RecordsBucket::UpTo100K => 100_000,
            RecordsBucket::Over100K => u64::MAX,
        }
    }

    /// Severity derived from the bucket.
    pub fn severity(&self) -> Severity {
        match self {
            RecordsBucket::Unknown => Severity::Info,
            RecordsBucket::UpTo100 => Severity::Low,
            RecordsBucket::UpTo10K => Severity::Medium,
            RecordsBucket::UpTo100K => Severity::High,
            RecordsBucket::Over100K => Severity::Critical,
        }
    }
}

/// Severity levels for incidents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational - scope not yet estimated
    Info,
    /// Low severity
    Low,
    /// Medium severity
    Medium,
    /// High severity - requires attention
    High,
    /// Critical - immediate response required
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "Info"),
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}
