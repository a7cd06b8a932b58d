//! # bd-core
//!
//! Core orchestration and data models for BreachDesk.
//!
//! This crate provides the incident and analysis data models, the
//! status reconciler that merges two independently-written lifecycle
//! records into one displayed state, the regulatory obligation engine,
//! the evidence attachment manager, and the analysis request
//! orchestrator that drives the external analysis worker.

pub mod analysis;
pub mod blob;
pub mod evidence;
pub mod incident;
pub mod obligation;
pub mod orchestrator;
pub mod reconcile;
pub mod store;
pub mod taxonomy;
pub mod worker;

pub use analysis::{AnalysisState, AnalysisStateError, AnalysisStatus, AnalysisType};
pub use evidence::{EvidenceConfig, EvidenceItem, EvidenceManager, DRAFT_INCIDENT_ID};
pub use incident::{DataScope, IncidentRecord, IncidentStatus, RecordsBucket, Severity};
pub use obligation::{compute_obligations, Audience, NotificationObligation, ObligationError};
pub use orchestrator::{AnalysisOrchestrator, AnalysisPayload, CreateAnalysisRequest};
pub use reconcile::{derive_display_status, latest_analysis, DisplayStatus};
pub use taxonomy::{BreachTaxonomyItem, BreachTrigger, TriggerObligation, TriggerStore};
pub use worker::{AnalysisWorker, DispatchError, DispatchRequest, JobHandle};
