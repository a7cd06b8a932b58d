//! Mock repository implementations for testing.
//!
//! These provide in-memory implementations of the repository traits so
//! orchestration and API logic can be tested without a database.

mod analysis_repo;
mod incident_repo;

pub use analysis_repo::MockAnalysisStatusRepository;
pub use incident_repo::MockIncidentRepository;
