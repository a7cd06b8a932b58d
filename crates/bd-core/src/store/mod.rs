//! Persistence layer for BreachDesk.
//!
//! Repository traits with SQLite implementations (behind the `database`
//! feature) and in-memory mocks for tests. The analysis status table is
//! append-only across runs: a re-triggered analysis is a new row, never
//! an update of an old one.

mod error;
pub mod mocks;
#[cfg(feature = "database")]
mod pool;
#[cfg(feature = "database")]
mod schema;

pub mod analysis_repo;
pub mod incident_repo;

pub use error::StoreError;
#[cfg(feature = "database")]
pub use pool::{create_pool, DbPool};
#[cfg(feature = "database")]
pub use schema::run_migrations;

pub use analysis_repo::AnalysisStatusRepository;
pub use incident_repo::IncidentRepository;

#[cfg(feature = "database")]
pub use analysis_repo::create_analysis_status_repository;
#[cfg(feature = "database")]
pub use incident_repo::create_incident_repository;
