//! # bd-api
//!
//! HTTP API for BreachDesk: analysis orchestration, reconciled incident
//! status, notification obligations, and evidence management.

pub mod dto;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ErrorResponse};
pub use server::{build_app, run_server, ApiServerConfig};
pub use state::AppState;
