//! # bd-connectors
//!
//! Outbound connectors for BreachDesk. Currently this is the HTTP
//! client for the external analysis worker, plus an in-memory mock for
//! tests higher up the stack.

pub mod http;
pub mod mock;

pub use http::HttpAnalysisWorker;
pub use mock::MockAnalysisWorker;
