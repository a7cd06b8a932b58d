//! API routes.

pub mod analysis;
pub mod evidence;
pub mod health;
pub mod incidents;

use crate::state::AppState;
use axum::Router;

/// Creates the main API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        .merge(health::routes())
        .with_state(state)
}

/// API routes under /api/v1.
fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/incidents", incidents::routes())
        .nest("/analysis", analysis::routes())
}
