//! HTTP route handlers.

pub mod health;
pub mod report;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(report::router())
        .merge(health::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
