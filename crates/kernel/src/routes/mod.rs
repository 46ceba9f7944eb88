//! HTTP route handlers.

pub mod health;
pub mod nav;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(nav::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
