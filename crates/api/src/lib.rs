//! HTTP API layer for campus push notifications.
//!
//! - **Endpoints**: VAPID key, device subscriptions, per-user preference
//! - **Extractors**: cookie session authentication
//! - **Middleware**: session resolution, application state
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;

use axum::Router;

pub use endpoints::router;
pub use middleware::AppState;

/// Build the API application under `/api` with session authentication.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .with_state(state)
}
