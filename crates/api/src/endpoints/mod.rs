//! API endpoints.

mod push;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/push", push::router())
        .nest("/users", users::router())
}
