//! API middleware.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use campus_common::SESSION_COOKIE;
use campus_core::{PushService, SessionService};

use crate::extractors::SessionUser;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub push_service: PushService,
    pub session_service: SessionService,
}

/// Authentication middleware.
///
/// Resolves the session cookie and stores the [`SessionUser`] in the request
/// extensions. Requests without a valid session pass through unauthenticated;
/// a session lookup that fails on the server side ends the request with the
/// error response.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        match state.session_service.authenticate(cookie.value()).await {
            Ok(user_id) => {
                req.extensions_mut().insert(SessionUser(user_id));
            }
            Err(e) if e.is_server_error() => {
                tracing::warn!(error = %e, "Failed to resolve session");
                return e.into_response();
            }
            Err(_) => {
                tracing::debug!("Rejected unknown or expired session");
            }
        }
    }

    next.run(req).await
}
