//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use campus_common::AppError;

/// Authenticated user extractor.
///
/// Holds the user ID of the session set by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser(pub String);

impl SessionUser {
    /// Reject with 403 unless the session belongs to `user_id`.
    pub fn ensure(&self, user_id: &str) -> Result<(), AppError> {
        if self.0 == user_id {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Session does not belong to this user".to_string(),
            ))
        }
    }
}

impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
