//! Backend push endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::PushSubscriptionHandle;
use crate::session::Session;
use crate::topic::Topic;

/// Failure of a backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("session has ended")]
    SessionClosed,

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    Decode(String),
}

/// `GET /push/public-key` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyResponse {
    pub public_key: String,
}

/// `POST /push/subscribe` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub subscription: PushSubscriptionHandle,
    pub topics: Vec<Topic>,
    pub user_id: String,
}

/// `DELETE /push/unsubscribe` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

/// Persisted push preference of a user. The client treats it as the source
/// of truth on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPushPreference {
    pub push_enabled: bool,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// `PUT /users/{id}/push` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetPreferenceRequest {
    pub enabled: bool,
}

/// Backend endpoints consumed by the push lifecycle.
#[async_trait]
pub trait PushBackend: Send + Sync {
    /// `GET /push/public-key`
    async fn public_key(&self) -> Result<String, BackendError>;

    /// `POST /push/subscribe`
    async fn subscribe(&self, request: &SubscribeRequest) -> Result<(), BackendError>;

    /// `DELETE /push/unsubscribe`
    async fn unsubscribe(&self, endpoint: &str) -> Result<(), BackendError>;

    /// `GET /users/{id}/push`
    async fn preference(&self, user_id: &str) -> Result<UserPushPreference, BackendError>;

    /// `PUT /users/{id}/push`
    async fn set_preference(&self, user_id: &str, enabled: bool) -> Result<(), BackendError>;
}

/// [`PushBackend`] over HTTP with the session's cookie credentials.
///
/// No timeouts are set: a hung request stays pending until the server or
/// the transport gives up.
#[derive(Debug, Clone)]
pub struct HttpPushBackend {
    session: Session,
}

impl HttpPushBackend {
    /// Create a backend bound to `session`.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    fn preference_url(&self, user_id: &str) -> Result<url::Url, BackendError> {
        let mut url = self.session.url("users")?;
        url.path_segments_mut()
            .map_err(|()| BackendError::Transport("API URL cannot be a base".to_string()))?
            .push(user_id)
            .push("push");
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), url = %response.url(), "Backend call failed");
            return Err(BackendError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl PushBackend for HttpPushBackend {
    async fn public_key(&self) -> Result<String, BackendError> {
        let url = self.session.url("push/public-key")?;
        let response = self.send(self.session.http()?.get(url)).await?;
        let body: PublicKeyResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(body.public_key)
    }

    async fn subscribe(&self, request: &SubscribeRequest) -> Result<(), BackendError> {
        let url = self.session.url("push/subscribe")?;
        self.send(self.session.http()?.post(url).json(request))
            .await?;
        Ok(())
    }

    async fn unsubscribe(&self, endpoint: &str) -> Result<(), BackendError> {
        let url = self.session.url("push/unsubscribe")?;
        let body = UnsubscribeRequest {
            endpoint: endpoint.to_string(),
        };
        self.send(self.session.http()?.delete(url).json(&body))
            .await?;
        Ok(())
    }

    async fn preference(&self, user_id: &str) -> Result<UserPushPreference, BackendError> {
        let url = self.preference_url(user_id)?;
        let response = self.send(self.session.http()?.get(url)).await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn set_preference(&self, user_id: &str, enabled: bool) -> Result<(), BackendError> {
        let url = self.preference_url(user_id)?;
        self.send(
            self.session
                .http()?
                .put(url)
                .json(&SetPreferenceRequest { enabled }),
        )
        .await?;
        Ok(())
    }
}
