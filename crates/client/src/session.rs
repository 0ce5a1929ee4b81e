//! Authenticated client session.
//!
//! One [`Session`] is created when the app starts and ended on logout.
//! Every backend call goes through it, so no component reads tokens from
//! ambient storage.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use campus_common::{ClientConfig, SESSION_COOKIE};
use reqwest::cookie::Jar;
use url::Url;

use crate::backend::BackendError;

struct Inner {
    http: reqwest::Client,
    base_url: Url,
    user_id: String,
    active: AtomicBool,
}

/// Cookie-authenticated session against the campus API.
///
/// Cloning is cheap; all clones share one lifecycle.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.inner.base_url.as_str())
            .field("user_id", &self.inner.user_id)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Start a session for `user_id` using the cookie token issued at login.
    pub fn start(
        config: &ClientConfig,
        user_id: impl Into<String>,
        session_token: &str,
    ) -> Result<Self, BackendError> {
        let mut base_url = config.api_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let jar = Arc::new(Jar::default());
        jar.add_cookie_str(
            &format!("{SESSION_COOKIE}={session_token}; Path=/; HttpOnly"),
            &base_url,
        );

        let http = reqwest::Client::builder()
            .cookie_provider(jar)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let user_id = user_id.into();
        tracing::debug!(user_id = %user_id, api_url = %base_url, "Session started");

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url,
                user_id,
                active: AtomicBool::new(true),
            }),
        })
    }

    /// User the session belongs to.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.inner.user_id
    }

    /// Whether [`Session::end`] has not been called yet.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::Acquire)
    }

    /// End the session (logout). Later calls fail with
    /// [`BackendError::SessionClosed`] without reaching the network.
    pub fn end(&self) {
        if self.inner.active.swap(false, Ordering::AcqRel) {
            tracing::debug!(user_id = %self.inner.user_id, "Session ended");
        }
    }

    pub(crate) fn http(&self) -> Result<&reqwest::Client, BackendError> {
        if self.is_active() {
            Ok(&self.inner.http)
        } else {
            Err(BackendError::SessionClosed)
        }
    }

    /// Resolve an API path relative to the configured base URL.
    pub(crate) fn url(&self, path: &str) -> Result<Url, BackendError> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| BackendError::Transport(e.to_string()))
    }
}
