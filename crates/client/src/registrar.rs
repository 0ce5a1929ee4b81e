//! Service worker registration.

use std::sync::Arc;

use crate::error::{PushError, PushResult};
use crate::platform::{PushPlatform, Registration};

/// Keeps exactly one service-worker registration for the origin.
#[derive(Clone)]
pub struct ServiceWorkerRegistrar {
    platform: Arc<dyn PushPlatform>,
    script_url: String,
    scope: String,
}

impl ServiceWorkerRegistrar {
    /// Create a registrar for the worker at `script_url`.
    pub fn new(
        platform: Arc<dyn PushPlatform>,
        script_url: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            script_url: script_url.into(),
            scope: scope.into(),
        }
    }

    /// Return the existing registration or register the worker script.
    ///
    /// `Ok(None)` means the environment has no service workers; that is an
    /// expected condition, not an error. Script failures are surfaced as
    /// [`PushError::RegistrationError`] and not retried.
    pub async fn ensure_registration(&self) -> PushResult<Option<Registration>> {
        if !self.platform.supports_service_workers() {
            tracing::debug!("Service workers not supported");
            return Ok(None);
        }

        if let Some(existing) = self
            .platform
            .registration()
            .await
            .map_err(|e| PushError::RegistrationError(e.to_string()))?
        {
            return Ok(Some(existing));
        }

        let registration = self
            .platform
            .register(&self.script_url, &self.scope)
            .await
            .map_err(|e| {
                tracing::error!(script = %self.script_url, error = %e, "Service worker registration failed");
                PushError::RegistrationError(e.to_string())
            })?;

        tracing::info!(script = %self.script_url, scope = %self.scope, "Service worker registered");
        Ok(Some(registration))
    }

    /// Existing registration, without registering.
    ///
    /// Lookup failures are [`PushError::Platform`].
    pub async fn find(&self) -> PushResult<Option<Registration>> {
        if !self.platform.supports_service_workers() {
            return Ok(None);
        }
        self.platform
            .registration()
            .await
            .map_err(|e| PushError::Platform(e.to_string()))
    }

    /// Like [`find`](Self::find), but lookup failures read as
    /// "no registration".
    pub async fn current(&self) -> Option<Registration> {
        match self.find().await {
            Ok(registration) => registration,
            Err(e) => {
                tracing::debug!(error = %e, "Registration lookup failed");
                None
            }
        }
    }

    /// Whether the platform can host the worker at all.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.platform.supports_service_workers()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::memory::MemoryPlatform;

    #[tokio::test]
    async fn test_ensure_registration_is_idempotent() {
        let platform = Arc::new(MemoryPlatform::new());
        let registrar = ServiceWorkerRegistrar::new(platform.clone(), "/sw.js", "/");

        let first = registrar.ensure_registration().await.unwrap().unwrap();
        let second = registrar.ensure_registration().await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(first.script_url, "/sw.js");
        assert_eq!(platform.calls().register, 1);
    }

    #[tokio::test]
    async fn test_unsupported_platform_returns_none() {
        let platform = Arc::new(MemoryPlatform::unsupported());
        let registrar = ServiceWorkerRegistrar::new(platform.clone(), "/sw.js", "/");

        assert_eq!(registrar.ensure_registration().await, Ok(None));
        assert!(registrar.current().await.is_none());
        assert_eq!(platform.calls().register, 0);
    }

    #[tokio::test]
    async fn test_script_failure_is_registration_error() {
        let platform = Arc::new(MemoryPlatform::new().with_script_error("SyntaxError"));
        let registrar = ServiceWorkerRegistrar::new(platform.clone(), "/sw.js", "/");

        let result = registrar.ensure_registration().await;
        assert!(matches!(result, Err(PushError::RegistrationError(ref m)) if m.contains("SyntaxError")));

        // surfaced, not retried
        assert_eq!(platform.calls().register, 1);
        assert!(registrar.current().await.is_none());
    }
}
