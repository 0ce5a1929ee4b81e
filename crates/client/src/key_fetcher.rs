//! Application-server key retrieval.

use std::sync::Arc;

use crate::backend::PushBackend;
use crate::error::{PushError, PushResult};
use crate::platform::ApplicationServerKey;

/// Reads the server's VAPID public key. Every call hits the network.
#[derive(Clone)]
pub struct KeyFetcher {
    backend: Arc<dyn PushBackend>,
}

impl KeyFetcher {
    /// Create a key fetcher.
    pub fn new(backend: Arc<dyn PushBackend>) -> Self {
        Self { backend }
    }

    /// Fetch the public key. Any failure is [`PushError::KeyUnavailable`].
    pub async fn fetch_public_key(&self) -> PushResult<ApplicationServerKey> {
        let key = self.backend.public_key().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to fetch push public key");
            PushError::KeyUnavailable(e.to_string())
        })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(PushError::KeyUnavailable("empty public key".to_string()));
        }
        Ok(ApplicationServerKey::new(key))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::test_support::RecordingBackend;

    #[tokio::test]
    async fn test_blank_key_is_unavailable() {
        let fetcher = KeyFetcher::new(Arc::new(RecordingBackend::new("  ")));
        assert!(matches!(
            fetcher.fetch_public_key().await,
            Err(PushError::KeyUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_every_call_hits_backend() {
        let backend = Arc::new(RecordingBackend::new(" BKey\n"));
        let fetcher = KeyFetcher::new(backend.clone());

        assert_eq!(fetcher.fetch_public_key().await.unwrap().as_str(), "BKey");
        fetcher.fetch_public_key().await.unwrap();
        assert_eq!(backend.calls().len(), 2);

        backend.fail_public_key(BackendError::Status(503));
        assert_eq!(
            fetcher.fetch_public_key().await,
            Err(PushError::KeyUnavailable("unexpected HTTP status 503".to_string()))
        );
    }
}
