//! Push subscription lifecycle.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::backend::{PushBackend, SubscribeRequest};
use crate::error::{PushError, PushResult};
use crate::key_fetcher::KeyFetcher;
use crate::platform::{
    PermissionState, PushPlatform, PushSubscriptionHandle, Registration, SubscribeOptions,
};
use crate::registrar::ServiceWorkerRegistrar;
use crate::topic::Topic;

/// Result of [`SubscriptionManager::disable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisableOutcome {
    /// There was no registration or no subscription to remove.
    NotSubscribed,
    /// The device subscription was removed.
    Unsubscribed {
        /// Whether the backend confirmed the removal.
        backend_acknowledged: bool,
    },
}

/// Creates and destroys the device's push subscription and binds it to a
/// user and topic set on the backend.
#[derive(Clone)]
pub struct SubscriptionManager {
    platform: Arc<dyn PushPlatform>,
    registrar: ServiceWorkerRegistrar,
    keys: KeyFetcher,
    backend: Arc<dyn PushBackend>,
}

impl SubscriptionManager {
    /// Create a manager.
    pub fn new(
        platform: Arc<dyn PushPlatform>,
        registrar: ServiceWorkerRegistrar,
        backend: Arc<dyn PushBackend>,
    ) -> Self {
        Self {
            platform,
            registrar,
            keys: KeyFetcher::new(backend.clone()),
            backend,
        }
    }

    /// Subscribe this device and bind it to `user_id` for `topics`.
    ///
    /// Steps run in order and the first failure aborts with its own kind:
    /// registration, permission, key fetch, platform subscribe, backend
    /// persist. A subscription created here is rolled back if the backend
    /// does not acknowledge it.
    pub async fn enable(
        &self,
        topics: &BTreeSet<Topic>,
        user_id: &str,
    ) -> PushResult<PushSubscriptionHandle> {
        let registration = self
            .registrar
            .ensure_registration()
            .await?
            .ok_or(PushError::PlatformUnsupported)?;

        match self.platform.request_permission().await {
            PermissionState::Granted => {}
            PermissionState::Denied | PermissionState::Default => {
                tracing::info!(user_id = %user_id, "Notification permission not granted");
                return Err(PushError::PermissionDenied);
            }
        }

        let key = self.keys.fetch_public_key().await?;

        let previous = self.lookup(&registration).await;
        let handle = self
            .platform
            .subscribe(&registration, SubscribeOptions::user_visible(key))
            .await
            .map_err(|e| PushError::Platform(e.to_string()))?;
        let created_here = previous.as_ref().is_none_or(|p| p.endpoint != handle.endpoint);

        let request = SubscribeRequest {
            subscription: handle.clone(),
            topics: topics.iter().cloned().collect(),
            user_id: user_id.to_string(),
        };

        if let Err(e) = self.backend.subscribe(&request).await {
            tracing::warn!(user_id = %user_id, error = %e, "Backend rejected push subscription");
            if created_here {
                self.rollback(&registration, &handle).await;
            }
            return Err(PushError::BackendSyncError(e.to_string()));
        }

        tracing::info!(
            user_id = %user_id,
            topics = topics.len(),
            "Push notifications enabled"
        );
        Ok(handle)
    }

    /// Stop push delivery to this device.
    ///
    /// The backend is told first on a best-effort basis; its failure is
    /// logged and never blocks the local unsubscribe, which must succeed.
    /// Failing registration or subscription lookups are errors: the device
    /// may still be subscribed.
    pub async fn disable(&self) -> PushResult<DisableOutcome> {
        let Some(registration) = self.registrar.find().await? else {
            return Ok(DisableOutcome::NotSubscribed);
        };

        let handle = self.platform.subscription(&registration).await.map_err(|e| {
            tracing::error!(error = %e, "Subscription lookup failed during disable");
            PushError::Platform(e.to_string())
        })?;
        let Some(handle) = handle else {
            return Ok(DisableOutcome::NotSubscribed);
        };

        let backend_acknowledged = match self.backend.unsubscribe(&handle.endpoint).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    endpoint = %handle.endpoint,
                    error = %e,
                    "Failed to notify backend of unsubscribe"
                );
                false
            }
        };

        let removed = self
            .platform
            .unsubscribe(&registration, &handle)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Local unsubscribe failed");
                PushError::Platform(e.to_string())
            })?;

        if !removed {
            tracing::info!(endpoint = %handle.endpoint, "Subscription was already gone");
            return Ok(DisableOutcome::NotSubscribed);
        }

        tracing::info!(backend_acknowledged, "Push notifications disabled");
        Ok(DisableOutcome::Unsubscribed {
            backend_acknowledged,
        })
    }

    /// Whether this device currently holds a push subscription.
    ///
    /// Pure query: never registers, never errors.
    pub async fn is_subscribed(&self) -> bool {
        self.current_subscription().await.is_some()
    }

    /// The device's current subscription handle, if any.
    pub async fn current_subscription(&self) -> Option<PushSubscriptionHandle> {
        let registration = self.registrar.current().await?;
        self.lookup(&registration).await
    }

    /// Whether the platform supports push at all.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.registrar.is_supported()
    }

    async fn lookup(&self, registration: &Registration) -> Option<PushSubscriptionHandle> {
        match self.platform.subscription(registration).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::debug!(error = %e, "Subscription lookup failed");
                None
            }
        }
    }

    async fn rollback(&self, registration: &Registration, handle: &PushSubscriptionHandle) {
        if let Err(e) = self.platform.unsubscribe(registration, handle).await {
            tracing::warn!(endpoint = %handle.endpoint, error = %e, "Failed to roll back push subscription");
        }
    }
}
