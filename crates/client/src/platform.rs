//! Browser push platform seam.
//!
//! [`PushPlatform`] covers the three browser surfaces the lifecycle uses:
//! the service-worker container, the Notification permission prompt and the
//! Push manager of a registration. A `web-sys` binding and the in-process
//! [`MemoryPlatform`](crate::MemoryPlatform) both implement it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error reported by the push platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PlatformError(pub String);

/// A service-worker registration. At most one exists per origin and scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Platform-assigned identifier.
    pub id: String,
    /// Script the worker was registered from.
    pub script_url: String,
    /// Scope the worker controls.
    pub scope: String,
}

/// Encryption keys of a push subscription (base64url).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Browser-issued subscription handle.
///
/// Serializes like `PushSubscription.toJSON()`. The application holds it
/// only to forward it to the backend once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscriptionHandle {
    /// Push service endpoint URL; identifies the device.
    pub endpoint: String,
    /// Expiration in epoch millis, if the push service set one.
    pub expiration_time: Option<i64>,
    /// Encryption keys.
    pub keys: SubscriptionKeys,
}

/// Answer of the notification permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    /// The prompt was dismissed without a decision.
    Default,
}

/// VAPID application-server key, base64url encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationServerKey(String);

impl ApplicationServerKey {
    /// Wrap a key string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The encoded key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationServerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Options of a subscribe call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Every push must show a notification. Always `true`.
    pub user_visible_only: bool,
    /// Key the push service binds the subscription to.
    pub application_server_key: ApplicationServerKey,
}

impl SubscribeOptions {
    /// User-visible subscription options for `key`.
    #[must_use]
    pub const fn user_visible(key: ApplicationServerKey) -> Self {
        Self {
            user_visible_only: true,
            application_server_key: key,
        }
    }
}

/// Browser push capabilities.
#[async_trait]
pub trait PushPlatform: Send + Sync {
    /// Whether the environment can register service workers at all.
    fn supports_service_workers(&self) -> bool;

    /// Look up the existing registration without creating one.
    async fn registration(&self) -> Result<Option<Registration>, PlatformError>;

    /// Register `script_url` for `scope`.
    async fn register(&self, script_url: &str, scope: &str) -> Result<Registration, PlatformError>;

    /// Ask the user for notification permission.
    async fn request_permission(&self) -> PermissionState;

    /// Current subscription of `registration`, if any.
    async fn subscription(
        &self,
        registration: &Registration,
    ) -> Result<Option<PushSubscriptionHandle>, PlatformError>;

    /// Create (or return the existing) subscription.
    ///
    /// Subscribing with a different key replaces the previous handle.
    async fn subscribe(
        &self,
        registration: &Registration,
        options: SubscribeOptions,
    ) -> Result<PushSubscriptionHandle, PlatformError>;

    /// Destroy `handle`. Returns whether a subscription was removed.
    async fn unsubscribe(
        &self,
        registration: &Registration,
        handle: &PushSubscriptionHandle,
    ) -> Result<bool, PlatformError>;
}
