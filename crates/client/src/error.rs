//! Error types for the push subscription lifecycle.

use thiserror::Error;

/// Result type of the push lifecycle.
pub type PushResult<T> = Result<T, PushError>;

/// Failure of a push lifecycle step.
///
/// Every variant is caught by [`PushToggle`](crate::PushToggle) and turned
/// into a toast; nothing in the flow retries on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    /// The environment has no service-worker capability.
    #[error("Push notifications are not supported on this device")]
    PlatformUnsupported,

    /// The user declined the notification permission prompt.
    #[error("Notification permission denied")]
    PermissionDenied,

    /// The server's public key could not be read.
    #[error("Push key unavailable: {0}")]
    KeyUnavailable(String),

    /// The service-worker script failed to load or parse.
    #[error("Service worker registration failed: {0}")]
    RegistrationError(String),

    /// A subscribe/unsubscribe/preference call to the backend failed.
    #[error("Backend sync failed: {0}")]
    BackendSyncError(String),

    /// The push platform rejected a subscribe or unsubscribe call.
    #[error("Push platform error: {0}")]
    Platform(String),
}

impl PushError {
    /// Whether re-invoking the same action may succeed without a deployment
    /// fix or a new permission grant.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::KeyUnavailable(_) | Self::BackendSyncError(_))
    }

    /// Stable code for logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::PlatformUnsupported => "PLATFORM_UNSUPPORTED",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::KeyUnavailable(_) => "KEY_UNAVAILABLE",
            Self::RegistrationError(_) => "REGISTRATION_ERROR",
            Self::BackendSyncError(_) => "BACKEND_SYNC_ERROR",
            Self::Platform(_) => "PLATFORM_ERROR",
        }
    }

    /// Human-readable message shown in a toast.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::PlatformUnsupported => "This browser does not support push notifications.",
            Self::PermissionDenied => {
                "Notifications are blocked. Allow them in your browser settings and try again."
            }
            Self::KeyUnavailable(_) => {
                "Could not reach the notification server. Please try again."
            }
            Self::RegistrationError(_) => {
                "Notifications could not be set up on this device. Please contact support."
            }
            Self::BackendSyncError(_) => {
                "Your notification settings could not be saved. Please try again."
            }
            Self::Platform(_) => "The browser rejected the notification request.",
        }
    }
}
