//! In-process push platform.
//!
//! Behaves like a browser with one origin: a single registration, a single
//! subscription, a scripted permission answer. Used by tests and headless
//! runs of the lifecycle.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

use crate::platform::{
    ApplicationServerKey, PermissionState, PlatformError, PushPlatform, PushSubscriptionHandle,
    Registration, SubscribeOptions, SubscriptionKeys,
};

const PUSH_SERVICE_URL: &str = "https://push.example.net/send";

/// Call counters of a [`MemoryPlatform`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformCalls {
    pub register: usize,
    pub permission_requests: usize,
    pub subscribe: usize,
    pub unsubscribe: usize,
}

#[derive(Debug)]
struct State {
    supported: bool,
    permission: PermissionState,
    script_error: Option<String>,
    subscribe_error: Option<String>,
    unsubscribe_error: Option<String>,
    lookup_error: Option<String>,
    registration: Option<Registration>,
    subscription: Option<(PushSubscriptionHandle, ApplicationServerKey)>,
    calls: PlatformCalls,
}

/// In-memory [`PushPlatform`].
#[derive(Debug)]
pub struct MemoryPlatform {
    state: Mutex<State>,
}

impl Default for MemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPlatform {
    /// A platform with service workers and granted permission.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(State {
                supported: true,
                permission: PermissionState::Granted,
                script_error: None,
                subscribe_error: None,
                unsubscribe_error: None,
                lookup_error: None,
                registration: None,
                subscription: None,
                calls: PlatformCalls {
                    register: 0,
                    permission_requests: 0,
                    subscribe: 0,
                    unsubscribe: 0,
                },
            }),
        }
    }

    /// A platform without service-worker support.
    #[must_use]
    pub fn unsupported() -> Self {
        let platform = Self::new();
        platform.lock().supported = false;
        platform
    }

    /// Answer every permission prompt with `permission`.
    #[must_use]
    pub fn with_permission(self, permission: PermissionState) -> Self {
        self.lock().permission = permission;
        self
    }

    /// Fail worker registration as if the script did not parse.
    #[must_use]
    pub fn with_script_error(self, message: &str) -> Self {
        self.lock().script_error = Some(message.to_string());
        self
    }

    /// Make subsequent subscribe calls fail.
    pub fn fail_subscribe(&self, message: &str) {
        self.lock().subscribe_error = Some(message.to_string());
    }

    /// Make subsequent unsubscribe calls fail.
    pub fn fail_unsubscribe(&self, message: &str) {
        self.lock().unsubscribe_error = Some(message.to_string());
    }

    /// Make subsequent subscription lookups fail.
    pub fn fail_lookup(&self, message: &str) {
        self.lock().lookup_error = Some(message.to_string());
    }

    /// Drop the subscription the way a browser does when the push service
    /// expires it. Nothing is notified.
    pub fn invalidate_subscription(&self) {
        self.lock().subscription = None;
    }

    /// Current subscription, bypassing the registration lookup.
    #[must_use]
    pub fn current_subscription(&self) -> Option<PushSubscriptionHandle> {
        self.lock().subscription.as_ref().map(|(h, _)| h.clone())
    }

    /// Snapshot of call counters.
    #[must_use]
    pub fn calls(&self) -> PlatformCalls {
        self.lock().calls
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn random_key(len: usize, prefix: Option<u8>) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    if let Some(first) = prefix {
        bytes[0] = first;
    }
    URL_SAFE_NO_PAD.encode(bytes)
}

fn new_handle() -> PushSubscriptionHandle {
    PushSubscriptionHandle {
        endpoint: format!(
            "{PUSH_SERVICE_URL}/{}",
            ulid::Ulid::new().to_string().to_lowercase()
        ),
        expiration_time: None,
        keys: SubscriptionKeys {
            // uncompressed P-256 point marker
            p256dh: random_key(65, Some(0x04)),
            auth: random_key(16, None),
        },
    }
}

#[async_trait]
impl PushPlatform for MemoryPlatform {
    fn supports_service_workers(&self) -> bool {
        self.lock().supported
    }

    async fn registration(&self) -> Result<Option<Registration>, PlatformError> {
        Ok(self.lock().registration.clone())
    }

    async fn register(&self, script_url: &str, scope: &str) -> Result<Registration, PlatformError> {
        let mut state = self.lock();
        state.calls.register += 1;

        if !state.supported {
            return Err(PlatformError("serviceWorker is not available".to_string()));
        }
        if let Some(message) = &state.script_error {
            return Err(PlatformError(format!("{script_url}: {message}")));
        }

        let registration = state
            .registration
            .get_or_insert_with(|| Registration {
                id: ulid::Ulid::new().to_string().to_lowercase(),
                script_url: script_url.to_string(),
                scope: scope.to_string(),
            })
            .clone();
        Ok(registration)
    }

    async fn request_permission(&self) -> PermissionState {
        let mut state = self.lock();
        state.calls.permission_requests += 1;
        state.permission
    }

    async fn subscription(
        &self,
        registration: &Registration,
    ) -> Result<Option<PushSubscriptionHandle>, PlatformError> {
        let state = self.lock();
        if state.registration.as_ref() != Some(registration) {
            return Err(PlatformError("unknown registration".to_string()));
        }
        if let Some(message) = &state.lookup_error {
            return Err(PlatformError(message.clone()));
        }
        Ok(state.subscription.as_ref().map(|(h, _)| h.clone()))
    }

    async fn subscribe(
        &self,
        registration: &Registration,
        options: SubscribeOptions,
    ) -> Result<PushSubscriptionHandle, PlatformError> {
        let mut state = self.lock();
        state.calls.subscribe += 1;

        if state.registration.as_ref() != Some(registration) {
            return Err(PlatformError("unknown registration".to_string()));
        }
        if state.permission != PermissionState::Granted {
            return Err(PlatformError("permission not granted".to_string()));
        }
        if !options.user_visible_only {
            return Err(PlatformError("userVisibleOnly must be true".to_string()));
        }
        if let Some(message) = &state.subscribe_error {
            return Err(PlatformError(message.clone()));
        }

        if let Some((handle, key)) = &state.subscription
            && *key == options.application_server_key
        {
            return Ok(handle.clone());
        }

        let handle = new_handle();
        state.subscription = Some((handle.clone(), options.application_server_key));
        Ok(handle)
    }

    async fn unsubscribe(
        &self,
        registration: &Registration,
        handle: &PushSubscriptionHandle,
    ) -> Result<bool, PlatformError> {
        let mut state = self.lock();
        state.calls.unsubscribe += 1;

        if state.registration.as_ref() != Some(registration) {
            return Err(PlatformError("unknown registration".to_string()));
        }
        if let Some(message) = &state.unsubscribe_error {
            return Err(PlatformError(message.clone()));
        }

        let removed = state
            .subscription
            .as_ref()
            .is_some_and(|(current, _)| current.endpoint == handle.endpoint);
        if removed {
            state.subscription = None;
        }
        Ok(removed)
    }
}
