//! In-crate fakes for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::backend::{BackendError, PushBackend, SubscribeRequest, UserPushPreference};
use crate::memory::MemoryPlatform;
use crate::platform::{
    PermissionState, PlatformError, PushPlatform, PushSubscriptionHandle, Registration,
    SubscribeOptions,
};
use crate::toggle::{Toast, Toaster};

#[derive(Debug, Clone)]
pub enum BackendCall {
    PublicKey,
    Subscribe(SubscribeRequest),
    Unsubscribe(String),
    Preference(String),
    SetPreference(String, bool),
}

#[derive(Default)]
struct State {
    calls: Vec<BackendCall>,
    preferences: HashMap<String, bool>,
    public_key_error: Option<BackendError>,
    subscribe_error: Option<BackendError>,
    unsubscribe_error: Option<BackendError>,
    preference_error: Option<BackendError>,
    set_preference_error: Option<BackendError>,
    subscribe_gate: Option<Arc<Notify>>,
}

/// Backend that records every call and answers from memory.
pub struct RecordingBackend {
    public_key: String,
    state: Mutex<State>,
}

impl RecordingBackend {
    pub fn new(public_key: &str) -> Self {
        Self {
            public_key: public_key.to_string(),
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    pub fn subscribe_requests(&self) -> Vec<SubscribeRequest> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::Subscribe(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn stored_preference(&self, user_id: &str) -> Option<bool> {
        self.lock().preferences.get(user_id).copied()
    }

    pub fn set_stored_preference(&self, user_id: &str, enabled: bool) {
        self.lock().preferences.insert(user_id.to_string(), enabled);
    }

    pub fn fail_public_key(&self, error: BackendError) {
        self.lock().public_key_error = Some(error);
    }

    pub fn restore_public_key(&self) {
        self.lock().public_key_error = None;
    }

    pub fn fail_subscribe(&self, error: BackendError) {
        self.lock().subscribe_error = Some(error);
    }

    pub fn fail_unsubscribe(&self, error: BackendError) {
        self.lock().unsubscribe_error = Some(error);
    }

    pub fn fail_preference(&self, error: BackendError) {
        self.lock().preference_error = Some(error);
    }

    pub fn fail_set_preference(&self, error: BackendError) {
        self.lock().set_preference_error = Some(error);
    }

    /// Park subscribe calls until the returned notify is signalled.
    pub fn hold_subscribe(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().subscribe_gate = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl PushBackend for RecordingBackend {
    async fn public_key(&self) -> Result<String, BackendError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::PublicKey);
        match &state.public_key_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.public_key.clone()),
        }
    }

    async fn subscribe(&self, request: &SubscribeRequest) -> Result<(), BackendError> {
        let gate = {
            let mut state = self.lock();
            state.calls.push(BackendCall::Subscribe(request.clone()));
            state.subscribe_gate.clone()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match &self.lock().subscribe_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    async fn unsubscribe(&self, endpoint: &str) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::Unsubscribe(endpoint.to_string()));
        match &state.unsubscribe_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    async fn preference(&self, user_id: &str) -> Result<UserPushPreference, BackendError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::Preference(user_id.to_string()));
        if let Some(e) = &state.preference_error {
            return Err(e.clone());
        }
        Ok(UserPushPreference {
            push_enabled: state.preferences.get(user_id).copied().unwrap_or(false),
            topics: Vec::new(),
        })
    }

    async fn set_preference(&self, user_id: &str, enabled: bool) -> Result<(), BackendError> {
        let mut state = self.lock();
        state
            .calls
            .push(BackendCall::SetPreference(user_id.to_string(), enabled));
        if let Some(e) = &state.set_preference_error {
            return Err(e.clone());
        }
        state.preferences.insert(user_id.to_string(), enabled);
        Ok(())
    }
}

/// Toaster that keeps every toast.
#[derive(Default)]
pub struct RecordingToaster {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingToaster {
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Toaster for RecordingToaster {
    fn show(&self, toast: Toast) {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(toast);
    }
}

/// Platform whose subscription expires between lookup and unsubscribe.
pub struct ExpiringPlatform {
    pub inner: Arc<MemoryPlatform>,
}

#[async_trait]
impl PushPlatform for ExpiringPlatform {
    fn supports_service_workers(&self) -> bool {
        self.inner.supports_service_workers()
    }

    async fn registration(&self) -> Result<Option<Registration>, PlatformError> {
        self.inner.registration().await
    }

    async fn register(&self, script_url: &str, scope: &str) -> Result<Registration, PlatformError> {
        self.inner.register(script_url, scope).await
    }

    async fn request_permission(&self) -> PermissionState {
        self.inner.request_permission().await
    }

    async fn subscription(
        &self,
        registration: &Registration,
    ) -> Result<Option<PushSubscriptionHandle>, PlatformError> {
        self.inner.subscription(registration).await
    }

    async fn subscribe(
        &self,
        registration: &Registration,
        options: SubscribeOptions,
    ) -> Result<PushSubscriptionHandle, PlatformError> {
        self.inner.subscribe(registration, options).await
    }

    async fn unsubscribe(
        &self,
        registration: &Registration,
        handle: &PushSubscriptionHandle,
    ) -> Result<bool, PlatformError> {
        self.inner.invalidate_subscription();
        self.inner.unsubscribe(registration, handle).await
    }
}
