//! Enable/disable toggle state machine.
//!
//! ```text
//! Unknown --mount--> Enabled | Disabled
//! Enabled | Disabled | Error --set_enabled--> Loading
//! Loading --ok--> Enabled | Disabled
//! Loading --err--> Error (switch reverted)
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use crate::backend::PushBackend;
use crate::error::PushError;
use crate::manager::{DisableOutcome, SubscriptionManager};
use crate::topic::Topic;

/// State of the toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    /// Preference not read yet.
    Unknown,
    /// An enable or disable is in flight; the control is locked.
    Loading,
    Enabled,
    Disabled,
    /// The last attempt failed; the switch shows its pre-attempt position.
    Error,
}

/// What the control renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleView {
    pub state: ToggleState,
    /// Switch position.
    pub checked: bool,
    /// Whether the user can flip the switch.
    pub interactive: bool,
    /// False when the platform cannot do push; the feature is hidden.
    pub visible: bool,
    pub last_error: Option<PushError>,
}

impl ToggleView {
    const fn initial() -> Self {
        Self {
            state: ToggleState::Unknown,
            checked: false,
            interactive: false,
            visible: true,
            last_error: None,
        }
    }

    fn settle(&mut self, enabled: bool) {
        self.state = if enabled {
            ToggleState::Enabled
        } else {
            ToggleState::Disabled
        };
        self.checked = enabled;
        self.interactive = self.visible;
        self.last_error = None;
    }
}

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Warning,
    Error,
}

/// Transient user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    fn from_error(error: &PushError) -> Self {
        Self {
            level: ToastLevel::Error,
            message: error.user_message().to_string(),
        }
    }
}

/// Surface that displays toasts.
pub trait Toaster: Send + Sync {
    fn show(&self, toast: Toast);
}

/// Result of a [`PushToggle::set_enabled`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The action completed; the toggle now shows this state.
    Applied(ToggleState),
    /// The action failed; the toggle shows [`ToggleState::Error`].
    Failed(PushError),
    /// The control was locked (loading or not mounted yet).
    Ignored,
    /// The component went away before completion; nothing was written.
    Unmounted,
}

const BACKEND_NOT_UPDATED: &str =
    "Notifications are off on this device, but the server could not be updated.";

/// Push notification toggle for one user.
pub struct PushToggle {
    manager: SubscriptionManager,
    backend: Arc<dyn PushBackend>,
    toaster: Arc<dyn Toaster>,
    user_id: String,
    topics: BTreeSet<Topic>,
    view: watch::Sender<ToggleView>,
    mounted: AtomicBool,
}

impl PushToggle {
    /// Create a toggle in [`ToggleState::Unknown`].
    pub fn new(
        manager: SubscriptionManager,
        backend: Arc<dyn PushBackend>,
        toaster: Arc<dyn Toaster>,
        user_id: impl Into<String>,
        topics: BTreeSet<Topic>,
    ) -> Self {
        let (view, _) = watch::channel(ToggleView::initial());
        Self {
            manager,
            backend,
            toaster,
            user_id: user_id.into(),
            topics,
            view,
            mounted: AtomicBool::new(true),
        }
    }

    /// Current view.
    #[must_use]
    pub fn view(&self) -> ToggleView {
        self.view.borrow().clone()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ToggleState {
        self.view.borrow().state
    }

    /// Observe view changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<ToggleView> {
        self.view.subscribe()
    }

    /// Whether the component is still mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Read the persisted preference and render it.
    ///
    /// A failed read renders `Disabled`. Only the first call does any work.
    pub async fn mount(&self) -> ToggleState {
        if self.state() != ToggleState::Unknown {
            return self.state();
        }

        if !self.manager.is_supported() {
            self.write(|v| {
                v.visible = false;
                v.settle(false);
            });
            return self.state();
        }

        let enabled = match self.backend.preference(&self.user_id).await {
            Ok(preference) => preference.push_enabled,
            Err(e) => {
                tracing::warn!(user_id = %self.user_id, error = %e, "Failed to load push preference");
                false
            }
        };

        self.write(|v| v.settle(enabled));
        self.state()
    }

    /// Flip the switch to `desired`.
    ///
    /// Locked while loading: concurrent calls return
    /// [`ToggleOutcome::Ignored`] without touching the platform or backend.
    pub async fn set_enabled(&self, desired: bool) -> ToggleOutcome {
        if !self.is_mounted() {
            return ToggleOutcome::Unmounted;
        }

        let mut previous = false;
        let claimed = self.view.send_if_modified(|v| {
            if !v.interactive || matches!(v.state, ToggleState::Loading | ToggleState::Unknown) {
                return false;
            }
            previous = v.checked;
            v.state = ToggleState::Loading;
            v.checked = desired;
            v.interactive = false;
            v.last_error = None;
            true
        });
        if !claimed {
            return ToggleOutcome::Ignored;
        }

        let result = if desired {
            self.run_enable().await
        } else {
            self.run_disable().await
        };

        if !self.is_mounted() {
            tracing::debug!(user_id = %self.user_id, "Toggle unmounted before completion");
            return ToggleOutcome::Unmounted;
        }

        match result {
            Ok(warning) => {
                self.write(|v| v.settle(desired));
                if let Some(toast) = warning {
                    self.toaster.show(toast);
                }
                ToggleOutcome::Applied(self.state())
            }
            Err(error) => {
                tracing::warn!(
                    user_id = %self.user_id,
                    code = error.error_code(),
                    error = %error,
                    "Push toggle failed"
                );
                self.write(|v| {
                    v.state = ToggleState::Error;
                    v.checked = previous;
                    if error == PushError::PlatformUnsupported {
                        v.visible = false;
                    }
                    v.interactive = v.visible;
                    v.last_error = Some(error.clone());
                });
                self.toaster.show(Toast::from_error(&error));
                ToggleOutcome::Failed(error)
            }
        }
    }

    /// Mark the component gone. In-flight actions finish without writing.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
    }

    async fn run_enable(&self) -> Result<Option<Toast>, PushError> {
        self.manager.enable(&self.topics, &self.user_id).await?;

        if let Err(e) = self.backend.set_preference(&self.user_id, true).await {
            // Without a persisted "on" the device must not keep receiving.
            if let Err(rollback) = self.manager.disable().await {
                tracing::warn!(error = %rollback, "Failed to roll back after preference error");
            }
            return Err(PushError::BackendSyncError(e.to_string()));
        }

        Ok(None)
    }

    async fn run_disable(&self) -> Result<Option<Toast>, PushError> {
        let outcome = self.manager.disable().await?;
        let mut synced = !matches!(
            outcome,
            DisableOutcome::Unsubscribed {
                backend_acknowledged: false
            }
        );

        if let Err(e) = self.backend.set_preference(&self.user_id, false).await {
            tracing::warn!(user_id = %self.user_id, error = %e, "Failed to persist disabled preference");
            synced = false;
        }

        Ok((!synced).then(|| Toast {
            level: ToastLevel::Warning,
            message: BACKEND_NOT_UPDATED.to_string(),
        }))
    }

    fn write(&self, update: impl FnOnce(&mut ToggleView)) {
        if self.is_mounted() {
            self.view.send_modify(update);
        }
    }
}
