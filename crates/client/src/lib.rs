//! Client-side push notification lifecycle for campus.
//!
//! A signed-in user flips a [`PushToggle`]. Enabling registers the service
//! worker, asks for notification permission, fetches the server's VAPID key,
//! subscribes the device and binds the subscription to the user on the
//! backend. Disabling reverses that. The browser-side primitives sit behind
//! [`PushPlatform`]; [`MemoryPlatform`] implements them in memory.

pub mod backend;
pub mod client;
pub mod error;
pub mod key_fetcher;
pub mod manager;
pub mod memory;
pub mod platform;
pub mod registrar;
pub mod session;
pub mod toggle;
pub mod topic;

#[cfg(test)]
mod test_support;

pub use backend::{BackendError, HttpPushBackend, PushBackend, SubscribeRequest, UserPushPreference};
pub use client::PushClient;
pub use error::{PushError, PushResult};
pub use key_fetcher::KeyFetcher;
pub use manager::{DisableOutcome, SubscriptionManager};
pub use memory::MemoryPlatform;
pub use platform::{
    ApplicationServerKey, PermissionState, PlatformError, PushPlatform, PushSubscriptionHandle,
    Registration, SubscribeOptions, SubscriptionKeys,
};
pub use registrar::ServiceWorkerRegistrar;
pub use session::Session;
pub use toggle::{PushToggle, Toast, ToastLevel, ToggleOutcome, ToggleState, ToggleView, Toaster};
pub use topic::{Topic, topic_set};
