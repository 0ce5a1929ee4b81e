//! Business logic services.

pub mod push_subscription;
pub mod session;

pub use push_subscription::{
    CreateSubscriptionInput, PushPreferenceResponse, PushService, PushSubscriptionResponse,
    SubscribeInput, SubscriptionKeysInput, VapidConfig,
};
pub use session::{IssuedSession, SESSION_COOKIE, SessionService};
