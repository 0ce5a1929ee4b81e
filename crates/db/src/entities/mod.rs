//! Database entities.

pub mod push_subscription;
pub mod session;
pub mod user_push_preference;

pub use push_subscription::Entity as PushSubscription;
pub use session::Entity as Session;
pub use user_push_preference::Entity as UserPushPreference;
