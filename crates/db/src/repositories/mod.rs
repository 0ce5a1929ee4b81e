//! Repositories wrapping entity queries.

mod push_subscription;
mod session;
mod user_push_preference;

pub use push_subscription::PushSubscriptionRepository;
pub use session::SessionRepository;
pub use user_push_preference::UserPushPreferenceRepository;
