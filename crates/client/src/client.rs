//! Wiring of the push components for one signed-in user.

use std::collections::BTreeSet;
use std::sync::Arc;

use campus_common::ClientConfig;

use crate::backend::{HttpPushBackend, PushBackend};
use crate::manager::SubscriptionManager;
use crate::platform::PushPlatform;
use crate::registrar::ServiceWorkerRegistrar;
use crate::session::Session;
use crate::toggle::{PushToggle, Toaster};
use crate::topic::{Topic, topic_set};

/// Push components bound to a session.
#[derive(Clone)]
pub struct PushClient {
    session: Session,
    backend: Arc<dyn PushBackend>,
    manager: SubscriptionManager,
    topics: BTreeSet<Topic>,
}

impl PushClient {
    /// Build the client for `session` over HTTP.
    pub fn new(config: &ClientConfig, session: Session, platform: Arc<dyn PushPlatform>) -> Self {
        let backend: Arc<dyn PushBackend> = Arc::new(HttpPushBackend::new(session.clone()));
        Self::with_backend(config, session, platform, backend)
    }

    /// Build the client with a custom backend transport.
    pub fn with_backend(
        config: &ClientConfig,
        session: Session,
        platform: Arc<dyn PushPlatform>,
        backend: Arc<dyn PushBackend>,
    ) -> Self {
        let registrar = ServiceWorkerRegistrar::new(
            platform.clone(),
            config.worker_script.clone(),
            config.worker_scope.clone(),
        );
        Self {
            manager: SubscriptionManager::new(platform, registrar, backend.clone()),
            backend,
            session,
            topics: topic_set(&config.default_topics),
        }
    }

    #[must_use]
    pub const fn manager(&self) -> &SubscriptionManager {
        &self.manager
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Topics enabled by [`PushToggle`].
    #[must_use]
    pub const fn topics(&self) -> &BTreeSet<Topic> {
        &self.topics
    }

    /// A toggle for the signed-in user.
    pub fn toggle(&self, toaster: Arc<dyn Toaster>) -> PushToggle {
        PushToggle::new(
            self.manager.clone(),
            self.backend.clone(),
            toaster,
            self.session.user_id(),
            self.topics.clone(),
        )
    }

    /// End the session. The device subscription is left in place.
    pub fn logout(&self) {
        tracing::debug!(user_id = %self.session.user_id(), "Ending push session");
        self.session.end();
    }
}
