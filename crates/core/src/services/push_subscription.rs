//! Push subscription and preference service for Web Push.

use std::collections::BTreeSet;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use campus_common::config::PushConfig;
use campus_common::{AppError, AppResult};
use campus_db::entities::push_subscription;
use campus_db::repositories::{PushSubscriptionRepository, UserPushPreferenceRepository};
use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Length of an uncompressed P-256 public key.
const P256DH_LEN: usize = 65;
/// Length of the push auth secret.
const AUTH_SECRET_LEN: usize = 16;
/// Longest accepted topic name.
const MAX_TOPIC_LEN: usize = 64;

/// Configuration for VAPID (Voluntary Application Server Identification).
#[derive(Debug, Clone)]
pub struct VapidConfig {
    /// Public key (base64 URL-safe encoded)
    pub public_key: String,
}

impl From<&PushConfig> for VapidConfig {
    fn from(config: &PushConfig) -> Self {
        Self {
            public_key: config.vapid_public_key.clone(),
        }
    }
}

/// Encryption keys of a browser push subscription.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubscriptionKeysInput {
    /// P256DH public key (base64 URL-safe encoded)
    #[validate(length(min = 1))]
    pub p256dh: String,
    /// Auth secret (base64 URL-safe encoded)
    #[validate(length(min = 1))]
    pub auth: String,
}

/// A browser push subscription as produced by `PushSubscription.toJSON()`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionInput {
    /// Push service endpoint URL
    #[validate(url)]
    pub endpoint: String,
    /// Expiration time in epoch millis, if the push service set one
    #[serde(default)]
    pub expiration_time: Option<i64>,
    /// Encryption keys
    #[validate(nested)]
    pub keys: SubscriptionKeysInput,
}

/// Body of `POST /push/subscribe`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeInput {
    /// Subscription handle forwarded by the browser
    #[validate(nested)]
    pub subscription: CreateSubscriptionInput,
    /// Topics the device should receive
    #[serde(default)]
    #[validate(length(max = 32), custom(function = "validate_topic_names"))]
    pub topics: Vec<String>,
    /// User the subscription is bound to
    #[validate(length(min = 1))]
    pub user_id: String,
}

fn validate_topic_names(topics: &[String]) -> Result<(), ValidationError> {
    if topics
        .iter()
        .all(|t| !t.trim().is_empty() && t.len() <= MAX_TOPIC_LEN)
    {
        Ok(())
    } else {
        Err(ValidationError::new("topic_name"))
    }
}

/// Push subscription response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscriptionResponse {
    /// Subscription ID
    pub id: String,
    /// Endpoint URL (partially masked for security)
    pub endpoint: String,
    /// Subscribed topics
    pub topics: Vec<String>,
    /// Created timestamp
    pub created_at: String,
}

/// Push preference of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPreferenceResponse {
    /// Whether the user has push enabled
    pub push_enabled: bool,
    /// Union of the topics of the user's devices
    pub topics: Vec<String>,
}

/// Push subscription service.
#[derive(Clone)]
pub struct PushService {
    subscription_repo: PushSubscriptionRepository,
    preference_repo: UserPushPreferenceRepository,
    vapid_config: Option<VapidConfig>,
}

impl PushService {
    /// Create a new push service.
    #[must_use]
    pub const fn new(
        subscription_repo: PushSubscriptionRepository,
        preference_repo: UserPushPreferenceRepository,
        vapid_config: Option<VapidConfig>,
    ) -> Self {
        Self {
            subscription_repo,
            preference_repo,
            vapid_config,
        }
    }

    /// Check if push notifications are configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.vapid_config.is_some()
    }

    /// VAPID public key handed to browsers as the application server key.
    pub fn public_key(&self) -> AppResult<&str> {
        self.vapid_config
            .as_ref()
            .map(|c| c.public_key.as_str())
            .ok_or_else(|| AppError::Unavailable("Push notifications not configured".to_string()))
    }

    /// Store a device subscription for `user_id`.
    ///
    /// A known endpoint is rebound to the calling user with fresh keys and
    /// topics; a browser only ever holds one subscription per origin. A
    /// previous owner left without devices has their preference turned off.
    pub async fn register(
        &self,
        user_id: &str,
        input: SubscribeInput,
        user_agent: Option<String>,
    ) -> AppResult<PushSubscriptionResponse> {
        input.validate()?;

        if input.user_id != user_id {
            return Err(AppError::Forbidden(
                "Cannot register a subscription for another user".to_string(),
            ));
        }

        let subscription = input.subscription;
        validate_endpoint(&subscription.endpoint)?;
        validate_key(&subscription.keys.p256dh, P256DH_LEN, "p256dh")?;
        validate_key(&subscription.keys.auth, AUTH_SECRET_LEN, "auth")?;
        if decode_key(&subscription.keys.p256dh).first() != Some(&0x04) {
            return Err(AppError::Validation(
                "p256dh must be an uncompressed P-256 point".to_string(),
            ));
        }

        let topics: Vec<String> = input
            .topics
            .iter()
            .map(|t| t.trim().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let now = Utc::now();

        if let Some(existing) = self
            .subscription_repo
            .find_by_endpoint(&subscription.endpoint)
            .await?
        {
            let previous_user_id = existing.user_id.clone();
            if previous_user_id != user_id {
                tracing::info!(
                    subscription_id = %existing.id,
                    previous_user_id = %previous_user_id,
                    user_id = %user_id,
                    "Rebinding push subscription to new user"
                );
            }

            let mut active: push_subscription::ActiveModel = existing.into();
            active.user_id = Set(user_id.to_string());
            active.p256dh = Set(subscription.keys.p256dh);
            active.auth = Set(subscription.keys.auth);
            active.topics = Set(serde_json::json!(topics));
            active.expiration_time = Set(subscription.expiration_time);
            active.user_agent = Set(user_agent);
            active.updated_at = Set(Some(now.into()));

            let updated = self.subscription_repo.update(active).await?;
            if previous_user_id != user_id {
                self.disable_if_no_devices(&previous_user_id).await?;
            }
            return Ok(to_response(updated));
        }

        let model = push_subscription::ActiveModel {
            id: Set(crate::generate_id()),
            user_id: Set(user_id.to_string()),
            endpoint: Set(subscription.endpoint),
            p256dh: Set(subscription.keys.p256dh),
            auth: Set(subscription.keys.auth),
            topics: Set(serde_json::json!(topics)),
            expiration_time: Set(subscription.expiration_time),
            user_agent: Set(user_agent),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        let created = self.subscription_repo.create(model).await?;
        tracing::debug!(subscription_id = %created.id, user_id = %user_id, "Push subscription registered");
        Ok(to_response(created))
    }

    /// Remove a device subscription by endpoint URL.
    ///
    /// Removing the user's last device turns the preference off.
    pub async fn unregister_by_endpoint(&self, user_id: &str, endpoint: &str) -> AppResult<()> {
        let Some(subscription) = self.subscription_repo.find_by_endpoint(endpoint).await? else {
            return Err(AppError::NotFound("Subscription not found".to_string()));
        };

        if subscription.user_id != user_id {
            return Err(AppError::Forbidden(
                "You don't own this subscription".to_string(),
            ));
        }

        self.subscription_repo.delete(&subscription.id).await?;
        self.disable_if_no_devices(user_id).await
    }

    async fn disable_if_no_devices(&self, user_id: &str) -> AppResult<()> {
        if self.subscription_repo.count_by_user(user_id).await? == 0
            && self
                .preference_repo
                .find(user_id)
                .await?
                .is_some_and(|p| p.push_enabled)
        {
            self.preference_repo.upsert(user_id, false).await?;
            tracing::info!(user_id = %user_id, "Last push device removed, preference disabled");
        }
        Ok(())
    }

    /// Current push preference. Users without a record read as disabled.
    pub async fn preference(&self, user_id: &str) -> AppResult<PushPreferenceResponse> {
        let push_enabled = self
            .preference_repo
            .find(user_id)
            .await?
            .is_some_and(|p| p.push_enabled);

        let topics: BTreeSet<String> = self
            .subscription_repo
            .find_by_user_id(user_id)
            .await?
            .iter()
            .flat_map(push_subscription::Model::topic_list)
            .collect();

        Ok(PushPreferenceResponse {
            push_enabled,
            topics: topics.into_iter().collect(),
        })
    }

    /// Flip the push preference.
    ///
    /// Enabling requires at least one registered device subscription.
    pub async fn set_preference(
        &self,
        user_id: &str,
        enabled: bool,
    ) -> AppResult<PushPreferenceResponse> {
        if enabled && self.subscription_repo.count_by_user(user_id).await? == 0 {
            return Err(AppError::Conflict(
                "No push subscription registered for this user".to_string(),
            ));
        }

        self.preference_repo.upsert(user_id, enabled).await?;
        tracing::debug!(user_id = %user_id, enabled, "Push preference updated");

        self.preference(user_id).await
    }
}

fn validate_endpoint(endpoint: &str) -> AppResult<()> {
    let url = url::Url::parse(endpoint)
        .map_err(|e| AppError::Validation(format!("Invalid endpoint: {e}")))?;
    if url.scheme() != "https" {
        return Err(AppError::Validation(
            "Push endpoint must use https".to_string(),
        ));
    }
    Ok(())
}

fn decode_key(value: &str) -> Vec<u8> {
    URL_SAFE_NO_PAD
        .decode(value.trim_end_matches('='))
        .unwrap_or_default()
}

fn validate_key(value: &str, expected_len: usize, name: &str) -> AppResult<()> {
    if decode_key(value).len() == expected_len {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "{name} must be {expected_len} bytes of base64url"
        )))
    }
}

/// Convert model to response.
fn to_response(model: push_subscription::Model) -> PushSubscriptionResponse {
    let topics = model.topic_list();

    // Mask the endpoint for security (show only domain)
    let masked_endpoint = url::Url::parse(&model.endpoint)
        .ok()
        .and_then(|u| u.host_str().map(|h| format!("https://{h}/***/")))
        .unwrap_or_else(|| "***".to_string());

    PushSubscriptionResponse {
        id: model.id,
        endpoint: masked_endpoint,
        topics,
        created_at: model.created_at.to_rfc3339(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use campus_db::test_utils::TestDatabase;

    // 65-byte uncompressed point and 16-byte secret, base64url without padding.
    fn p256dh() -> String {
        let mut bytes = vec![0x04];
        bytes.extend(std::iter::repeat_n(7u8, 64));
        URL_SAFE_NO_PAD.encode(bytes)
    }

    fn auth() -> String {
        URL_SAFE_NO_PAD.encode([9u8; 16])
    }

    fn input(user_id: &str, endpoint: &str, topics: &[&str]) -> SubscribeInput {
        SubscribeInput {
            subscription: CreateSubscriptionInput {
                endpoint: endpoint.to_string(),
                expiration_time: None,
                keys: SubscriptionKeysInput {
                    p256dh: p256dh(),
                    auth: auth(),
                },
            },
            topics: topics.iter().map(|t| (*t).to_string()).collect(),
            user_id: user_id.to_string(),
        }
    }

    async fn service() -> PushService {
        let db = TestDatabase::new().await.unwrap().into_shared();
        PushService::new(
            PushSubscriptionRepository::new(db.clone()),
            UserPushPreferenceRepository::new(db),
            Some(VapidConfig {
                public_key: "BKey".to_string(),
            }),
        )
    }

    #[tokio::test]
    async fn test_public_key_unavailable_without_vapid() {
        let db = TestDatabase::new().await.unwrap().into_shared();
        let service = PushService::new(
            PushSubscriptionRepository::new(db.clone()),
            UserPushPreferenceRepository::new(db),
            None,
        );
        assert!(!service.is_enabled());
        assert!(matches!(service.public_key(), Err(AppError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_enable_requires_subscription() {
        let service = service().await;

        let result = service.set_preference("u123", true).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert!(!service.preference("u123").await.unwrap().push_enabled);

        service
            .register("u123", input("u123", "https://push.example.net/a", &["announcements"]), None)
            .await
            .unwrap();
        let preference = service.set_preference("u123", true).await.unwrap();
        assert_eq!(
            preference,
            PushPreferenceResponse {
                push_enabled: true,
                topics: vec!["announcements".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn test_register_same_endpoint_rebinds() {
        let service = service().await;

        let first = service
            .register("u1", input("u1", "https://push.example.net/a", &["exams"]), None)
            .await
            .unwrap();
        service.set_preference("u1", true).await.unwrap();
        let second = service
            .register("u2", input("u2", "https://push.example.net/a", &["events", "events"]), None)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.topics, vec!["events".to_string()]);
        assert_eq!(second.endpoint, "https://push.example.net/***/");
        let previous_owner = service.preference("u1").await.unwrap();
        assert!(previous_owner.topics.is_empty());
        assert!(!previous_owner.push_enabled);
        assert!(!service.preference("u2").await.unwrap().push_enabled);
    }

    #[tokio::test]
    async fn test_rebind_keeps_preference_of_owner_with_other_devices() {
        let service = service().await;

        for endpoint in ["https://push.example.net/a", "https://push.example.net/b"] {
            service
                .register("u1", input("u1", endpoint, &["exams"]), None)
                .await
                .unwrap();
        }
        service.set_preference("u1", true).await.unwrap();

        service
            .register("u2", input("u2", "https://push.example.net/a", &["exams"]), None)
            .await
            .unwrap();
        assert!(service.preference("u1").await.unwrap().push_enabled);

        // same owner re-registering never touches the preference
        service
            .register("u1", input("u1", "https://push.example.net/b", &["events"]), None)
            .await
            .unwrap();
        assert!(service.preference("u1").await.unwrap().push_enabled);
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let service = service().await;

        let other_user = service
            .register("u1", input("u2", "https://push.example.net/a", &[]), None)
            .await;
        assert!(matches!(other_user, Err(AppError::Forbidden(_))));

        let plain_http = service
            .register("u1", input("u1", "http://push.example.net/a", &[]), None)
            .await;
        assert!(matches!(plain_http, Err(AppError::Validation(_))));

        let mut short_key = input("u1", "https://push.example.net/a", &[]);
        short_key.subscription.keys.auth = URL_SAFE_NO_PAD.encode([1u8; 4]);
        assert!(matches!(
            service.register("u1", short_key, None).await,
            Err(AppError::Validation(_))
        ));

        let blank_topic = service
            .register("u1", input("u1", "https://push.example.net/a", &["  "]), None)
            .await;
        assert!(matches!(blank_topic, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unregister_last_device_disables_preference() {
        let service = service().await;

        service
            .register("u1", input("u1", "https://push.example.net/a", &["announcements"]), None)
            .await
            .unwrap();
        service
            .register("u1", input("u1", "https://push.example.net/b", &["exams"]), None)
            .await
            .unwrap();
        service.set_preference("u1", true).await.unwrap();

        service
            .unregister_by_endpoint("u1", "https://push.example.net/a")
            .await
            .unwrap();
        assert!(service.preference("u1").await.unwrap().push_enabled);

        service
            .unregister_by_endpoint("u1", "https://push.example.net/b")
            .await
            .unwrap();
        let preference = service.preference("u1").await.unwrap();
        assert!(!preference.push_enabled);
        assert!(preference.topics.is_empty());
    }

    #[tokio::test]
    async fn test_unregister_checks_ownership() {
        let service = service().await;

        service
            .register("u1", input("u1", "https://push.example.net/a", &[]), None)
            .await
            .unwrap();

        assert!(matches!(
            service
                .unregister_by_endpoint("u2", "https://push.example.net/a")
                .await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service
                .unregister_by_endpoint("u1", "https://push.example.net/missing")
                .await,
            Err(AppError::NotFound(_))
        ));
    }
}
