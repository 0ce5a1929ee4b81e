//! Push subscription entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A browser push subscription bound to a user and a set of topics.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "push_subscription")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// User the device is currently bound to
    #[sea_orm(indexed)]
    pub user_id: String,

    /// Push service endpoint URL (unique per device)
    #[sea_orm(column_type = "Text", unique)]
    pub endpoint: String,

    /// P256DH public key (base64url)
    pub p256dh: String,

    /// Auth secret (base64url)
    pub auth: String,

    /// Subscribed topics (JSON array of strings)
    pub topics: Json,

    /// Expiration reported by the push service (epoch millis)
    #[sea_orm(nullable)]
    pub expiration_time: Option<i64>,

    /// User agent of the subscribing device
    #[sea_orm(nullable)]
    pub user_agent: Option<String>,

    /// Timestamp when the subscription was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the subscription was last updated
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Topics as plain strings.
    #[must_use]
    pub fn topic_list(&self) -> Vec<String> {
        self.topics
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
