//! Per-user push preference entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether a user wants push notifications. Only the flag ever changes;
/// records are never deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_push_preference")]
pub struct Model {
    /// User ID
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    /// Push enabled flag
    pub push_enabled: bool,

    /// Timestamp when the preference was last changed
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
