//! User push preference repository.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::entities::user_push_preference::{ActiveModel, Entity, Model};
use campus_common::{AppError, AppResult};

/// Repository for per-user push preferences.
#[derive(Clone)]
pub struct UserPushPreferenceRepository {
    db: Arc<DatabaseConnection>,
}

impl UserPushPreferenceRepository {
    /// Create a new preference repository.
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the preference record for a user.
    pub async fn find(&self, user_id: &str) -> AppResult<Option<Model>> {
        Entity::find_by_id(user_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update the flag for a user.
    pub async fn upsert(&self, user_id: &str, push_enabled: bool) -> AppResult<Model> {
        let now = Utc::now();

        match self.find(user_id).await? {
            Some(existing) => {
                let mut active: ActiveModel = existing.into();
                active.push_enabled = Set(push_enabled);
                active.updated_at = Set(now.into());
                active
                    .update(self.db.as_ref())
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            }
            None => ActiveModel {
                user_id: Set(user_id.to_string()),
                push_enabled: Set(push_enabled),
                updated_at: Set(now.into()),
            }
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::TestDatabase;

    #[tokio::test]
    async fn test_upsert_creates_then_flips() {
        let repo =
            UserPushPreferenceRepository::new(TestDatabase::new().await.unwrap().into_shared());

        assert!(repo.find("u1").await.unwrap().is_none());

        let created = repo.upsert("u1", true).await.unwrap();
        assert!(created.push_enabled);

        let flipped = repo.upsert("u1", false).await.unwrap();
        assert!(!flipped.push_enabled);
        assert!(flipped.updated_at >= created.updated_at);

        assert!(!repo.find("u1").await.unwrap().unwrap().push_enabled);
    }
}
