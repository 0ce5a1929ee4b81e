//! Push subscription repository.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

use crate::entities::push_subscription::{ActiveModel, Column, Entity, Model};
use campus_common::{AppError, AppResult};

/// Repository for push subscription operations.
#[derive(Clone)]
pub struct PushSubscriptionRepository {
    db: Arc<DatabaseConnection>,
}

impl PushSubscriptionRepository {
    /// Create a new push subscription repository.
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a push subscription by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<Model>> {
        Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a push subscription by ID or return an error.
    pub async fn get_by_id(&self, id: &str) -> AppResult<Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Push subscription {id} not found")))
    }

    /// Find a push subscription by endpoint.
    pub async fn find_by_endpoint(&self, endpoint: &str) -> AppResult<Option<Model>> {
        Entity::find()
            .filter(Column::Endpoint.eq(endpoint))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find all subscriptions for a user, newest first.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Vec<Model>> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_desc(Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new push subscription.
    pub async fn create(&self, subscription: ActiveModel) -> AppResult<Model> {
        subscription
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a push subscription.
    pub async fn update(&self, subscription: ActiveModel) -> AppResult<Model> {
        subscription
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a push subscription.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count subscriptions for a user.
    pub async fn count_by_user(&self, user_id: &str) -> AppResult<u64> {
        Entity::find()
            .filter(Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::TestDatabase;
    use chrono::Utc;
    use sea_orm::Set;

    fn subscription(id: &str, user_id: &str, endpoint: &str) -> ActiveModel {
        ActiveModel {
            id: Set(id.to_string()),
            user_id: Set(user_id.to_string()),
            endpoint: Set(endpoint.to_string()),
            p256dh: Set("p256dh".to_string()),
            auth: Set("auth".to_string()),
            topics: Set(serde_json::json!(["announcements"])),
            expiration_time: Set(None),
            user_agent: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_by_endpoint() {
        let repo = PushSubscriptionRepository::new(TestDatabase::new().await.unwrap().into_shared());

        repo.create(subscription("s1", "u1", "https://push.example.net/a"))
            .await
            .unwrap();

        let found = repo
            .find_by_endpoint("https://push.example.net/a")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.user_id, "u1");
        assert_eq!(found.topic_list(), vec!["announcements".to_string()]);
        assert!(
            repo.find_by_endpoint("https://push.example.net/missing")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_count_and_delete() {
        let repo = PushSubscriptionRepository::new(TestDatabase::new().await.unwrap().into_shared());

        repo.create(subscription("s1", "u1", "https://push.example.net/a"))
            .await
            .unwrap();
        repo.create(subscription("s2", "u1", "https://push.example.net/b"))
            .await
            .unwrap();
        repo.create(subscription("s3", "u2", "https://push.example.net/c"))
            .await
            .unwrap();

        assert_eq!(repo.count_by_user("u1").await.unwrap(), 2);
        repo.delete("s1").await.unwrap();
        assert_eq!(repo.count_by_user("u1").await.unwrap(), 1);
        assert_eq!(repo.find_by_user_id("u2").await.unwrap().len(), 1);
        assert!(matches!(
            repo.get_by_id("s1").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_endpoint_is_unique() {
        let repo = PushSubscriptionRepository::new(TestDatabase::new().await.unwrap().into_shared());

        repo.create(subscription("s1", "u1", "https://push.example.net/a"))
            .await
            .unwrap();
        let duplicate = repo
            .create(subscription("s2", "u2", "https://push.example.net/a"))
            .await;
        assert!(matches!(duplicate, Err(AppError::Database(_))));
    }
}
