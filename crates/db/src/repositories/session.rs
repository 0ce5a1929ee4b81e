//! Session repository.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::entities::session::{ActiveModel, Column, Entity, Model};
use campus_common::{AppError, AppResult};

/// Repository for cookie sessions.
#[derive(Clone)]
pub struct SessionRepository {
    db: Arc<DatabaseConnection>,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a session.
    pub async fn create(&self, session: ActiveModel) -> AppResult<Model> {
        session
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a session by token digest.
    pub async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Model>> {
        Entity::find()
            .filter(Column::TokenHash.eq(token_hash))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a session by token digest.
    pub async fn delete_by_token_hash(&self, token_hash: &str) -> AppResult<u64> {
        let result = Entity::delete_many()
            .filter(Column::TokenHash.eq(token_hash))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Delete sessions past their expiry.
    pub async fn delete_expired(&self) -> AppResult<u64> {
        let now = Utc::now().fixed_offset();
        let result = Entity::delete_many()
            .filter(Column::ExpiresAt.lt(now))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::TestDatabase;
    use chrono::Duration;
    use sea_orm::Set;

    fn session(id: &str, token_hash: &str, expires_in: Duration) -> ActiveModel {
        let now = Utc::now();
        ActiveModel {
            id: Set(id.to_string()),
            token_hash: Set(token_hash.to_string()),
            user_id: Set("u1".to_string()),
            created_at: Set(now.into()),
            expires_at: Set((now + expires_in).into()),
        }
    }

    #[tokio::test]
    async fn test_delete_expired_keeps_live_sessions() {
        let repo = SessionRepository::new(TestDatabase::new().await.unwrap().into_shared());

        repo.create(session("a", "live", Duration::hours(1)))
            .await
            .unwrap();
        repo.create(session("b", "stale", Duration::hours(-1)))
            .await
            .unwrap();

        assert_eq!(repo.delete_expired().await.unwrap(), 1);
        assert!(repo.find_by_token_hash("live").await.unwrap().is_some());
        assert!(repo.find_by_token_hash("stale").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_by_token_hash() {
        let repo = SessionRepository::new(TestDatabase::new().await.unwrap().into_shared());

        repo.create(session("a", "digest", Duration::hours(1)))
            .await
            .unwrap();
        assert_eq!(repo.delete_by_token_hash("digest").await.unwrap(), 1);
        assert_eq!(repo.delete_by_token_hash("digest").await.unwrap(), 0);
    }
}
