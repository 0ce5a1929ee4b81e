//! Cookie session service.

use campus_common::{AppError, AppResult, IdGenerator, hash_token};
use campus_db::entities::session;
use campus_db::repositories::SessionRepository;
use chrono::{DateTime, Duration, Utc};
use sea_orm::Set;

pub use campus_common::SESSION_COOKIE;

/// A freshly issued session. `token` is only ever returned here.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and resolves cookie sessions.
#[derive(Clone)]
pub struct SessionService {
    repo: SessionRepository,
    id_gen: IdGenerator,
}

impl SessionService {
    /// Create a new session service.
    #[must_use]
    pub const fn new(repo: SessionRepository) -> Self {
        Self {
            repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Issue a session for `user_id` valid for `ttl`.
    pub async fn issue(&self, user_id: &str, ttl: Duration) -> AppResult<IssuedSession> {
        let token = self.id_gen.generate_token();
        let now = Utc::now();
        let expires_at = now + ttl;

        self.repo
            .create(session::ActiveModel {
                id: Set(self.id_gen.generate()),
                token_hash: Set(hash_token(&token)),
                user_id: Set(user_id.to_string()),
                created_at: Set(now.into()),
                expires_at: Set(expires_at.into()),
            })
            .await?;

        Ok(IssuedSession {
            token,
            user_id: user_id.to_string(),
            expires_at,
        })
    }

    /// Resolve a session token to its user ID.
    pub async fn authenticate(&self, token: &str) -> AppResult<String> {
        let digest = hash_token(token);
        let session = self
            .repo
            .find_by_token_hash(&digest)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if session.expires_at <= Utc::now() {
            self.repo.delete_by_token_hash(&digest).await?;
            return Err(AppError::Unauthorized);
        }

        Ok(session.user_id)
    }

    /// Revoke a session (logout).
    pub async fn revoke(&self, token: &str) -> AppResult<()> {
        self.repo.delete_by_token_hash(&hash_token(token)).await?;
        Ok(())
    }

    /// Remove expired sessions.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        self.repo.delete_expired().await
    }
}
