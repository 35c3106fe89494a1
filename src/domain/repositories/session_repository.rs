//! Repository trait for login sessions.

use crate::domain::entities::{Principal, SessionOwner};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Server-side sessions keyed by the HMAC hash of the cookie token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(
        &self,
        token_hash: &str,
        owner: SessionOwner,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Resolves an unexpired session to its owner.
    ///
    /// Returns `Ok(None)` for unknown or expired sessions.
    async fn resolve(&self, token_hash: &str) -> Result<Option<Principal>, AppError>;

    async fn delete(&self, token_hash: &str) -> Result<(), AppError>;

    /// Deletes every session of an admin, used after a credential change.
    async fn delete_for_admin(&self, admin_id: i64) -> Result<(), AppError>;

    /// Deletes expired sessions and returns how many were removed.
    async fn purge_expired(&self) -> Result<u64, AppError>;
}
