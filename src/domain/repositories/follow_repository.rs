//! Repository trait for student follows.

use crate::domain::entities::Follow;
use crate::error::AppError;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Returns `false` if the follow already existed.
    async fn follow(&self, follower: &str, followed: &str) -> Result<bool, AppError>;

    /// Returns `false` if there was nothing to remove.
    async fn unfollow(&self, follower: &str, followed: &str) -> Result<bool, AppError>;

    /// Who `regno` follows.
    async fn following(&self, regno: &str) -> Result<Vec<Follow>, AppError>;

    /// Who follows `regno`.
    async fn followers(&self, regno: &str) -> Result<Vec<Follow>, AppError>;
}
