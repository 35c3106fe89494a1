//! Password hashing with bcrypt.
//!
//! bcrypt is deliberately slow, so hashing and verification run on the
//! blocking thread pool instead of an async worker.

use serde_json::json;

use crate::error::AppError;

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_owned();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::internal("Password hashing failed", json!({ "error": e.to_string() })))?
            .map_err(AppError::from)
    }

    /// Returns `false` for a wrong password and for a malformed hash.
    pub async fn verify(&self, password: &str, hash: &str) -> bool {
        let password = password.to_owned();
        let hash = hash.to_owned();

        match tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await {
            Ok(Ok(valid)) => valid,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "Password verification task failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash("correct horse").await.unwrap();

        assert!(hasher.verify("correct horse", &hash).await);
        assert!(!hasher.verify("wrong horse", &hash).await);
    }

    #[tokio::test]
    async fn test_malformed_hash_does_not_verify() {
        let hasher = PasswordHasher::new(4);
        assert!(!hasher.verify("anything", "not-a-bcrypt-hash").await);
    }
}
