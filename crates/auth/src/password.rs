//! Password hashing (bcrypt). Hashing is CPU-bound, so the async helpers hop
//! onto the blocking pool.

use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("bcrypt failure: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: bcrypt::DEFAULT_COST }
    }
}

impl PasswordHasher {
    /// `cost` is clamped into bcrypt's accepted range (4..=31).
    pub fn with_cost(cost: u32) -> Self {
        Self { cost: cost.clamp(4, 31) }
    }

    #[instrument(skip_all, fields(cost = self.cost), err)]
    pub async fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let password = password.to_owned();
        let cost = self.cost;
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(hashed)
    }

    /// `false` on mismatch and on a malformed stored hash.
    #[instrument(skip_all, err)]
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        let ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false)).await?;
        Ok(ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hasher = PasswordHasher::with_cost(4);
        let hash = hasher.hash("correct horse").await.unwrap();
        assert_ne!(hash, "correct horse");
        assert!(hasher.verify("correct horse", &hash).await.unwrap());
        assert!(!hasher.verify("wrong horse", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_does_not_verify() {
        let hasher = PasswordHasher::with_cost(4);
        assert!(!hasher.verify("anything", "not-a-bcrypt-hash").await.unwrap());
    }
}
