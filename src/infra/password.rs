use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::{
    app_error::{AppError, AppResult},
    use_cases::user::PasswordHasher,
};

/// bcrypt with a per-hash random salt. Runs on the blocking pool since a
/// single hash at the default cost takes tens of milliseconds.
///
/// bcrypt only reads the first 72 bytes of its input, so the password is
/// reduced to a 64-character SHA-256 hex digest first.
#[derive(Clone)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

fn prehash(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, password: &str) -> AppResult<String> {
        let password = prehash(password);
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    async fn verify(&self, password: &str, hash: &str) -> AppResult<bool> {
        let password = prehash(password);
        let hash = hash.to_owned();
        let matched = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        // A stored hash bcrypt cannot parse is treated as a mismatch.
        Ok(matched.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Stored password hash could not be parsed");
            false
        }))
    }
}
