use chrono::{DateTime, Utc};
use hkdf::Hkdf;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use uuid::Uuid;

use crate::domain::entities::{credential::Credential, token_class::TokenClass};

/// Derives per-user token signing secrets from the global seeds and the
/// credential's rotation timestamps.
///
/// Access secret: `HKDF(access_seed, salt = user_id, info = "access-token-v1:{created_at}:{updated_at}")`
/// Refresh secret: `HKDF(refresh_seed, salt = user_id, info = "refresh-token-v1:{created_at}:{rotation_checkpoint}")`
///
/// Timestamps enter as unix microseconds, the precision Postgres keeps, so a
/// credential read back from the database derives the same secret it was
/// issued with. Any bump of a timestamp yields a new secret and every token
/// signed with the old one stops verifying.
#[derive(Clone)]
pub struct SecretDeriver {
    access_seed: SecretString,
    refresh_seed: SecretString,
}

impl SecretDeriver {
    pub fn new(access_seed: SecretString, refresh_seed: SecretString) -> Self {
        Self {
            access_seed,
            refresh_seed,
        }
    }

    pub fn access_secret(&self, credential: &Credential) -> SecretString {
        derive(
            &self.access_seed,
            "access-token-v1",
            &credential.user_id,
            credential.created_at,
            credential.updated_at,
        )
    }

    pub fn refresh_secret(&self, credential: &Credential) -> SecretString {
        derive(
            &self.refresh_seed,
            "refresh-token-v1",
            &credential.user_id,
            credential.created_at,
            credential.rotation_checkpoint,
        )
    }

    pub fn secret_for(&self, class: TokenClass, credential: &Credential) -> SecretString {
        match class {
            TokenClass::Access => self.access_secret(credential),
            TokenClass::Refresh => self.refresh_secret(credential),
        }
    }
}

fn derive(
    seed: &SecretString,
    label: &str,
    user_id: &Uuid,
    created_at: DateTime<Utc>,
    checkpoint: DateTime<Utc>,
) -> SecretString {
    let info = format!(
        "{}:{}:{}",
        label,
        created_at.timestamp_micros(),
        checkpoint.timestamp_micros()
    );

    let hk = Hkdf::<Sha256>::new(Some(user_id.as_bytes()), seed.expose_secret().as_bytes());
    let mut output = [0u8; 32];
    hk.expand(info.as_bytes(), &mut output)
        .expect("32 bytes is valid for SHA256 HKDF expand");

    SecretString::new(hex::encode(output).into())
}
