use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};
use time::Duration;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        jwt::{self, TokenPayload},
        validators::{self, FieldErrors},
    },
    domain::entities::{
        credential::{Credential, Rotation},
        token_class::TokenClass,
    },
    infra::key_derivation::SecretDeriver,
};

// ============================================================================
// Ports
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

/// Writes that create an account. Nothing is visible to other callers until
/// `commit`; dropping the value without committing discards every write.
#[async_trait]
pub trait AccountTransaction: Send {
    /// Insert the user, its primary email and its profile.
    /// Fails with `Conflict` when the email is already registered.
    async fn create_user(&mut self, email: &str, name: &str) -> AppResult<UserProfile>;
    /// Mark every active credential of `user_id` inactive.
    async fn deactivate_credentials(&mut self, user_id: Uuid) -> AppResult<()>;
    /// Insert a new active credential with all timestamps set to now.
    async fn insert_active_credential(
        &mut self,
        user_id: Uuid,
        password_hash: &str,
    ) -> AppResult<Credential>;
    async fn commit(self: Box<Self>) -> AppResult<()>;
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn begin_account(&self) -> AppResult<Box<dyn AccountTransaction>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserProfile>>;
    async fn get_profile_by_id(&self, user_id: Uuid) -> AppResult<Option<UserProfile>>;
}

#[async_trait]
pub trait CredentialRepo: Send + Sync {
    async fn find_active(&self, user_id: Uuid) -> AppResult<Option<Credential>>;
    /// Atomically bump the timestamps selected by `rotation` on the active
    /// credential and return the updated row.
    async fn rotate(&self, user_id: Uuid, rotation: Rotation) -> AppResult<Option<Credential>>;
}

#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &str) -> AppResult<String>;
    async fn verify(&self, password: &str, hash: &str) -> AppResult<bool>;
}

// ============================================================================
// Session settings and results
// ============================================================================

/// Token lifetimes and the audience/issuer value stamped into every token.
#[derive(Clone, Debug)]
pub struct TokenSettings {
    pub audience: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub keep_logged_in_ttl: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedTokens {
    pub jwt: String,
    pub refresh_token: String,
}

/// Identity proven by a verified token. Handed to handlers by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub class: TokenClass,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MeProfile {
    pub email: String,
    pub name: String,
    pub avatar_url: String,
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct AuthUseCases {
    users: Arc<dyn UserRepo>,
    credentials: Arc<dyn CredentialRepo>,
    hasher: Arc<dyn PasswordHasher>,
    secrets: SecretDeriver,
    settings: TokenSettings,
}

impl AuthUseCases {
    pub fn new(
        users: Arc<dyn UserRepo>,
        credentials: Arc<dyn CredentialRepo>,
        hasher: Arc<dyn PasswordHasher>,
        secrets: SecretDeriver,
        settings: TokenSettings,
    ) -> Self {
        Self {
            users,
            credentials,
            hasher,
            secrets,
            settings,
        }
    }

    #[cfg(test)]
    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    /// Create an account and open its first session.
    #[instrument(skip(self, password))]
    pub async fn signup(&self, email: &str, password: &str, name: &str) -> AppResult<IssuedTokens> {
        let email = validators::normalize_email(email);
        let name = name.trim();

        let mut errors = FieldErrors::new();
        errors
            .check(validators::is_valid_email(&email), "email", validators::EMAIL_MESSAGE)
            .check(validators::is_valid_password(password), "password", validators::PASSWORD_MESSAGE)
            .check(validators::is_valid_name(name), "name", validators::NAME_MESSAGE);
        errors.finish()?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email is already registered".into()));
        }

        let password_hash = self.hasher.hash(password).await?;

        let mut account = self.users.begin_account().await?;
        let user = account.create_user(&email, name).await?;
        account.deactivate_credentials(user.id).await?;
        let credential = account
            .insert_active_credential(user.id, &password_hash)
            .await?;
        account.commit().await?;

        tracing::info!(user_id = %user.id, "Account created");
        self.issue_pair(&credential, self.settings.refresh_token_ttl)
    }

    /// Check the password, rotate both secrets, and issue a fresh pair.
    /// Every token issued before this call stops verifying.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        keep_logged_in: bool,
    ) -> AppResult<IssuedTokens> {
        let email = validators::normalize_email(email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            return Err(AppError::InvalidCredentials);
        };
        let Some(credential) = self.credentials.find_active(user.id).await? else {
            return Err(AppError::InvalidCredentials);
        };
        if !self
            .hasher
            .verify(password, &credential.password_hash)
            .await?
        {
            return Err(AppError::InvalidCredentials);
        }

        let credential = self
            .credentials
            .rotate(user.id, Rotation::All)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let refresh_ttl = if keep_logged_in {
            self.settings.keep_logged_in_ttl
        } else {
            self.settings.refresh_token_ttl
        };

        tracing::info!(user_id = %user.id, keep_logged_in, "User logged in");
        self.issue_pair(&credential, refresh_ttl)
    }

    /// Issue a new access token for a caller holding a verified refresh token.
    /// Older access tokens die; the refresh token keeps working.
    #[instrument(skip(self))]
    pub async fn refresh_access_token(&self, identity: AuthUser) -> AppResult<String> {
        ensure_class(identity, TokenClass::Refresh)?;

        let credential = self
            .credentials
            .rotate(identity.user_id, Rotation::AccessOnly)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        self.issue(&credential, TokenClass::Access, self.settings.access_token_ttl)
    }

    /// Invalidate every outstanding token of the caller.
    #[instrument(skip(self))]
    pub async fn logout(&self, identity: AuthUser) -> AppResult<()> {
        ensure_class(identity, TokenClass::Refresh)?;

        self.credentials
            .rotate(identity.user_id, Rotation::All)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        tracing::info!(user_id = %identity.user_id, "User logged out");
        Ok(())
    }

    /// Verify `raw_token` as a token of `class`.
    ///
    /// The unverified payload only picks whose credential to load; the
    /// signature is then checked against the secret derived from that
    /// credential's current timestamps.
    #[instrument(skip(self, raw_token))]
    pub async fn authenticate(&self, raw_token: &str, class: TokenClass) -> AppResult<AuthUser> {
        let user_id = jwt::decode_unverified(raw_token)
            .and_then(|claims| claims.user_id())
            .map_err(|err| {
                tracing::debug!(error = %err, "Token could not be decoded");
                AppError::InvalidCredentials
            })?;

        let Some(credential) = self.credentials.find_active(user_id).await? else {
            tracing::debug!(%user_id, "No active credential for token subject");
            return Err(AppError::InvalidCredentials);
        };

        let secret = self.secrets.secret_for(class, &credential);
        let claims = jwt::verify(raw_token, &secret, &self.settings.audience).map_err(|err| {
            tracing::debug!(%user_id, error = %err, "Token rejected");
            AppError::InvalidCredentials
        })?;

        if claims.token_type != class {
            tracing::debug!(%user_id, expected = %class, got = %claims.token_type, "Token class mismatch");
            return Err(AppError::InvalidCredentials);
        }

        Ok(AuthUser { user_id, class })
    }

    /// Profile of the authenticated caller.
    #[instrument(skip(self))]
    pub async fn me(&self, user_id: Uuid) -> AppResult<MeProfile> {
        let profile = self
            .users
            .get_profile_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".into()))?;

        Ok(MeProfile {
            avatar_url: gravatar_url(&profile.email),
            email: profile.email,
            name: profile.name,
        })
    }

    /// Secret the caller's current tokens of `class` must verify against.
    #[cfg(test)]
    pub fn current_secret(
        &self,
        class: TokenClass,
        credential: &Credential,
    ) -> secrecy::SecretString {
        self.secrets.secret_for(class, credential)
    }

    fn issue_pair(&self, credential: &Credential, refresh_ttl: Duration) -> AppResult<IssuedTokens> {
        Ok(IssuedTokens {
            jwt: self.issue(credential, TokenClass::Access, self.settings.access_token_ttl)?,
            refresh_token: self.issue(credential, TokenClass::Refresh, refresh_ttl)?,
        })
    }

    fn issue(&self, credential: &Credential, class: TokenClass, ttl: Duration) -> AppResult<String> {
        let secret = self.secrets.secret_for(class, credential);
        jwt::issue(
            TokenPayload {
                user_id: credential.user_id,
                class,
            },
            &secret,
            ttl,
            &self.settings.audience,
        )
    }
}

fn ensure_class(identity: AuthUser, expected: TokenClass) -> AppResult<()> {
    if identity.class == expected {
        Ok(())
    } else {
        Err(AppError::InvalidCredentials)
    }
}

/// Gravatar URL for `email`, falling back to the mystery-person image.
pub fn gravatar_url(email: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.trim().to_lowercase().as_bytes());
    let hash = hex::encode(hasher.finalize());
    format!("https://www.gravatar.com/avatar/{}?d=mm&s=200", hash)
}
