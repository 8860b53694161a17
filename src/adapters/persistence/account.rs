use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
    adapters::persistence::credential::CREDENTIAL_COLUMNS,
    app_error::{AppError, AppResult},
    domain::entities::credential::Credential,
    use_cases::user::{AccountTransaction, UserProfile},
};

/// Account writes sharing one database transaction. Rolled back on drop
/// unless committed.
pub struct PgAccountTransaction {
    tx: Transaction<'static, Postgres>,
}

impl PgAccountTransaction {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl AccountTransaction for PgAccountTransaction {
    async fn create_user(&mut self, email: &str, name: &str) -> AppResult<UserProfile> {
        let id = Uuid::new_v4();

        sqlx::query("INSERT INTO users (id) VALUES ($1)")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(AppError::from)?;

        sqlx::query("INSERT INTO user_emails (user_id, email, is_primary) VALUES ($1, $2, TRUE)")
            .bind(id)
            .bind(email)
            .execute(&mut *self.tx)
            .await
            .map_err(|err| match AppError::from(err) {
                AppError::Conflict(_) => AppError::Conflict("Email is already registered".into()),
                other => other,
            })?;

        sqlx::query("INSERT INTO user_profiles (user_id, name) VALUES ($1, $2)")
            .bind(id)
            .bind(name)
            .execute(&mut *self.tx)
            .await
            .map_err(AppError::from)?;

        Ok(UserProfile {
            id,
            email: email.to_string(),
            name: name.to_string(),
        })
    }

    async fn deactivate_credentials(&mut self, user_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE credentials SET active = FALSE WHERE user_id = $1 AND active")
            .bind(user_id)
            .execute(&mut *self.tx)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn insert_active_credential(
        &mut self,
        user_id: Uuid,
        password_hash: &str,
    ) -> AppResult<Credential> {
        // created_at, rotation_checkpoint and updated_at all default to now().
        let sql = format!(
            "INSERT INTO credentials (id, user_id, password_hash, active) \
             VALUES ($1, $2, $3, TRUE) RETURNING {CREDENTIAL_COLUMNS}"
        );
        sqlx::query_as::<_, Credential>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(password_hash)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(AppError::from)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await.map_err(AppError::from)
    }
}
