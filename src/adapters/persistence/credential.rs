use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::credential::{Credential, Rotation},
    use_cases::user::CredentialRepo,
};

pub(super) const CREDENTIAL_COLUMNS: &str =
    "id, user_id, password_hash, active, created_at, rotation_checkpoint, updated_at";

#[async_trait]
impl CredentialRepo for PostgresPersistence {
    async fn find_active(&self, user_id: Uuid) -> AppResult<Option<Credential>> {
        let sql =
            format!("SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE user_id = $1 AND active");
        sqlx::query_as::<_, Credential>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn rotate(&self, user_id: Uuid, rotation: Rotation) -> AppResult<Option<Credential>> {
        // Single statement so the bump is atomic per row. GREATEST keeps the
        // timestamps strictly increasing even within one clock tick.
        let sql = format!(
            r#"
                UPDATE credentials
                SET updated_at = GREATEST(clock_timestamp(), updated_at + INTERVAL '1 microsecond'),
                    rotation_checkpoint = CASE
                        WHEN $2 THEN GREATEST(clock_timestamp(), rotation_checkpoint + INTERVAL '1 microsecond')
                        ELSE rotation_checkpoint
                    END
                WHERE user_id = $1 AND active
                RETURNING {CREDENTIAL_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Credential>(&sql)
            .bind(user_id)
            .bind(rotation.touches_checkpoint())
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }
}
