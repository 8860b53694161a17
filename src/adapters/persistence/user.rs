use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, account::PgAccountTransaction},
    app_error::{AppError, AppResult},
    use_cases::user::{AccountTransaction, UserProfile, UserRepo},
};

// Joined view of users, user_emails (primary) and user_profiles.
#[derive(sqlx::FromRow, Debug)]
struct UserDb {
    id: Uuid,
    email: String,
    name: String,
}

impl From<UserDb> for UserProfile {
    fn from(rec: UserDb) -> Self {
        UserProfile {
            id: rec.id,
            email: rec.email,
            name: rec.name,
        }
    }
}

#[async_trait]
impl UserRepo for PostgresPersistence {
    async fn begin_account(&self) -> AppResult<Box<dyn AccountTransaction>> {
        let tx = self.pool.begin().await.map_err(AppError::from)?;
        Ok(Box::new(PgAccountTransaction::new(tx)))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserProfile>> {
        let rec = sqlx::query_as::<_, UserDb>(
            r#"
                SELECT u.id, e.email, p.name
                FROM users u
                JOIN user_emails e ON e.user_id = u.id AND e.is_primary
                JOIN user_profiles p ON p.user_id = u.id
                WHERE e.email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rec.map(UserProfile::from))
    }

    async fn get_profile_by_id(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        let rec = sqlx::query_as::<_, UserDb>(
            r#"
                SELECT u.id, e.email, p.name
                FROM users u
                JOIN user_emails e ON e.user_id = u.id AND e.is_primary
                JOIN user_profiles p ON p.user_id = u.id
                WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rec.map(UserProfile::from))
    }
}
