//! In-memory mock implementations for the user and credential ports.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::credential::{Credential, Rotation},
    use_cases::user::{AccountTransaction, CredentialRepo, UserProfile, UserRepo},
};

/// In-memory implementation of UserRepo for testing.
/// Account transactions write into the shared credential store on commit.
pub struct InMemoryUserRepo {
    pub users: Arc<Mutex<HashMap<Uuid, UserProfile>>>,
    credentials: Arc<InMemoryCredentialRepo>,
}

impl InMemoryUserRepo {
    pub fn new(credentials: Arc<InMemoryCredentialRepo>) -> Self {
        Self {
            users: Arc::new(Mutex::new(HashMap::new())),
            credentials,
        }
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn begin_account(&self) -> AppResult<Box<dyn AccountTransaction>> {
        Ok(Box::new(InMemoryAccountTransaction {
            users: self.users.clone(),
            credentials: self.credentials.clone(),
            new_users: Vec::new(),
            deactivated: Vec::new(),
            new_credentials: Vec::new(),
        }))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserProfile>> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn get_profile_by_id(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        let users = self.users.lock().unwrap();
        Ok(users.get(&user_id).cloned())
    }
}

/// Buffers account writes and applies them together on commit.
pub struct InMemoryAccountTransaction {
    users: Arc<Mutex<HashMap<Uuid, UserProfile>>>,
    credentials: Arc<InMemoryCredentialRepo>,
    new_users: Vec<UserProfile>,
    deactivated: Vec<Uuid>,
    new_credentials: Vec<Credential>,
}

#[async_trait]
impl AccountTransaction for InMemoryAccountTransaction {
    async fn create_user(&mut self, email: &str, name: &str) -> AppResult<UserProfile> {
        let taken = self.users.lock().unwrap().values().any(|u| u.email == email)
            || self.new_users.iter().any(|u| u.email == email);
        if taken {
            return Err(AppError::Conflict("Email is already registered".into()));
        }

        let profile = UserProfile {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
        };
        self.new_users.push(profile.clone());
        Ok(profile)
    }

    async fn deactivate_credentials(&mut self, user_id: Uuid) -> AppResult<()> {
        self.deactivated.push(user_id);
        for credential in self.new_credentials.iter_mut().filter(|c| c.user_id == user_id) {
            credential.active = false;
        }
        Ok(())
    }

    async fn insert_active_credential(
        &mut self,
        user_id: Uuid,
        password_hash: &str,
    ) -> AppResult<Credential> {
        if self.credentials.fail_next_insert.swap(false, Ordering::SeqCst) {
            return Err(AppError::Database("simulated insert failure".into()));
        }

        let now = Utc::now();
        let credential = Credential {
            id: Uuid::new_v4(),
            user_id,
            password_hash: password_hash.to_string(),
            active: true,
            created_at: now,
            rotation_checkpoint: now,
            updated_at: now,
        };
        self.new_credentials.push(credential.clone());
        Ok(credential)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let this = *self;
        let mut users = this.users.lock().unwrap();
        let mut credentials = this.credentials.credentials.lock().unwrap();

        // Same rule as the partial unique index on credentials(user_id).
        let still_active = |user_id: Uuid| {
            !this.deactivated.contains(&user_id)
                && credentials.iter().any(|c| c.user_id == user_id && c.active)
        };
        if this
            .new_credentials
            .iter()
            .any(|new| new.active && still_active(new.user_id))
        {
            return Err(AppError::Conflict(
                "A record with this value already exists".into(),
            ));
        }

        for user_id in &this.deactivated {
            for credential in credentials.iter_mut().filter(|c| c.user_id == *user_id) {
                credential.active = false;
            }
        }

        for profile in this.new_users {
            users.insert(profile.id, profile);
        }
        credentials.extend(this.new_credentials);
        Ok(())
    }
}

/// In-memory implementation of CredentialRepo for testing.
/// Keeps every credential ever inserted, like the real table does.
#[derive(Default)]
pub struct InMemoryCredentialRepo {
    pub credentials: Mutex<Vec<Credential>>,
    fail_next_insert: AtomicBool,
}

impl InMemoryCredentialRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next credential insert fail with a database error.
    pub fn fail_next_insert(&self) {
        self.fail_next_insert.store(true, Ordering::SeqCst);
    }

    /// Number of active credentials for `user_id` (for test assertions).
    pub fn active_count(&self, user_id: Uuid) -> usize {
        self.credentials
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.user_id == user_id && c.active)
            .count()
    }
}

#[async_trait]
impl CredentialRepo for InMemoryCredentialRepo {
    async fn find_active(&self, user_id: Uuid) -> AppResult<Option<Credential>> {
        let credentials = self.credentials.lock().unwrap();
        Ok(credentials
            .iter()
            .find(|c| c.user_id == user_id && c.active)
            .cloned())
    }

    async fn rotate(&self, user_id: Uuid, rotation: Rotation) -> AppResult<Option<Credential>> {
        let mut credentials = self.credentials.lock().unwrap();
        let Some(credential) = credentials
            .iter_mut()
            .find(|c| c.user_id == user_id && c.active)
        else {
            return Ok(None);
        };

        *credential = credential.rotated(rotation, Utc::now());
        Ok(Some(credential.clone()))
    }
}
