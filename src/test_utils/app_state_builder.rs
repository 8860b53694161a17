//! Builders for `AuthUseCases` and `AppState` backed by in-memory mocks.

use std::net::SocketAddr;
use std::sync::Arc;

use secrecy::SecretString;
use time::Duration;
use url::Url;

use crate::{
    adapters::http::app_state::AppState,
    infra::{
        config::{AppConfig, AppEnvironment},
        key_derivation::SecretDeriver,
        password::BcryptPasswordHasher,
    },
    test_utils::{InMemoryCredentialRepo, InMemoryUserRepo},
    use_cases::user::{AuthUseCases, CredentialRepo, PasswordHasher, UserRepo},
};

pub const TEST_CLIENT_URL: &str = "http://localhost:3000";

fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: SecretString::new("test-access-seed".to_string().into()),
        jwt_refresh_secret: SecretString::new("test-refresh-seed".to_string().into()),
        client_url: Url::parse(TEST_CLIENT_URL).unwrap(),
        access_token_ttl: Duration::minutes(10),
        refresh_token_ttl: Duration::days(7),
        keep_logged_in_ttl: Duration::days(30),
        // Lowest cost bcrypt accepts.
        bcrypt_cost: 4,
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        request_timeout_secs: 30,
        database_url: "postgres://unused".to_string(),
        environment: AppEnvironment::Test,
    }
}

fn use_cases_for(
    config: &AppConfig,
    users: Arc<InMemoryUserRepo>,
    credentials: Arc<InMemoryCredentialRepo>,
) -> AuthUseCases {
    AuthUseCases::new(
        users as Arc<dyn UserRepo>,
        credentials as Arc<dyn CredentialRepo>,
        Arc::new(BcryptPasswordHasher::new(config.bcrypt_cost)) as Arc<dyn PasswordHasher>,
        SecretDeriver::new(config.jwt_secret.clone(), config.jwt_refresh_secret.clone()),
        config.token_settings(),
    )
}

/// `AuthUseCases` over fresh in-memory repos, plus a handle on the credential
/// store for assertions.
pub fn build_test_auth_use_cases() -> (AuthUseCases, Arc<InMemoryCredentialRepo>) {
    let config = test_config();
    let credentials = Arc::new(InMemoryCredentialRepo::new());
    let users = Arc::new(InMemoryUserRepo::new(credentials.clone()));
    let auth = use_cases_for(&config, users, credentials.clone());
    (auth, credentials)
}

/// Builder for creating test AppState with in-memory mocks.
pub struct TestAppStateBuilder {
    config: AppConfig,
    users: Arc<InMemoryUserRepo>,
    credentials: Arc<InMemoryCredentialRepo>,
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        let credentials = Arc::new(InMemoryCredentialRepo::new());
        Self {
            config: test_config(),
            users: Arc::new(InMemoryUserRepo::new(credentials.clone())),
            credentials,
        }
    }

    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.config.environment = environment;
        self
    }

    pub fn build(self) -> AppState {
        let auth_use_cases = use_cases_for(&self.config, self.users, self.credentials);
        AppState {
            config: Arc::new(self.config),
            auth_use_cases: Arc::new(auth_use_cases),
        }
    }
}
