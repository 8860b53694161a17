use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use strum::{Display, EnumString};
use time::Duration;
use url::Url;

use crate::use_cases::user::TokenSettings;

/// Deployment flavour. Controls how much error detail reaches clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

pub struct AppConfig {
    /// Seed for access-token secrets.
    pub jwt_secret: SecretString,
    /// Seed for refresh-token secrets.
    pub jwt_refresh_secret: SecretString,
    /// Front-end origin. Used as the token audience/issuer and the CORS origin.
    pub client_url: Url,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// Refresh-token lifetime when the user asks to stay logged in.
    pub keep_logged_in_ttl: Duration,
    pub bcrypt_cost: u32,
    pub bind_addr: SocketAddr,
    pub request_timeout_secs: u64,
    pub database_url: String,
    pub environment: AppEnvironment,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret: SecretString = SecretString::new(get_env::<String>("JWT_SECRET").into());
        let jwt_refresh_secret: SecretString =
            SecretString::new(get_env::<String>("JWT_REFRESH_SECRET").into());

        let client_url: Url = get_env_default(
            "CLIENT_URL",
            "http://localhost:3000".parse().expect("default CLIENT_URL is valid"),
        );

        let access_token_ttl_minutes: i64 = get_env_default("ACCESS_TOKEN_TTL_MINUTES", 10);
        let refresh_token_ttl_days: i64 = get_env_default("REFRESH_TOKEN_TTL_DAYS", 7);
        let keep_logged_in_ttl_days: i64 = get_env_default("KEEP_LOGGED_IN_TTL_DAYS", 30);
        let bcrypt_cost: u32 = get_env_default("BCRYPT_COST", 10);

        let bind_addr: SocketAddr =
            get_env_default("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)));
        let request_timeout_secs: u64 = get_env_default("REQUEST_TIMEOUT_SECS", 30);
        let database_url: String = get_env("DATABASE_URL");
        let environment: AppEnvironment =
            get_env_default("APP_ENV", AppEnvironment::Development);

        Self {
            jwt_secret,
            jwt_refresh_secret,
            client_url,
            access_token_ttl: Duration::minutes(access_token_ttl_minutes),
            refresh_token_ttl: Duration::days(refresh_token_ttl_days),
            keep_logged_in_ttl: Duration::days(keep_logged_in_ttl_days),
            bcrypt_cost,
            bind_addr,
            request_timeout_secs,
            database_url,
            environment,
        }
    }

    /// Client origin without a trailing slash, e.g. `http://localhost:3000`.
    pub fn client_origin(&self) -> String {
        self.client_url.origin().ascii_serialization()
    }

    pub fn cors_origin(&self) -> HeaderValue {
        HeaderValue::from_str(&self.client_origin())
            .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000"))
    }

    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            audience: self.client_origin(),
            access_token_ttl: self.access_token_ttl,
            refresh_token_ttl: self.refresh_token_ttl,
            keep_logged_in_ttl: self.keep_logged_in_ttl,
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == AppEnvironment::Development
    }
}
