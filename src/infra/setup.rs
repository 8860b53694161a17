use crate::{
    adapters::http::app_state::AppState,
    infra::{
        config::AppConfig, key_derivation::SecretDeriver, password::BcryptPasswordHasher,
        postgres_persistence,
    },
    use_cases::user::{AuthUseCases, CredentialRepo, PasswordHasher, UserRepo},
};
use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let postgres_arc = Arc::new(postgres_persistence(&config.database_url).await?);

    let secrets = SecretDeriver::new(config.jwt_secret.clone(), config.jwt_refresh_secret.clone());
    let hasher = Arc::new(BcryptPasswordHasher::new(config.bcrypt_cost));

    let auth_use_cases = AuthUseCases::new(
        postgres_arc.clone() as Arc<dyn UserRepo>,
        postgres_arc.clone() as Arc<dyn CredentialRepo>,
        hasher as Arc<dyn PasswordHasher>,
        secrets,
        config.token_settings(),
    );

    Ok(AppState {
        config: Arc::new(config),
        auth_use_cases: Arc::new(auth_use_cases),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ideabox=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false) // don't show target (module path)
        .with_level(true)
        .pretty();

    let registry = tracing_subscriber::registry().with(filter).with(console_layer);

    // File (structured JSON logs)
    match File::create("app.log") {
        Ok(file) => {
            let json_layer = fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(true)
                .with_span_list(true);
            registry.with(json_layer).try_init().ok();
        }
        Err(err) => {
            registry.try_init().ok();
            tracing::warn!(error = %err, "cannot create app.log, logging to console only");
        }
    }
}
