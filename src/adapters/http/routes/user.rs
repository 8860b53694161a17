use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    adapters::http::{app_state::AppState, extract::AccessAuth},
    app_error::AppResult,
    use_cases::user::{IssuedTokens, MeProfile},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(signup))
        .route("/me", get(get_me))
}

#[derive(Deserialize)]
struct SignupPayload {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    name: String,
}

async fn signup(
    State(app_state): State<AppState>,
    payload: Result<Json<SignupPayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<IssuedTokens>)> {
    let Json(payload) = payload?;

    let tokens = app_state
        .auth_use_cases
        .signup(&payload.email, &payload.password, &payload.name)
        .await?;

    Ok((StatusCode::CREATED, Json(tokens)))
}

async fn get_me(
    State(app_state): State<AppState>,
    AccessAuth(identity): AccessAuth,
) -> AppResult<Json<MeProfile>> {
    let profile = app_state.auth_use_cases.me(identity.user_id).await?;
    Ok(Json(profile))
}
