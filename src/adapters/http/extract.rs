//! Extractors that authenticate a request and hand the caller's identity to
//! the handler.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use serde::Deserialize;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult, FieldError},
    application::validators::{TOKEN_MESSAGE, is_token_shaped},
    domain::entities::token_class::TokenClass,
    use_cases::user::AuthUser,
};

pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Caller authenticated by the access token in the `x-access-token` header.
#[derive(Debug, Clone, Copy)]
pub struct AccessAuth(pub AuthUser);

/// Caller authenticated by `{ "refresh_token": ... }` in the JSON body.
#[derive(Debug, Clone, Copy)]
pub struct RefreshAuth(pub AuthUser);

#[derive(Deserialize)]
struct RefreshTokenBody {
    #[serde(default)]
    refresh_token: String,
}

impl FromRequestParts<AppState> for AccessAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> AppResult<Self> {
        let raw = parts
            .headers
            .get(ACCESS_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .trim();

        authenticate(state, raw, ACCESS_TOKEN_HEADER, TokenClass::Access)
            .await
            .map(AccessAuth)
    }
}

impl FromRequest<AppState> for RefreshAuth {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> AppResult<Self> {
        let Json(body) = Json::<RefreshTokenBody>::from_request(req, state).await?;

        authenticate(
            state,
            body.refresh_token.trim(),
            "refresh_token",
            TokenClass::Refresh,
        )
        .await
        .map(RefreshAuth)
    }
}

async fn authenticate(
    state: &AppState,
    raw: &str,
    field: &str,
    class: TokenClass,
) -> AppResult<AuthUser> {
    if !is_token_shaped(raw) {
        return Err(AppError::ValidationFailed(vec![FieldError::new(
            field,
            TOKEN_MESSAGE,
        )]));
    }

    state.auth_use_cases.authenticate(raw, class).await
}
