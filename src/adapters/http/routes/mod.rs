pub mod auth;
pub mod user;

use axum::{
    Json, Router,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use crate::adapters::http::{app_error_impl::route_not_found, app_state::AppState};

/// Routes mounted under `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .nest("/access-tokens", auth::router())
        .merge(user::router())
}

/// Health route at the server root.
pub fn home_router() -> Router<AppState> {
    Router::new().route("/", get(home))
}

async fn home() -> impl IntoResponse {
    Json(json!({ "status": 200, "message": "Api Up." }))
}

pub async fn not_found() -> Response {
    route_not_found()
}
