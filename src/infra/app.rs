use std::time::Duration;

use axum::{Router, http, middleware};
use http::header::CONTENT_TYPE;
use tower_http::{
    cors::CorsLayer, set_header::SetResponseHeaderLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use uuid::Uuid;

use crate::{
    adapters::{
        self,
        http::{
            app_state::AppState, extract::ACCESS_TOKEN_HEADER,
            middleware::error_details_middleware,
        },
    },
    infra::setup::init_tracing,
};

pub fn create_app(app_state: AppState) -> Router {
    init_tracing();

    tracing::info!(environment = %app_state.config.environment, "Building router");

    build_router(app_state)
}

/// Full HTTP surface with every layer applied.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(app_state.config.cors_origin())
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::DELETE])
        .allow_headers([CONTENT_TYPE, http::HeaderName::from_static(ACCESS_TOKEN_HEADER)]);

    let timeout = Duration::from_secs(app_state.config.request_timeout_secs);

    Router::new()
        .merge(adapters::http::routes::home_router())
        .nest("/api/v1", adapters::http::routes::router())
        .fallback(adapters::http::routes::not_found)
        .with_state(app_state.clone())
        .layer(middleware::from_fn_with_state(
            app_state,
            error_details_middleware,
        ))
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            http::header::X_CONTENT_TYPE_OPTIONS,
            http::HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            http::header::X_FRAME_OPTIONS,
            http::HeaderValue::from_static("DENY"),
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &http::Request<_>| {
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http-request",
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                    request_id = %request_id
                )
            }),
        )
}
