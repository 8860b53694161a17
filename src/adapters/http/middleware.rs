use axum::{
    Json,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::adapters::http::{app_error_impl::ErrorReport, app_state::AppState};

/// Swaps an error response's public body for the full report, stack
/// included, when the app runs in development.
pub async fn error_details_middleware(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    match response.extensions_mut().remove::<ErrorReport>() {
        Some(ErrorReport(report)) if app_state.config.is_development() => {
            (response.status(), Json(report)).into_response()
        }
        _ => response,
    }
}
