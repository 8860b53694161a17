use crate::app_error::{AppError, ErrorCode, FieldError};
use axum::Json;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Full error body, `stack` included, attached to every error response as an
/// extension. Rendered in place of the public body only in development.
#[derive(Clone, Debug)]
pub struct ErrorReport(pub ErrorBody);

#[derive(Clone, Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub error: ErrorDetail,
}

#[derive(Clone, Debug, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = ?self, "Request failed");

        let status = match &self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let stack = format!("{:?}", self);
        let message = self.public_message();
        let code = self.code();
        let errors = match self {
            AppError::ValidationFailed(fields) => Some(fields),
            _ => None,
        };

        error_resp(status, code, message, errors, stack)
    }
}

fn error_resp(
    status: StatusCode,
    code: ErrorCode,
    message: String,
    errors: Option<Vec<FieldError>>,
    stack: String,
) -> Response {
    let body = ErrorBody {
        status: status.as_u16(),
        error: ErrorDetail {
            message,
            code: Some(code.as_str()),
            errors,
            stack: None,
        },
    };

    let mut report = body.clone();
    report.error.stack = Some(stack);

    let mut response = (status, Json(body)).into_response();
    response.extensions_mut().insert(ErrorReport(report));
    response
}

/// Body for requests that matched no route.
pub fn route_not_found() -> Response {
    let status = StatusCode::NOT_FOUND;
    let body = ErrorBody {
        status: status.as_u16(),
        error: ErrorDetail {
            message: "Route Does Not Exist On The Api".into(),
            code: None,
            errors: None,
            stack: None,
        },
    };
    (status, Json(body)).into_response()
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}
