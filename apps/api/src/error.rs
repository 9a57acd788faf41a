//! Error types for the HTTP API.
//!
//! Every handler returns `Result<_, ApiError>`. The body is always
//! `{"code": ..., "message": ...}`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shepherd_commerce::CommerceError;
use shepherd_core::ErrorKind;
use tracing::error;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: String,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

/// HTTP status for each error category.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::UnsupportedMethod | ErrorKind::Signature => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict | ErrorKind::InvalidTransition | ErrorKind::InsufficientStock => {
            StatusCode::CONFLICT
        }
        ErrorKind::Gateway => StatusCode::BAD_GATEWAY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn code_for(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Validation => "VALIDATION",
        ErrorKind::NotFound => "NOT_FOUND",
        ErrorKind::Conflict => "CONFLICT",
        ErrorKind::InvalidTransition => "INVALID_TRANSITION",
        ErrorKind::InsufficientStock => "INSUFFICIENT_STOCK",
        ErrorKind::UnsupportedMethod => "UNSUPPORTED_METHOD",
        ErrorKind::Gateway => "GATEWAY",
        ErrorKind::Signature => "SIGNATURE",
        ErrorKind::Internal => "INTERNAL",
    }
}

impl From<CommerceError> for ApiError {
    fn from(err: CommerceError) -> Self {
        let kind = err.kind();
        let message = match kind {
            ErrorKind::Internal => {
                error!(error = %err, "Request failed with internal error");
                "Internal server error".to_string()
            }
            _ => err.to_string(),
        };
        ApiError::new(status_for(kind), code_for(kind), message)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: &self.code,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shepherd_core::{CoreError, ValidationError};
    use shepherd_db::DbError;

    #[test]
    fn test_status_by_kind() {
        let cases = [
            (ErrorKind::Validation, StatusCode::BAD_REQUEST),
            (ErrorKind::UnsupportedMethod, StatusCode::BAD_REQUEST),
            (ErrorKind::Signature, StatusCode::BAD_REQUEST),
            (ErrorKind::NotFound, StatusCode::NOT_FOUND),
            (ErrorKind::Conflict, StatusCode::CONFLICT),
            (ErrorKind::InvalidTransition, StatusCode::CONFLICT),
            (ErrorKind::InsufficientStock, StatusCode::CONFLICT),
            (ErrorKind::Gateway, StatusCode::BAD_GATEWAY),
            (ErrorKind::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (kind, status) in cases {
            assert_eq!(status_for(kind), status, "{kind:?}");
        }
    }

    #[test]
    fn test_internal_details_hidden() {
        let err: ApiError = CommerceError::Db(DbError::Internal("disk I/O error at page 42".into())).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal server error");
    }

    #[test]
    fn test_validation_message_kept() {
        let err: ApiError = CommerceError::Core(CoreError::Validation(ValidationError::Required {
            field: "purpose".into(),
        }))
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "VALIDATION");
        assert!(err.message.contains("purpose"));
    }
}
