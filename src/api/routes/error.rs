//! API error handling utilities.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::models::ValidationErrors;
use crate::services::ServiceError;

/// API error response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    /// Machine-readable error kind (`validation`, `not_found`, ...)
    pub kind: &'static str,
    pub message: String,
    /// Field-path-indexed messages for validation failures
    pub fields: Option<ValidationErrors>,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
            fields: None,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    pub fn invalid_identifier(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_identifier", message)
    }

    pub fn validation(errors: ValidationErrors) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            kind: "validation",
            message: "Validation failed".to_string(),
            fields: Some(errors),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        let kind = error.kind();
        match error {
            ServiceError::Validation(errors) => Self::validation(errors),
            ServiceError::NotFound(message) => Self::new(StatusCode::NOT_FOUND, kind, message),
            ServiceError::InvalidIdentifier(message) => Self::invalid_identifier(message),
            ServiceError::Persistence(message) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, kind, message)
            }
        }
    }
}

/// Body rejections before any schema check: a missing JSON content type is
/// 415 and unparseable JSON is 400. Bodies that parse but do not fit the
/// schema are decoded by the handlers and reported as validation failures.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::info!("Rejected request body: {}", rejection.body_text());
        match rejection {
            JsonRejection::MissingJsonContentType(_) => Self::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_media_type",
                rejection.body_text(),
            ),
            JsonRejection::JsonDataError(_) => {
                Self::validation(ValidationErrors::single(rejection.body_text()))
            }
            _ => Self::new(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid_identifier(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "success": false,
            "error": self.message,
            "kind": self.kind,
            "status": self.status.as_u16(),
        });
        if let Some(fields) = self.fields {
            body["fields"] = json!(fields);
        }

        (self.status, axum::Json(body)).into_response()
    }
}
