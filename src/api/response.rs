//! Error bodies of the worksheet engine API.
//!
//! Every failure is returned as an [`ApiError`] carrying the taxonomy code of
//! the underlying [`EngineError`] and the correlation id the handler logged
//! it under.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

/// JSON body of a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Stable taxonomy code, e.g. `CONFLICT`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// The offending field or entity, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// The id the failure was logged under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
}

impl ApiError {
    /// Creates an error body without details.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            correlation_id: None,
        }
    }

    /// A request body that parsed but does not describe a valid request.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// A request body that is not the expected JSON.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }

    /// Attaches details.
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Attaches the correlation id.
    pub fn correlated(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

/// An [`ApiError`] with its HTTP status.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// Tags the body with a correlation id.
    pub fn correlated(self, correlation_id: Uuid) -> Self {
        Self {
            status: self.status,
            error: self.error.correlated(correlation_id),
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            Json(self.error),
        )
            .into_response()
    }
}

/// HTTP status of each error kind.
pub fn status_of(error: &EngineError) -> StatusCode {
    match error {
        EngineError::Validation { .. } | EngineError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
        EngineError::Conflict { .. } => StatusCode::CONFLICT,
        EngineError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
        EngineError::Configuration { .. }
        | EngineError::ConfigNotFound { .. }
        | EngineError::ConfigParseError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let status = status_of(&error);
        let body = ApiError::new(error.kind(), error.to_string());
        let error = match error {
            EngineError::Validation { field, .. } => body.details(field),
            EngineError::NotFound { entity, id } => body.details(format!("{} '{}'", entity, id)),
            EngineError::PermissionDenied { actor_id, .. } if !actor_id.is_empty() => {
                body.details(format!("actor '{}'", actor_id))
            }
            // Server-side paths stay in the logs.
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                ApiError::new(body.code, "worksheet engine is misconfigured")
            }
            _ => body,
        };
        Self { status, error }
    }
}
