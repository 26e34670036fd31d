//! # API Error Handling
//!
//! Every handler returns `Result<T, ApiError>`. Failures leave as one JSON
//! envelope:
//!
//! ```json
//! { "error": "Pet 3 already has an active order", "code": "PET_ALREADY_RESERVED" }
//! ```
//!
//! ## Status Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ErrorKind         HTTP   Example codes                                │
//! │  ───────────────   ────   ───────────────────────────────────────────  │
//! │  NotFound          404    PET_NOT_FOUND, ORDER_NOT_FOUND, USER_NOT_FOUND│
//! │  InvalidInput      400    INVALID_QUANTITY, VALIDATION_ERROR           │
//! │  Unauthenticated   401    UNAUTHENTICATED                              │
//! │  Forbidden         403    FORBIDDEN                                    │
//! │  Conflict          409    PET_ALREADY_RESERVED, ORDER_TERMINAL, ...    │
//! │  Busy              503    BUSY (+ Retry-After)                         │
//! │  Internal          500    INTERNAL (details logged, never returned)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use petstore_core::{CoreError, ErrorKind, ValidationError};
use petstore_db::{DbError, EngineError};

/// API-level error type.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Rule or policy violation.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Transition engine failure.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Store failure outside the engine.
    #[error(transparent)]
    Store(#[from] DbError),

    /// Missing or invalid credential.
    #[error("{0}")]
    Unauthenticated(String),

    /// Malformed request (bad JSON, bad path or query).
    #[error("{0}")]
    BadRequest(String),

    /// Anything else that must not leak to the client.
    #[error("{0}")]
    Internal(String),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Domain(CoreError::Validation(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Domain(e) => e.kind(),
            ApiError::Engine(e) => e.kind(),
            ApiError::Store(e) => e.kind(),
            ApiError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            ApiError::BadRequest(_) => ErrorKind::InvalidInput,
            ApiError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Domain(e) => e.code(),
            ApiError::Engine(e) => e.code(),
            ApiError::Store(e) => e.code(),
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::BadRequest(_) => "VALIDATION_ERROR",
            ApiError::Internal(_) => "INTERNAL",
        }
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Busy => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = status_for(kind);

        // Don't expose internal error details to clients
        let message = if kind == ErrorKind::Internal {
            tracing::error!(error = %self, code = self.code(), "Request failed");
            "Internal server error".to_string()
        } else {
            tracing::debug!(error = %self, code = self.code(), "Request rejected");
            self.to_string()
        };

        let body = Json(ErrorBody {
            error: message,
            code: self.code(),
        });

        if kind.is_retryable() {
            (status, [(header::RETRY_AFTER, "1")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

/// Result type alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
