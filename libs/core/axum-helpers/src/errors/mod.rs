pub mod codes;
pub mod handlers;
pub mod responses;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mongodb::bson::oid;
use mongodb::error::{ErrorKind, WriteFailure};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// MongoDB server code for a unique index violation
pub const DUPLICATE_KEY: i32 = 11000;

/// Standard error response structure.
///
/// Returned for every error so clients can rely on one envelope:
/// - `success`: always `false`
/// - `code`: integer error code for logging/monitoring (e.g., 1013)
/// - `error`: machine-readable identifier (e.g., "INVALID_QUERY")
/// - `message`: human-readable message
/// - `details`: optional structured details (e.g., validation errors)
///
/// ```json
/// {
///   "success": false,
///   "code": 1008,
///   "error": "CONFLICT",
///   "message": "email 'ada@example.com' is already taken"
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    /// Integer error code for logging and monitoring
    pub code: i32,
    /// Machine-readable error identifier for programmatic handling
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Optional structured error details (e.g., validation field errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: code.code(),
            error: code.as_str().to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Application error type that can be converted to HTTP responses.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON parsing error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Invalid ObjectId: {0}")]
    InvalidObjectId(#[from] oid::Error),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Projection mismatch: {0}")]
    ProjectionMismatch(String),

    #[error("Query execution failed: {0}")]
    QueryExecution(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable Entity: {0}")]
    UnprocessableEntity(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),
}

type Parts = (StatusCode, String, Option<serde_json::Value>, ErrorCode);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details, code): Parts = match self {
            AppError::SerdeJson(e) => {
                tracing::error!(error_code = ErrorCode::SerdeJsonError.code(), "JSON parsing error: {:?}", e);
                internal(ErrorCode::SerdeJsonError)
            }
            AppError::Database(e) => map_mongo_error(&e),
            AppError::Io(e) => {
                tracing::error!(error_code = ErrorCode::IoError.code(), "I/O error: {:?}", e);
                internal(ErrorCode::IoError)
            }
            AppError::JsonExtractorRejection(e) => {
                tracing::warn!(error_code = ErrorCode::JsonExtraction.code(), "JSON extraction error: {:?}", e);
                (e.status(), e.body_text(), None, ErrorCode::JsonExtraction)
            }
            AppError::ValidationError(e) => {
                tracing::info!(error_code = ErrorCode::ValidationError.code(), "Validation error: {:?}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorCode::ValidationError.default_message().to_string(),
                    Some(serde_json::to_value(&e).unwrap_or(serde_json::Value::Null)),
                    ErrorCode::ValidationError,
                )
            }
            AppError::InvalidObjectId(e) => {
                tracing::info!(error_code = ErrorCode::InvalidObjectId.code(), "Invalid ObjectId: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorCode::InvalidObjectId.default_message().to_string(),
                    None,
                    ErrorCode::InvalidObjectId,
                )
            }
            AppError::BadRequest(msg) => {
                tracing::info!(error_code = ErrorCode::BadRequest.code(), "Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, msg, None, ErrorCode::BadRequest)
            }
            AppError::InvalidQuery(msg) => {
                tracing::info!(error_code = ErrorCode::InvalidQuery.code(), "Invalid query: {}", msg);
                (StatusCode::BAD_REQUEST, msg, None, ErrorCode::InvalidQuery)
            }
            AppError::ProjectionMismatch(msg) => {
                tracing::info!(error_code = ErrorCode::ProjectionMismatch.code(), "Projection mismatch: {}", msg);
                (StatusCode::BAD_REQUEST, msg, None, ErrorCode::ProjectionMismatch)
            }
            AppError::QueryExecution(msg) => {
                tracing::error!(error_code = ErrorCode::QueryExecution.code(), "Query execution failed: {}", msg);
                internal(ErrorCode::QueryExecution)
            }
            AppError::NotFound(msg) => {
                tracing::info!(error_code = ErrorCode::NotFound.code(), "Not found: {}", msg);
                (StatusCode::NOT_FOUND, msg, None, ErrorCode::NotFound)
            }
            AppError::Conflict(msg) => {
                tracing::info!(error_code = ErrorCode::Conflict.code(), "Conflict: {}", msg);
                (StatusCode::CONFLICT, msg, None, ErrorCode::Conflict)
            }
            AppError::UnprocessableEntity(msg) => {
                tracing::info!("Unprocessable entity: {}", msg);
                (StatusCode::UNPROCESSABLE_ENTITY, msg, None, ErrorCode::UnprocessableEntity)
            }
            AppError::InternalServerError(msg) => {
                tracing::error!(error_code = ErrorCode::InternalError.code(), "Internal server error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg, None, ErrorCode::InternalError)
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg, None, ErrorCode::ServiceUnavailable)
            }
        };

        let mut body = ErrorResponse::new(code, message);
        body.details = details;
        (status, Json(body)).into_response()
    }
}

/// Server-side failures never echo their cause to the client
fn internal(code: ErrorCode) -> Parts {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        code.default_message().to_string(),
        None,
        code,
    )
}

/// True when `error` is a unique index violation
pub fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn map_mongo_error(error: &mongodb::error::Error) -> Parts {
    if is_duplicate_key(error) {
        tracing::info!(error_code = ErrorCode::Conflict.code(), "Duplicate key: {}", error);
        return (
            StatusCode::CONFLICT,
            ErrorCode::Conflict.default_message().to_string(),
            None,
            ErrorCode::Conflict,
        );
    }

    match error.kind.as_ref() {
        ErrorKind::ServerSelection { .. } => {
            tracing::warn!(error_code = ErrorCode::ServiceUnavailable.code(), "MongoDB unreachable: {}", error);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::ServiceUnavailable.default_message().to_string(),
                None,
                ErrorCode::ServiceUnavailable,
            )
        }
        _ => {
            tracing::error!(error_code = ErrorCode::DatabaseError.code(), "Database error: {:?}", error);
            internal(ErrorCode::DatabaseError)
        }
    }
}

/// Build an error response outside of `AppError`, e.g. from a fallback handler.
pub fn error_response(status: StatusCode, message: String, error_code: ErrorCode) -> Response {
    (status, Json(ErrorResponse::new(error_code, message))).into_response()
}
