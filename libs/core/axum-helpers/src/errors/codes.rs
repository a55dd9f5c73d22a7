//! Type-safe error codes for API responses.
//!
//! Each code carries a string identifier for clients, an integer for log
//! correlation, and a default message.
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::InvalidQuery;
//! assert_eq!(code.as_str(), "INVALID_QUERY");
//! assert_eq!(code.code(), 1013);
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standardized error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000-1999)
    /// Request validation failed
    ValidationError,

    /// Path parameter is not a 24-character hex ObjectId
    InvalidObjectId,

    /// JSON extraction from request body failed
    JsonExtraction,

    /// Requested resource was not found
    NotFound,

    /// An unexpected internal server error occurred
    InternalError,

    /// Request conflicts with an existing record (duplicate unique value)
    Conflict,

    /// Request payload is semantically incorrect
    UnprocessableEntity,

    /// Service is temporarily unavailable
    ServiceUnavailable,

    /// Malformed request
    BadRequest,

    /// List query specification was rejected before execution
    InvalidQuery,

    /// The database rejected the projection (inclusion/exclusion mix or path collision)
    ProjectionMismatch,

    /// No route accepts this method
    MethodNotAllowed,

    // Database errors (2000-2999)
    /// Database command failed
    DatabaseError,

    /// List query failed while executing
    QueryExecution,

    // I/O errors (4000s)
    /// File system I/O error
    IoError,

    // JSON errors (5000s)
    /// JSON serialization/deserialization error
    SerdeJsonError,
}

impl ErrorCode {
    /// SCREAMING_SNAKE_CASE identifier for programmatic handling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidObjectId => "INVALID_OBJECT_ID",
            Self::JsonExtraction => "JSON_EXTRACTION",
            Self::NotFound => "NOT_FOUND",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Conflict => "CONFLICT",
            Self::UnprocessableEntity => "UNPROCESSABLE_ENTITY",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::BadRequest => "BAD_REQUEST",
            Self::InvalidQuery => "INVALID_QUERY",
            Self::ProjectionMismatch => "PROJECTION_MISMATCH",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::QueryExecution => "QUERY_EXECUTION",
            Self::IoError => "IO_ERROR",
            Self::SerdeJsonError => "SERDE_JSON_ERROR",
        }
    }

    /// Integer code for logging and monitoring.
    ///
    /// - 1000-1999: client errors
    /// - 2000-2999: database errors
    /// - 4000-4999: I/O errors
    /// - 5000-5999: JSON errors
    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::InvalidObjectId => 1002,
            Self::JsonExtraction => 1003,
            Self::NotFound => 1004,
            Self::InternalError => 1005,
            Self::Conflict => 1008,
            Self::UnprocessableEntity => 1009,
            Self::ServiceUnavailable => 1011,
            Self::BadRequest => 1012,
            Self::InvalidQuery => 1013,
            Self::ProjectionMismatch => 1014,
            Self::MethodNotAllowed => 1015,
            Self::DatabaseError => 2003,
            Self::QueryExecution => 2020,
            Self::IoError => 4001,
            Self::SerdeJsonError => 5001,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::InvalidObjectId => "Invalid record id",
            Self::JsonExtraction => "Failed to extract JSON from request body",
            Self::NotFound => "Resource not found",
            Self::InternalError => "An internal server error occurred",
            Self::Conflict => "Resource already exists",
            Self::UnprocessableEntity => "Unprocessable entity",
            Self::ServiceUnavailable => "Service temporarily unavailable",
            Self::BadRequest => "Bad request",
            Self::InvalidQuery => "Invalid list query",
            Self::ProjectionMismatch => "Projection rejected by the database",
            Self::MethodNotAllowed => "Method not allowed",
            Self::DatabaseError => "Database error occurred",
            Self::QueryExecution => "Query execution failed",
            Self::IoError => "I/O error occurred",
            Self::SerdeJsonError => "Failed to process JSON data",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
