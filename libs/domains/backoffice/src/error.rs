use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use axum_helpers::errors::is_duplicate_key;
use list_query::ListQueryError;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackofficeError {
    #[error(transparent)]
    Query(#[from] ListQueryError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: ObjectId },

    #[error("{field} '{value}' is already taken")]
    Duplicate { field: String, value: String },

    /// A unique index rejected the write after the pre-check passed
    #[error("A record with the same unique value already exists")]
    DuplicateKey,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type BackofficeResult<T> = Result<T, BackofficeError>;

impl BackofficeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<BackofficeError> for AppError {
    fn from(err: BackofficeError) -> Self {
        match err {
            BackofficeError::Query(ListQueryError::InvalidSpecification(msg)) => AppError::InvalidQuery(msg),
            BackofficeError::Query(ListQueryError::ProjectionMismatch(msg)) => AppError::ProjectionMismatch(msg),
            BackofficeError::Query(ListQueryError::QueryExecutionFailure(msg)) => AppError::QueryExecution(msg),
            e @ BackofficeError::NotFound { .. } => AppError::NotFound(e.to_string()),
            e @ (BackofficeError::Duplicate { .. } | BackofficeError::DuplicateKey) => AppError::Conflict(e.to_string()),
            BackofficeError::Validation(msg) => AppError::BadRequest(msg),
            BackofficeError::Database(msg) | BackofficeError::Internal(msg) => {
                tracing::error!(error = %msg, "Backoffice operation failed");
                AppError::InternalServerError("An internal error occurred".to_string())
            }
        }
    }
}

impl IntoResponse for BackofficeError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

impl From<mongodb::error::Error> for BackofficeError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            BackofficeError::DuplicateKey
        } else {
            BackofficeError::Database(err.to_string())
        }
    }
}

impl From<mongodb::bson::ser::Error> for BackofficeError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        BackofficeError::Validation(err.to_string())
    }
}
