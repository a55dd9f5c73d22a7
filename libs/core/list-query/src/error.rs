use mongodb::error::ErrorKind;
use thiserror::Error;

/// Server codes for projections MongoDB refuses to run: path collisions
/// (31249, 31250) and mixed inclusion/exclusion (31253, 31254).
const PROJECTION_CONFLICT_CODES: [i32; 4] = [31249, 31250, 31253, 31254];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListQueryError {
    /// The caller's query cannot be turned into a sensible pipeline
    #[error("Invalid query specification: {0}")]
    InvalidSpecification(String),

    /// The executor refused the projection for the given filter
    #[error("Projection rejected: {0}")]
    ProjectionMismatch(String),

    /// Connectivity, timeout, or any other executor failure
    #[error("Query execution failed: {0}")]
    QueryExecutionFailure(String),
}

pub type ListQueryResult<T> = Result<T, ListQueryError>;

impl ListQueryError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidSpecification(msg.into())
    }
}

pub(crate) fn is_projection_conflict(code: i32) -> bool {
    PROJECTION_CONFLICT_CODES.contains(&code)
}

impl From<mongodb::error::Error> for ListQueryError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            ErrorKind::Command(cmd) if is_projection_conflict(cmd.code) => {
                ListQueryError::ProjectionMismatch(cmd.message.clone())
            }
            _ => ListQueryError::QueryExecutionFailure(err.to_string()),
        }
    }
}
