//! ObjectId path parameter extractor.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use mongodb::bson::oid::ObjectId;

/// Extracts a record id from the last path parameter.
///
/// Anything other than a 24-character hex string is rejected with
/// `INVALID_OBJECT_ID` before the handler runs.
///
/// ```ignore
/// use axum_helpers::ObjectIdPath;
///
/// async fn get_contact(ObjectIdPath(id): ObjectIdPath) -> String {
///     id.to_hex()
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ObjectIdPath(pub ObjectId);

impl<S> FromRequestParts<S> for ObjectIdPath
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let raw = params
            .last()
            .map(|(_, value)| value.as_str())
            .unwrap_or_default();

        raw.parse::<ObjectId>()
            .map(ObjectIdPath)
            .map_err(|e| AppError::from(e).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, http::StatusCode, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new().route(
            "/{entity}/{id}",
            get(|ObjectIdPath(id): ObjectIdPath| async move { id.to_hex() }),
        )
    }

    async fn call(uri: &str) -> Response {
        app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_parses_last_segment() {
        let response = call("/contacts/65a1f0c2e4b0a1b2c3d4e5f6").await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"65a1f0c2e4b0a1b2c3d4e5f6");
    }

    #[tokio::test]
    async fn test_rejects_non_hex_id() {
        let response = call("/contacts/not-an-id").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
