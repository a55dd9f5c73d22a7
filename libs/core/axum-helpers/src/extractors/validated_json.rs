//! JSON extractor with automatic validation using the validator crate.

use crate::errors::{ErrorCode, ErrorResponse};
use axum::{
    extract::{FromRequest, Json, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::errors::AppError;

/// JSON extractor with automatic validation.
///
/// Malformed bodies are rejected as `JSON_EXTRACTION`; bodies that parse but
/// fail [`Validate`] are rejected as `VALIDATION_ERROR` with per-field details.
///
/// ```ignore
/// use axum_helpers::ValidatedJson;
/// use list_query::QuerySpec;
///
/// async fn list(ValidatedJson(spec): ValidatedJson<QuerySpec>) -> String {
///     format!("{:?}", spec.search)
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        data.validate().map_err(|e| validation_failed(&e))?;

        Ok(ValidatedJson(data))
    }
}

fn validation_failed(errors: &ValidationErrors) -> Response {
    let details = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let messages: Vec<serde_json::Value> = errors
                .iter()
                .map(|err| {
                    serde_json::json!({
                        "code": err.code,
                        "message": err.message,
                        "params": err.params,
                    })
                })
                .collect();
            (field.to_string(), serde_json::json!(messages))
        })
        .collect::<serde_json::Map<_, _>>();

    let body = ErrorResponse::new(
        ErrorCode::ValidationError,
        ErrorCode::ValidationError.default_message(),
    )
    .with_details(serde_json::Value::Object(details));

    (StatusCode::BAD_REQUEST, axum::Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, routing::post};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Validate)]
    struct Search {
        #[validate(length(max = 5))]
        term: String,
    }

    fn app() -> Router {
        Router::new().route(
            "/",
            post(|ValidatedJson(s): ValidatedJson<Search>| async move { s.term }),
        )
    }

    fn request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_passes() {
        let response = app().oneshot(request(r#"{"term":"ada"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_body_reports_field_details() {
        let response = app().oneshot(request(r#"{"term":"too long"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json(response).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert_eq!(body["details"]["term"][0]["code"], "length");
    }

    #[tokio::test]
    async fn test_malformed_json_is_extraction_error() {
        let response = app().oneshot(request("{")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["error"], "JSON_EXTRACTION");
    }
}
