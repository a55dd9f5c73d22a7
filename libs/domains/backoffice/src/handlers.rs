use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, State, rejection::JsonRejection},
    http::request::Parts,
    response::{IntoResponse, Response},
    routing::post,
};
use axum_helpers::{
    ApiResponse, AppError, ObjectIdPath, ValidatedJson,
    errors::responses::{
        BadRequestObjectIdResponse, BadRequestQueryResponse, BadRequestValidationResponse,
        ConflictResponse, InternalServerErrorResponse, NotFoundResponse,
    },
};
use list_query::{PaginationInput, QuerySpec};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::entity::EntityKind;
use crate::error::BackofficeResult;
use crate::models::{MessageResponse, RecordListResponse, RecordPayload, RecordResponse, to_plain_json};
use crate::repository::RecordRepository;
use crate::service::BackofficeService;

/// OpenAPI documentation for the back-office API
#[derive(OpenApi)]
#[openapi(
    paths(list_records, create_record, get_record, update_record, delete_record),
    components(
        schemas(
            EntityKind,
            QuerySpec,
            PaginationInput,
            RecordPayload,
            RecordListResponse,
            RecordResponse,
            MessageResponse
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestQueryResponse,
            BadRequestObjectIdResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Backoffice", description = "Generic list and CRUD endpoints for every back-office entity")
    )
)]
pub struct ApiDoc;

type SharedService<R> = State<Arc<BackofficeService<R>>>;

/// Routes for every entity, keyed by the `{entity}` path segment
pub fn router<R: RecordRepository + 'static>(service: BackofficeService<R>) -> Router {
    Router::new()
        .route("/{entity}", post(create_record::<R>))
        .route("/{entity}/list", post(list_records::<R>))
        .route(
            "/{entity}/{id}",
            axum::routing::get(get_record::<R>)
                .patch(update_record::<R>)
                .delete(delete_record::<R>),
        )
        .with_state(Arc::new(service))
}

/// The `{entity}` path segment; unknown names are a JSON 404
pub struct EntityPath(pub EntityKind);

impl<S> FromRequestParts<S> for EntityPath
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let name = params
            .iter()
            .find(|(key, _)| key == "entity")
            .map(|(_, value)| value.as_str())
            .unwrap_or_default();

        EntityKind::from_str(name)
            .map(EntityPath)
            .map_err(|_| AppError::NotFound(format!("Unknown entity '{name}'")).into_response())
    }
}

fn body(payload: Result<Json<RecordPayload>, JsonRejection>) -> Result<RecordPayload, AppError> {
    payload.map(|Json(p)| p).map_err(AppError::from)
}

/// Run a list query: filter, search, sort, select and pagination
#[utoipa::path(
    post,
    path = "/{entity}/list",
    tag = "Backoffice",
    params(("entity" = EntityKind, Path, description = "Entity name")),
    request_body = QuerySpec,
    responses(
        (status = 200, description = "Matching records and their count", body = RecordListResponse),
        (status = 400, response = BadRequestQueryResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_records<R: RecordRepository>(
    State(service): SharedService<R>,
    EntityPath(entity): EntityPath,
    ValidatedJson(spec): ValidatedJson<QuerySpec>,
) -> BackofficeResult<ApiResponse<Vec<Value>>> {
    let listing = service.list(entity, spec).await?;
    let data = listing.data.iter().map(to_plain_json).collect();
    Ok(ApiResponse::listed(
        format!("{entity} fetched successfully"),
        data,
        listing.count,
    ))
}

/// Create a record
#[utoipa::path(
    post,
    path = "/{entity}",
    tag = "Backoffice",
    params(("entity" = EntityKind, Path, description = "Entity name")),
    request_body = RecordPayload,
    responses(
        (status = 201, description = "Record created", body = RecordResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_record<R: RecordRepository>(
    State(service): SharedService<R>,
    EntityPath(entity): EntityPath,
    payload: Result<Json<RecordPayload>, JsonRejection>,
) -> Result<ApiResponse<Value>, Response> {
    let payload = body(payload).map_err(IntoResponse::into_response)?;
    let record = service
        .create(entity, payload)
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(ApiResponse::created(
        format!("{} created successfully", entity.definition().label),
        to_plain_json(&record),
    ))
}

/// Fetch one record
#[utoipa::path(
    get,
    path = "/{entity}/{id}",
    tag = "Backoffice",
    params(
        ("entity" = EntityKind, Path, description = "Entity name"),
        ("id" = String, Path, description = "Record ObjectId (24 hex characters)")
    ),
    responses(
        (status = 200, description = "Record found", body = RecordResponse),
        (status = 400, response = BadRequestObjectIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_record<R: RecordRepository>(
    State(service): SharedService<R>,
    EntityPath(entity): EntityPath,
    ObjectIdPath(id): ObjectIdPath,
) -> BackofficeResult<ApiResponse<Value>> {
    let record = service.get(entity, id).await?;
    Ok(ApiResponse::ok(
        format!("{} fetched successfully", entity.definition().label),
        to_plain_json(&record),
    ))
}

/// Partially update a record
#[utoipa::path(
    patch,
    path = "/{entity}/{id}",
    tag = "Backoffice",
    params(
        ("entity" = EntityKind, Path, description = "Entity name"),
        ("id" = String, Path, description = "Record ObjectId (24 hex characters)")
    ),
    request_body = RecordPayload,
    responses(
        (status = 200, description = "Record updated", body = RecordResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_record<R: RecordRepository>(
    State(service): SharedService<R>,
    EntityPath(entity): EntityPath,
    ObjectIdPath(id): ObjectIdPath,
    payload: Result<Json<RecordPayload>, JsonRejection>,
) -> Result<ApiResponse<Value>, Response> {
    let payload = body(payload).map_err(IntoResponse::into_response)?;
    let record = service
        .update(entity, id, payload)
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(ApiResponse::ok(
        format!("{} updated successfully", entity.definition().label),
        to_plain_json(&record),
    ))
}

/// Delete a record
#[utoipa::path(
    delete,
    path = "/{entity}/{id}",
    tag = "Backoffice",
    params(
        ("entity" = EntityKind, Path, description = "Entity name"),
        ("id" = String, Path, description = "Record ObjectId (24 hex characters)")
    ),
    responses(
        (status = 200, description = "Record deleted", body = MessageResponse),
        (status = 400, response = BadRequestObjectIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_record<R: RecordRepository>(
    State(service): SharedService<R>,
    EntityPath(entity): EntityPath,
    ObjectIdPath(id): ObjectIdPath,
) -> BackofficeResult<ApiResponse<()>> {
    service.delete(entity, id).await?;
    Ok(ApiResponse::message(format!(
        "{} deleted successfully",
        entity.definition().label
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackofficeError;
    use crate::repository::MockRecordRepository;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use list_query::{ListQueryError, Listing};
    use mongodb::bson::{doc, oid::ObjectId};
    use serde_json::json;
    use tower::ServiceExt;

    const ID: &str = "65a1f0c2e4b0a1b2c3d4e5f6";

    fn app(repo: MockRecordRepository) -> Router {
        router(BackofficeService::new(repo))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_list_returns_envelope_with_plain_ids() {
        let mut repo = MockRecordRepository::new();
        repo.expect_list()
            .withf(|entity, spec| {
                *entity == EntityKind::Contacts
                    && spec.search.as_deref() == Some("john")
                    && spec.pagination.is_some()
            })
            .times(1)
            .returning(|_, _| {
                Ok(Listing {
                    data: vec![doc! { "_id": ObjectId::parse_str(ID).unwrap(), "name": "John" }],
                    count: 12,
                })
            });

        let (status, body) = send(
            app(repo),
            json_request(
                "POST",
                "/contacts/list",
                json!({ "search": "john", "pagination": { "pageSize": 1, "currentPage": 0 } }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "success": true,
                "message": "contacts fetched successfully",
                "data": [{ "_id": ID, "name": "John" }],
                "count": 12
            })
        );
    }

    #[tokio::test]
    async fn test_list_invalid_query_is_bad_request() {
        let mut repo = MockRecordRepository::new();
        repo.expect_list()
            .returning(|_, _| Err(ListQueryError::invalid("pageSize must be a positive integer").into()));

        let (status, body) = send(
            app(repo),
            json_request("POST", "/users/list", json!({ "pagination": { "pageSize": 0, "currentPage": 0 } })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "INVALID_QUERY");
    }

    #[tokio::test]
    async fn test_list_search_too_long_fails_validation() {
        let mut repo = MockRecordRepository::new();
        repo.expect_list().never();

        let (status, body) = send(
            app(repo),
            json_request("POST", "/users/list", json!({ "search": "x".repeat(201) })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_entity_is_not_found() {
        let (status, body) = send(
            app(MockRecordRepository::new()),
            json_request("POST", "/orders/list", json!({})),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Unknown entity 'orders'");
    }

    #[tokio::test]
    async fn test_invalid_object_id_is_rejected_before_lookup() {
        let mut repo = MockRecordRepository::new();
        repo.expect_find_by_id().never();

        let request = Request::builder().uri("/contacts/xyz").body(Body::empty()).unwrap();
        let (status, body) = send(app(repo), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "INVALID_OBJECT_ID");
    }

    #[tokio::test]
    async fn test_get_record() {
        let mut repo = MockRecordRepository::new();
        repo.expect_find_by_id()
            .withf(|entity, id| *entity == EntityKind::Discounts && id.to_hex() == ID)
            .returning(|_, id| Ok(Some(doc! { "_id": id, "code": "SUMMER10" })));

        let request = Request::builder().uri(format!("/discounts/{ID}")).body(Body::empty()).unwrap();
        let (status, body) = send(app(repo), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!({ "_id": ID, "code": "SUMMER10" }));
    }

    #[tokio::test]
    async fn test_create_returns_201() {
        let mut repo = MockRecordRepository::new();
        repo.expect_insert().returning(|_, mut record| {
            record.insert("_id", ObjectId::parse_str(ID).unwrap());
            Ok(record)
        });

        let (status, body) = send(
            app(repo),
            json_request(
                "POST",
                "/contacts",
                json!({ "name": "Ada", "email": "ada@example.com", "message": "Hello" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "contact created successfully");
        assert_eq!(body["data"]["_id"], ID);
        assert!(body["data"]["createdAt"].is_string());
    }

    #[tokio::test]
    async fn test_create_conflict() {
        let mut repo = MockRecordRepository::new();
        repo.expect_exists().returning(|_, _, _, _| Ok(true));

        let (status, body) = send(
            app(repo),
            json_request("POST", "/newsletters", json!({ "email": "ada@example.com" })),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "email 'ada@example.com' is already taken");
    }

    #[tokio::test]
    async fn test_create_malformed_json() {
        let request = Request::builder()
            .method("POST")
            .uri("/contacts")
            .header("content-type", "application/json")
            .body(Body::from("{"))
            .unwrap();
        let (status, body) = send(app(MockRecordRepository::new()), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "JSON_EXTRACTION");
    }

    #[tokio::test]
    async fn test_update_not_found() {
        let mut repo = MockRecordRepository::new();
        repo.expect_update().returning(|_, _, _| Ok(None));

        let (status, _) = send(
            app(repo),
            json_request("PATCH", &format!("/contacts/{ID}"), json!({ "status": "read" })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete() {
        let mut repo = MockRecordRepository::new();
        repo.expect_delete().times(1).returning(|_, _| Ok(true));

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/special-packages/{ID}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(repo), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "message": "special package deleted successfully" }));
    }

    #[tokio::test]
    async fn test_database_failure_hides_details() {
        let mut repo = MockRecordRepository::new();
        repo.expect_delete()
            .returning(|_, _| Err(BackofficeError::Database("connection refused 10.0.0.7".into())));

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/users/{ID}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(repo), request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "INTERNAL_ERROR");
    }

    #[test]
    fn test_openapi_documents_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| *p == "/{entity}/list"));
        assert!(paths.iter().any(|p| *p == "/{entity}/{id}"));
        assert!(paths.iter().any(|p| *p == "/{entity}"));
    }
}
