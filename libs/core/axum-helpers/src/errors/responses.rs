//! Reusable OpenAPI response types for consistent API documentation.

use super::ErrorResponse;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToResponse;

#[derive(ToResponse)]
#[response(
    description = "Internal Server Error",
    content_type = "application/json",
    example = json!({
        "success": false,
        "code": 2020,
        "error": "QUERY_EXECUTION",
        "message": "Query execution failed"
    })
)]
pub struct InternalServerErrorResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Validation Error",
    content_type = "application/json",
    example = json!({
        "success": false,
        "code": 1001,
        "error": "VALIDATION_ERROR",
        "message": "Request validation failed",
        "details": {
            "search": [{
                "code": "length",
                "message": null,
                "params": {"max": 200}
            }]
        }
    })
)]
pub struct BadRequestValidationResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Rejected list query",
    content_type = "application/json",
    example = json!({
        "success": false,
        "code": 1013,
        "error": "INVALID_QUERY",
        "message": "invalid query specification: pageSize must be a positive integer"
    })
)]
pub struct BadRequestQueryResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Invalid record id",
    content_type = "application/json",
    example = json!({
        "success": false,
        "code": 1002,
        "error": "INVALID_OBJECT_ID",
        "message": "Invalid record id"
    })
)]
pub struct BadRequestObjectIdResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Resource not found",
    content_type = "application/json",
    example = json!({
        "success": false,
        "code": 1004,
        "error": "NOT_FOUND",
        "message": "contacts 65a1f0c2e4b0a1b2c3d4e5f6 not found"
    })
)]
pub struct NotFoundResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Conflict - Unique value already taken",
    content_type = "application/json",
    example = json!({
        "success": false,
        "code": 1008,
        "error": "CONFLICT",
        "message": "email 'ada@example.com' is already taken"
    })
)]
pub struct ConflictResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Service Unavailable",
    content_type = "application/json",
    example = json!({
        "success": false,
        "code": 1011,
        "error": "SERVICE_UNAVAILABLE",
        "message": "Service temporarily unavailable"
    })
)]
pub struct ServiceUnavailableResponse(pub ErrorResponse);
