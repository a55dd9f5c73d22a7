//! # Axum Helpers
//!
//! Shared HTTP plumbing for the admin API.
//!
//! - **[`server`]**: router assembly with OpenAPI docs, health checks, graceful shutdown
//! - **[`http`]**: CORS and security headers
//! - **[`errors`]**: `AppError`, stable error codes, the error envelope
//! - **[`extractors`]**: validated JSON bodies and ObjectId path parameters
//! - **[`response`]**: the `{ success, message, data?, count? }` success envelope

pub mod errors;
pub mod extractors;
pub mod http;
pub mod response;
pub mod server;

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    health_router, run_health_checks, shutdown_signal,
};

pub use http::{create_cors_layer, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::{ObjectIdPath, ValidatedJson};

pub use response::ApiResponse;
