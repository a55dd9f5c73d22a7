//! Custom extractors for Axum handlers.
//!
//! Both reject with the standard [`ErrorResponse`](crate::errors::ErrorResponse) envelope.

pub mod object_id_path;
pub mod validated_json;

pub use object_id_path::ObjectIdPath;
pub use validated_json::ValidatedJson;
