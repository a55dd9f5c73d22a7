//! API routes, nested under `/api` by `axum_helpers::create_router`

pub mod health;

use axum::Router;

use crate::state::AppState;

pub fn routes(state: &AppState) -> Router {
    Router::new()
        .merge(domain_backoffice::handlers::router(state.backoffice.clone()))
        .merge(health::router(state.clone()))
}
