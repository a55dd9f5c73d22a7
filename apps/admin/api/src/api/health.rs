//! Readiness endpoint

use axum::{Router, extract::State, response::IntoResponse, routing::get};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};
use mongodb::Client;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(readiness_check))
        .with_state(state.mongo_client)
}

/// 200 while MongoDB answers a ping, 503 otherwise
async fn readiness_check(State(client): State<Client>) -> impl IntoResponse {
    let checks: Vec<(&str, HealthCheckFuture)> = vec![(
        "mongodb",
        Box::pin(async {
            let status = database::mongodb::check_health_detailed(&client).await;
            if status.healthy {
                tracing::debug!(response_time_ms = status.response_time_ms, "MongoDB ping");
                Ok(())
            } else {
                Err(status.message.unwrap_or_else(|| "ping failed".to_string()))
            }
        }),
    )];

    run_health_checks(checks).await
}
