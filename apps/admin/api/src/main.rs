use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_backoffice::{BackofficeService, MongoRecordRepository};
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!("Connecting to MongoDB at {}", config.mongodb.redacted_url());
    let mongo_client = database::mongodb::connect_from_config_with_retry(&config.mongodb, None).await?;
    info!("Connected to MongoDB database: {}", config.mongodb.database());

    let repository = MongoRecordRepository::new(mongo_client.database(config.mongodb.database()));
    repository.init_indexes().await?;

    let state = AppState {
        config,
        mongo_client,
        backoffice: BackofficeService::new(repository),
    };

    let api_routes = api::routes(&state);
    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes, &state.config.server).await?;
    let app = router.merge(health_router(state.config.app));

    info!(
        "Starting {} v{} (shutdown timeout {:?})",
        state.config.app.name, state.config.app.version, state.config.server.shutdown_timeout
    );

    let client = state.mongo_client.clone();
    create_production_app(app, &state.config.server, async move {
        info!("Shutting down: closing MongoDB connections");
        client.shutdown().await;
        info!("MongoDB connections closed");
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Admin API shutdown complete");
    Ok(())
}
