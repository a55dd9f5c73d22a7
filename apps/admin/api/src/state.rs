//! Shared application state.

use domain_backoffice::{BackofficeService, MongoRecordRepository};
use mongodb::Client;

/// Cloned into every router; all fields are cheap handles.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    /// Kept for readiness probes and shutdown
    pub mongo_client: Client,
    pub backoffice: BackofficeService<MongoRecordRepository>,
}
