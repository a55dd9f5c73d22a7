//! Back-office Domain
//!
//! Generic list and CRUD endpoints over the back-office collections
//! (contacts, newsletters, galleries, manuscripts, profiles, discounts,
//! special packages, admins and users). One entity catalogue drives every
//! route; list queries run through `list_query`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← /{entity}/list, /{entity}, /{entity}/{id}
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Field rules, slugs, uniqueness, password hashing
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + MongoDB implementation)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Entity    │  ← Catalogue: collection, profile and rules per entity
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_backoffice::{BackofficeService, MongoRecordRepository, handlers};
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let repository = MongoRecordRepository::new(client.database("backoffice"));
//! repository.init_indexes().await?;
//!
//! let router = handlers::router(BackofficeService::new(repository));
//! # Ok(())
//! # }
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;
pub mod slug;

pub use entity::{EntityDefinition, EntityKind};
pub use error::{BackofficeError, BackofficeResult};
pub use handlers::ApiDoc;
pub use models::{RecordPayload, to_plain_json};
pub use mongodb::MongoRecordRepository;
pub use repository::RecordRepository;
pub use service::BackofficeService;
