use async_trait::async_trait;
use list_query::{Listing, QuerySpec};
use mongodb::bson::{Bson, Document, oid::ObjectId};

use crate::entity::EntityKind;
use crate::error::BackofficeResult;

/// Record persistence for every back-office entity.
///
/// Records are untyped documents; the entity decides the collection and the
/// profile list queries run against.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Run a list query through the shared engine
    async fn list(&self, entity: EntityKind, spec: &QuerySpec) -> BackofficeResult<Listing>;

    /// One record with the entity's default projection applied
    async fn find_by_id(&self, entity: EntityKind, id: ObjectId) -> BackofficeResult<Option<Document>>;

    /// Insert and return the full stored record
    async fn insert(&self, entity: EntityKind, record: Document) -> BackofficeResult<Document>;

    /// `$set` the given fields; `None` when no record has `id`
    async fn update(
        &self,
        entity: EntityKind,
        id: ObjectId,
        changes: Document,
    ) -> BackofficeResult<Option<Document>>;

    /// Returns whether a record was removed
    async fn delete(&self, entity: EntityKind, id: ObjectId) -> BackofficeResult<bool>;

    /// Another record (not `except`) already has `field == value`
    async fn exists(
        &self,
        entity: EntityKind,
        field: &str,
        value: &Bson,
        except: Option<ObjectId>,
    ) -> BackofficeResult<bool>;
}
