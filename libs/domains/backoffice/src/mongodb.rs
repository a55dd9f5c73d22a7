//! MongoDB implementation of RecordRepository

use async_trait::async_trait;
use list_query::{Listing, MongoExecutor, QuerySpec, redact};
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Bson, Document, doc, oid::ObjectId},
    options::{IndexOptions, ReturnDocument},
};
use strum::IntoEnumIterator;
use tracing::{info, instrument};

use crate::entity::EntityKind;
use crate::error::{BackofficeError, BackofficeResult};
use crate::repository::RecordRepository;

/// Stores every entity in its own collection of one database
#[derive(Clone, Debug)]
pub struct MongoRecordRepository {
    db: Database,
    executor: MongoExecutor,
}

impl MongoRecordRepository {
    pub fn new(db: Database) -> Self {
        let executor = MongoExecutor::new(db.clone());
        Self { db, executor }
    }

    fn collection(&self, entity: EntityKind) -> Collection<Document> {
        self.db.collection::<Document>(entity.profile().collection())
    }

    /// Index bootstrap run at startup.
    ///
    /// Every collection gets a descending index on its timestamp field for
    /// the default newest-first listing. Unique fields get sparse unique
    /// indexes, which also close the race between the service's duplicate
    /// pre-check and the write.
    pub async fn init_indexes(&self) -> BackofficeResult<()> {
        for entity in EntityKind::iter() {
            let def = entity.definition();
            let mut indexes = vec![
                IndexModel::builder()
                    .keys(doc! { def.profile.timestamp(): -1, "_id": 1 })
                    .build(),
            ];

            for field in def.unique {
                indexes.push(
                    IndexModel::builder()
                        .keys(doc! { *field: 1 })
                        .options(IndexOptions::builder().unique(true).sparse(true).build())
                        .build(),
                );
            }

            self.collection(entity).create_indexes(indexes).await?;
            info!(entity = %entity, unique = ?def.unique, "Indexes ensured");
        }
        Ok(())
    }
}

#[async_trait]
impl RecordRepository for MongoRecordRepository {
    #[instrument(skip(self, spec), fields(entity = %entity))]
    async fn list(&self, entity: EntityKind, spec: &QuerySpec) -> BackofficeResult<Listing> {
        Ok(list_query::run(&self.executor, entity.profile(), spec).await?)
    }

    #[instrument(skip(self), fields(entity = %entity))]
    async fn find_by_id(&self, entity: EntityKind, id: ObjectId) -> BackofficeResult<Option<Document>> {
        let profile = entity.profile();
        let collection = self.collection(entity);
        let mut find = collection.find_one(doc! { "_id": id });
        if let Some(projection) = profile.safe_projection() {
            find = find.projection(projection);
        }
        let mut record = find.await?;

        if let Some(record) = record.as_mut() {
            redact(profile, record);
        }
        Ok(record)
    }

    #[instrument(skip(self, record), fields(entity = %entity))]
    async fn insert(&self, entity: EntityKind, mut record: Document) -> BackofficeResult<Document> {
        let result = self.collection(entity).insert_one(&record).await?;
        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| BackofficeError::Internal(format!("unexpected _id {}", result.inserted_id)))?;

        record.insert("_id", id);
        info!(id = %id, "Record created");
        Ok(record)
    }

    #[instrument(skip(self, changes), fields(entity = %entity))]
    async fn update(
        &self,
        entity: EntityKind,
        id: ObjectId,
        changes: Document,
    ) -> BackofficeResult<Option<Document>> {
        let updated = self
            .collection(entity)
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": changes })
            .return_document(ReturnDocument::After)
            .await?;

        if updated.is_some() {
            info!("Record updated");
        }
        Ok(updated)
    }

    #[instrument(skip(self), fields(entity = %entity))]
    async fn delete(&self, entity: EntityKind, id: ObjectId) -> BackofficeResult<bool> {
        let result = self.collection(entity).delete_one(doc! { "_id": id }).await?;
        if result.deleted_count > 0 {
            info!("Record deleted");
        }
        Ok(result.deleted_count > 0)
    }

    #[instrument(skip(self, value), fields(entity = %entity))]
    async fn exists(
        &self,
        entity: EntityKind,
        field: &str,
        value: &Bson,
        except: Option<ObjectId>,
    ) -> BackofficeResult<bool> {
        let count = self
            .collection(entity)
            .count_documents(uniqueness_filter(field, value, except))
            .limit(1)
            .await?;
        Ok(count > 0)
    }
}

fn uniqueness_filter(field: &str, value: &Bson, except: Option<ObjectId>) -> Document {
    let mut filter = doc! { field: value.clone() };
    if let Some(id) = except {
        filter.insert("_id", doc! { "$ne": id });
    }
    filter
}
