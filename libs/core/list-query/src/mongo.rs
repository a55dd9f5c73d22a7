//! MongoDB implementation of [`QueryExecutor`]

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{Bson, Document},
};
use tracing::instrument;

use crate::error::{ListQueryError, ListQueryResult};
use crate::executor::{FindQuery, QueryExecutor};

/// Runs list queries as aggregation pipelines against one database
#[derive(Clone, Debug)]
pub struct MongoExecutor {
    db: Database,
}

impl MongoExecutor {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection::<Document>(name)
    }
}

#[async_trait]
impl QueryExecutor for MongoExecutor {
    #[instrument(skip(self, query), fields(skip = ?query.skip, limit = ?query.limit))]
    async fn find(&self, collection: &str, query: &FindQuery) -> ListQueryResult<Vec<Document>> {
        let cursor = self.collection(collection).aggregate(query.pipeline()).await?;
        let records: Vec<Document> = cursor.try_collect().await?;
        Ok(records)
    }

    #[instrument(skip(self, filter))]
    async fn count(&self, collection: &str, filter: &Document) -> ListQueryResult<u64> {
        Ok(self
            .collection(collection)
            .count_documents(filter.clone())
            .await?)
    }

    /// Data window and total in a single `$facet` aggregation, so both are
    /// read by the same command.
    #[instrument(skip(self, query), fields(skip = ?query.skip, limit = ?query.limit))]
    async fn find_page(
        &self,
        collection: &str,
        query: &FindQuery,
    ) -> ListQueryResult<(Vec<Document>, u64)> {
        let pipeline = query.facet_pipeline();

        let mut cursor = self.collection(collection).aggregate(pipeline).await?;
        let facet = cursor.try_next().await?.unwrap_or_default();
        split_facet(facet)
    }
}

/// Unpack `{ data: [...], total: [{ count: n }] }`. `total` is empty when
/// nothing matched.
fn split_facet(mut facet: Document) -> ListQueryResult<(Vec<Document>, u64)> {
    let data = match facet.remove("data") {
        Some(Bson::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Bson::Document(record) => Ok(record),
                other => Err(ListQueryError::QueryExecutionFailure(format!(
                    "unexpected facet entry: {other}"
                ))),
            })
            .collect::<ListQueryResult<Vec<_>>>()?,
        None => Vec::new(),
        Some(other) => {
            return Err(ListQueryError::QueryExecutionFailure(format!(
                "unexpected facet data: {other}"
            )));
        }
    };

    let count = facet
        .get_array("total")
        .ok()
        .and_then(|total| total.first())
        .and_then(Bson::as_document)
        .and_then(|entry| match entry.get("count") {
            Some(Bson::Int32(n)) => u64::try_from(*n).ok(),
            Some(Bson::Int64(n)) => u64::try_from(*n).ok(),
            _ => None,
        })
        .unwrap_or(0);

    Ok((data, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_split_facet() {
        let facet = doc! {
            "data": [{ "name": "a" }, { "name": "b" }],
            "total": [{ "count": 25 }],
        };
        let (data, count) = split_facet(facet).unwrap();
        assert_eq!(data, vec![doc! { "name": "a" }, doc! { "name": "b" }]);
        assert_eq!(count, 25);
    }

    #[test]
    fn test_split_facet_no_matches() {
        let (data, count) = split_facet(doc! { "data": [], "total": [] }).unwrap();
        assert!(data.is_empty());
        assert_eq!(count, 0);
        assert_eq!(split_facet(Document::new()).unwrap(), (vec![], 0));
    }

    #[test]
    fn test_split_facet_rejects_malformed_data() {
        let err = split_facet(doc! { "data": [1, 2], "total": [] }).unwrap_err();
        assert!(matches!(err, ListQueryError::QueryExecutionFailure(_)));
    }
}
