use async_trait::async_trait;
use mongodb::bson::{Bson, Document, doc};

use crate::error::ListQueryResult;

/// A fully resolved read: filter, sort, window, projection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    pub filter: Document,
    pub sort: Document,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    pub projection: Option<Document>,
}

impl FindQuery {
    /// `$match → $sort → $skip → $limit → $project`, omitting unused stages
    pub fn pipeline(&self) -> Vec<Document> {
        let mut stages = vec![doc! { "$match": self.filter.clone() }];
        if !self.sort.is_empty() {
            stages.push(doc! { "$sort": self.sort.clone() });
        }
        stages.extend(self.window_stages());
        stages
    }

    /// `$match`, then a `$facet` holding the sorted data window and the
    /// total match count, so both come from one command
    pub fn facet_pipeline(&self) -> Vec<Document> {
        let mut data = Vec::new();
        if !self.sort.is_empty() {
            data.push(doc! { "$sort": self.sort.clone() });
        }
        data.extend(self.window_stages());

        vec![
            doc! { "$match": self.filter.clone() },
            doc! { "$facet": {
                "data": data,
                "total": [{ "$count": "count" }],
            } },
        ]
    }

    /// Stages applied after `$sort`: the page window and the projection
    pub fn window_stages(&self) -> Vec<Document> {
        let mut stages = Vec::new();
        if let Some(skip) = self.skip {
            stages.push(doc! { "$skip": as_bson_int(skip) });
        }
        if let Some(limit) = self.limit {
            stages.push(doc! { "$limit": as_bson_int(limit) });
        }
        if let Some(projection) = &self.projection {
            stages.push(doc! { "$project": projection.clone() });
        }
        stages
    }
}

fn as_bson_int(n: u64) -> Bson {
    Bson::Int64(i64::try_from(n).unwrap_or(i64::MAX))
}

/// Storage engine the list engine hands its queries to.
///
/// `find` returns records in sort order within `[skip, skip + limit)`;
/// `count` returns the number of records matching `filter` under the same
/// semantics. Implementations map their own failures onto
/// [`ListQueryError`](crate::ListQueryError).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn find(&self, collection: &str, query: &FindQuery) -> ListQueryResult<Vec<Document>>;

    async fn count(&self, collection: &str, filter: &Document) -> ListQueryResult<u64>;

    /// One page of records plus the total match count, ignoring the window
    async fn find_page(
        &self,
        collection: &str,
        query: &FindQuery,
    ) -> ListQueryResult<(Vec<Document>, u64)> {
        let data = self.find(collection, query).await?;
        let count = self.count(collection, &query.filter).await?;
        Ok((data, count))
    }
}
