use mongodb::bson::Document;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::error::ListQueryResult;
use crate::executor::{FindQuery, QueryExecutor};
use crate::filter::normalize_filter;
use crate::pagination::PageWindow;
use crate::profile::EntityProfile;
use crate::projection::{redact, resolve_projection};
use crate::query::QuerySpec;
use crate::sort::resolve_sort;

/// Records plus a count.
///
/// For a paginated query `count` is the number of records matching the
/// filter; otherwise it is `data.len()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Listing {
    pub data: Vec<Document>,
    pub count: u64,
}

/// The executor-ready form of a [`QuerySpec`]
#[derive(Debug, Clone, PartialEq)]
pub struct ListPlan {
    pub query: FindQuery,
    pub window: Option<PageWindow>,
}

/// Validate `spec` and resolve it against `profile` without touching storage
pub fn plan(profile: &EntityProfile, spec: &QuerySpec) -> ListQueryResult<ListPlan> {
    let window = spec
        .pagination
        .as_ref()
        .map(PageWindow::try_from)
        .transpose()?;

    let query = FindQuery {
        filter: normalize_filter(profile, spec.filter.as_ref(), spec.search.as_deref())?,
        sort: resolve_sort(profile, spec.sort.as_ref())?,
        skip: window.map(|w| w.skip()),
        limit: window.map(|w| w.limit()),
        projection: resolve_projection(profile, spec.select.as_ref())?,
    };

    Ok(ListPlan { query, window })
}

/// Run a list query for one entity.
///
/// With pagination the executor returns one window plus the total match
/// count; without it every match is returned. Sensitive fields are removed
/// from each record before it is handed back.
#[instrument(skip(executor, profile, spec), fields(entity = profile.name()))]
pub async fn run<E>(executor: &E, profile: &EntityProfile, spec: &QuerySpec) -> ListQueryResult<Listing>
where
    E: QueryExecutor + ?Sized,
{
    let ListPlan { query, window } = plan(profile, spec)?;
    debug!(filter = %query.filter, sort = %query.sort, "Planned list query");

    let result = match window {
        Some(_) => executor.find_page(profile.collection(), &query).await,
        None => executor.find(profile.collection(), &query).await.map(|data| {
            let count = data.len() as u64;
            (data, count)
        }),
    };

    let (mut data, count) = result.inspect_err(|e| warn!(error = %e, "List query failed"))?;
    for record in &mut data {
        redact(profile, record);
    }

    debug!(returned = data.len(), count, "List query completed");
    Ok(Listing { data, count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ListQueryError;
    use crate::executor::MockQueryExecutor;
    use crate::query::Selection;
    use mongodb::bson::doc;

    fn users() -> EntityProfile {
        EntityProfile::new("users", "users")
            .searchable(&["name", "email"])
            .default_projection(&["name", "email", "createdAt"])
            .sensitive(&["password"])
    }

    #[test]
    fn test_plan_for_empty_spec() {
        let plan = plan(&users(), &QuerySpec::new()).unwrap();
        assert_eq!(plan.window, None);
        assert_eq!(
            plan.query,
            FindQuery {
                filter: doc! {},
                sort: doc! { "createdAt": -1, "_id": 1 },
                skip: None,
                limit: None,
                projection: Some(doc! { "name": 1, "email": 1, "createdAt": 1 }),
            }
        );
    }

    #[test]
    fn test_plan_paginated_window() {
        let plan = plan(&users(), &QuerySpec::new().paginate(10, 2)).unwrap();
        assert_eq!(plan.query.skip, Some(20));
        assert_eq!(plan.query.limit, Some(10));
        assert_eq!(plan.window.map(|w| w.current_page()), Some(2));
    }

    #[tokio::test]
    async fn test_unpaginated_uses_find_and_len_as_count() {
        let mut executor = MockQueryExecutor::new();
        executor
            .expect_find()
            .withf(|collection, query| collection == "users" && query.skip.is_none())
            .times(1)
            .returning(|_, _| Ok(vec![doc! { "name": "a" }, doc! { "name": "b" }]));
        executor.expect_count().never();
        executor.expect_find_page().never();

        let listing = run(&executor, &users(), &QuerySpec::new()).await.unwrap();
        assert_eq!(listing.count, 2);
        assert_eq!(listing.data.len(), 2);
    }

    #[tokio::test]
    async fn test_paginated_uses_find_page() {
        let mut executor = MockQueryExecutor::new();
        executor
            .expect_find_page()
            .withf(|_, query| query.skip == Some(10) && query.limit == Some(5))
            .times(1)
            .returning(|_, _| Ok((vec![doc! { "name": "a" }], 11)));
        executor.expect_find().never();

        let spec = QuerySpec::new().paginate(5, 2);
        let listing = run(&executor, &users(), &spec).await.unwrap();
        assert_eq!(listing, Listing { data: vec![doc! { "name": "a" }], count: 11 });
    }

    #[tokio::test]
    async fn test_records_are_redacted_even_if_executor_leaks() {
        let mut executor = MockQueryExecutor::new();
        executor
            .expect_find()
            .returning(|_, _| Ok(vec![doc! { "name": "a", "password": "$argon2id$..." }]));

        let spec = QuerySpec::new().with_select(Selection::Map(doc! { "password": 1 }));
        let listing = run(&executor, &users(), &spec).await.unwrap();
        assert_eq!(listing.data, vec![doc! { "name": "a" }]);
    }

    #[tokio::test]
    async fn test_invalid_spec_never_reaches_executor() {
        let mut executor = MockQueryExecutor::new();
        executor.expect_find().never();
        executor.expect_find_page().never();

        let mut spec = QuerySpec::new().paginate(10, 0);
        if let Some(page) = spec.pagination.as_mut() {
            page.page_size = Some(serde_json::json!("lots"));
        }
        let err = run(&executor, &users(), &spec).await.unwrap_err();
        assert!(matches!(err, ListQueryError::InvalidSpecification(_)));
    }

    #[tokio::test]
    async fn test_executor_errors_propagate_unchanged() {
        let mut executor = MockQueryExecutor::new();
        executor
            .expect_find_page()
            .returning(|_, _| Err(ListQueryError::ProjectionMismatch("path collision".into())));

        let err = run(&executor, &users(), &QuerySpec::new().paginate(10, 0))
            .await
            .unwrap_err();
        assert_eq!(err, ListQueryError::ProjectionMismatch("path collision".into()));
    }
}
