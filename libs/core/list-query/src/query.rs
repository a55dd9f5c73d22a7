use mongodb::bson::Document;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Body of a list request.
///
/// Every part is optional; an empty spec lists everything newest-first with
/// the entity's default projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuerySpec {
    /// Structured MongoDB filter, e.g. `{"status": "active"}`
    #[schema(value_type = Option<Object>)]
    pub filter: Option<Document>,

    /// Free text matched case-insensitively against the entity's searchable fields
    #[validate(length(max = 200))]
    #[schema(example = "john")]
    pub search: Option<String>,

    /// Field to direction, e.g. `{"createdAt": -1}` or `{"name": "asc"}`
    #[schema(value_type = Option<Object>)]
    pub sort: Option<Document>,

    /// `{"name": 1, "email": 1}` or `"name email -phone"`
    #[schema(value_type = Option<Object>)]
    pub select: Option<Selection>,

    pub pagination: Option<PaginationInput>,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Document) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_select(mut self, select: Selection) -> Self {
        self.select = Some(select);
        self
    }

    pub fn paginate(mut self, page_size: i64, current_page: i64) -> Self {
        self.pagination = Some(PaginationInput::new(page_size, current_page));
        self
    }
}

/// Field selection as sent by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    /// Space or comma separated names; `-name` excludes
    Fields(String),
    /// Field to `0`/`1`/`true`/`false`
    Map(Document),
}

/// Raw paging input.
///
/// Values stay untyped here so that a malformed page reaches the planner and
/// is reported as an invalid specification instead of a body parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInput {
    #[schema(value_type = Option<i64>, minimum = 1, example = 10)]
    pub page_size: Option<serde_json::Value>,

    /// Zero-based
    #[schema(value_type = Option<i64>, minimum = 0, example = 0)]
    pub current_page: Option<serde_json::Value>,
}

impl PaginationInput {
    pub fn new(page_size: i64, current_page: i64) -> Self {
        Self {
            page_size: Some(page_size.into()),
            current_page: Some(current_page.into()),
        }
    }
}
