use mongodb::bson::{Document, doc};

/// Per-entity configuration the generic engine is keyed by.
///
/// ```
/// use list_query::EntityProfile;
///
/// let users = EntityProfile::new("users", "users")
///     .searchable(&["name", "email", "phone"])
///     .default_projection(&["name", "email", "phone", "role", "createdAt"])
///     .sensitive(&["password"]);
/// assert!(users.is_sensitive("password"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EntityProfile {
    name: &'static str,
    collection: &'static str,
    searchable_fields: Vec<&'static str>,
    default_projection: Vec<&'static str>,
    sensitive_fields: Vec<&'static str>,
    timestamp_field: &'static str,
}

impl EntityProfile {
    pub fn new(name: &'static str, collection: &'static str) -> Self {
        Self {
            name,
            collection,
            searchable_fields: Vec::new(),
            default_projection: Vec::new(),
            sensitive_fields: Vec::new(),
            timestamp_field: "createdAt",
        }
    }

    /// Fields a free-text search is matched against
    pub fn searchable(mut self, fields: &[&'static str]) -> Self {
        self.searchable_fields = fields.to_vec();
        self
    }

    /// Fields returned when the caller selects nothing. Empty means every
    /// field except the sensitive ones.
    pub fn default_projection(mut self, fields: &[&'static str]) -> Self {
        self.default_projection = fields.to_vec();
        self
    }

    /// Fields (dotted paths allowed) that never leave the engine
    pub fn sensitive(mut self, fields: &[&'static str]) -> Self {
        self.sensitive_fields = fields.to_vec();
        self
    }

    /// Creation timestamp used for the default newest-first sort
    pub fn timestamp_field(mut self, field: &'static str) -> Self {
        self.timestamp_field = field;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn collection(&self) -> &'static str {
        self.collection
    }

    pub fn searchable_fields(&self) -> &[&'static str] {
        &self.searchable_fields
    }

    pub fn sensitive_fields(&self) -> &[&'static str] {
        &self.sensitive_fields
    }

    pub fn timestamp(&self) -> &'static str {
        self.timestamp_field
    }

    /// `path` is a sensitive field or lies inside one
    pub fn is_sensitive(&self, path: &str) -> bool {
        self.sensitive_fields
            .iter()
            .any(|field| path == *field || is_sub_path(path, field))
    }

    /// Like [`is_sensitive`](Self::is_sensitive), but also true for ancestors
    /// of a sensitive field, whose value would carry it along.
    pub fn touches_sensitive(&self, path: &str) -> bool {
        self.is_sensitive(path) || self.sensitive_fields.iter().any(|f| is_sub_path(f, path))
    }

    /// Default projection with sensitive fields stripped.
    ///
    /// Falls back to excluding the sensitive fields when no safe field set
    /// is configured, and to `None` when there is nothing to hide.
    pub fn safe_projection(&self) -> Option<Document> {
        let included: Document = self
            .default_projection
            .iter()
            .filter(|field| !self.touches_sensitive(field))
            .map(|field| (field.to_string(), 1.into()))
            .collect();

        if !included.is_empty() {
            return Some(included);
        }
        self.exclusion_of_sensitive()
    }

    pub(crate) fn exclusion_of_sensitive(&self) -> Option<Document> {
        if self.sensitive_fields.is_empty() {
            return None;
        }
        let mut excluded = doc! {};
        for field in &self.sensitive_fields {
            excluded.insert(field.to_string(), 0);
        }
        Some(excluded)
    }
}

fn is_sub_path(path: &str, parent: &str) -> bool {
    path.len() > parent.len() && path.starts_with(parent) && path.as_bytes()[parent.len()] == b'.'
}
