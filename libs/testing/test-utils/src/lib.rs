//! Shared test utilities for the list engine and domain crates
//!
//! - `InMemoryExecutor`: a `QueryExecutor` over in-memory collections (always available)
//! - `TestMongo`: MongoDB container with automatic cleanup (feature: "mongo")
//! - `TestDataBuilder`: Deterministic test data generation (always available)
//! - `assertions`: Custom assertion helpers (always available)
//!
//! # Usage
//!
//! ```rust,no_run
//! use list_query::{EntityProfile, QuerySpec, run};
//! use mongodb::bson::doc;
//! use test_utils::{InMemoryExecutor, TestDataBuilder};
//!
//! # async fn example() {
//! let builder = TestDataBuilder::from_test_name("my_test");
//! let executor = InMemoryExecutor::new().with_records(
//!     "contacts",
//!     vec![doc! { "_id": builder.object_id(0), "name": "John", "createdAt": builder.timestamp(0) }],
//! );
//! let contacts = EntityProfile::new("contacts", "contacts").searchable(&["name"]);
//! let listing = run(&executor, &contacts, &QuerySpec::new().with_search("jo")).await.unwrap();
//! assert_eq!(listing.count, 1);
//! # }
//! ```

use mongodb::bson::{DateTime, oid::ObjectId};

mod memory;

#[cfg(feature = "mongo")]
mod mongo;

pub use memory::InMemoryExecutor;

#[cfg(feature = "mongo")]
pub use mongo::TestMongo;

/// Milliseconds since the epoch for `timestamp(0)`: 2024-01-01T00:00:00Z
const BASE_TIMESTAMP_MS: i64 = 1_704_067_200_000;

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by using seeded data.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_list_contacts");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Deterministic ObjectId; ids ascend with `index`
    pub fn object_id(&self, index: u32) -> ObjectId {
        let mut bytes = [0u8; 12];
        bytes[..8].copy_from_slice(&self.seed.to_be_bytes());
        bytes[8..].copy_from_slice(&index.to_be_bytes());
        ObjectId::from_bytes(bytes)
    }

    /// Creation timestamp `index` seconds after a fixed base
    pub fn timestamp(&self, index: u32) -> DateTime {
        DateTime::from_millis(BASE_TIMESTAMP_MS + i64::from(index) * 1_000)
    }

    /// Generate a unique name for testing
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::new(7);
    /// assert_eq!(builder.name("contact", "main"), "test-contact-7-main");
    /// ```
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// Unique, syntactically valid e-mail address
    pub fn email(&self, local: &str) -> String {
        format!("{}.{}@example.com", local, self.seed)
    }
}

/// Test assertion helpers
pub mod assertions {
    use mongodb::bson::{Document, oid::ObjectId};

    /// Assert that two ObjectIds are equal with a nice error message
    pub fn assert_object_id_eq(actual: ObjectId, expected: ObjectId, context: &str) {
        assert_eq!(
            actual, expected,
            "{}: expected ObjectId {}, got {}",
            context, expected, actual
        );
    }

    /// Assert that no record carries `field` at the top level
    pub fn assert_field_absent(records: &[Document], field: &str) {
        for record in records {
            assert!(
                !record.contains_key(field),
                "field '{}' leaked in record {}",
                field,
                record
            );
        }
    }

    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_builder_deterministic() {
        let builder1 = TestDataBuilder::new(42);
        let builder2 = TestDataBuilder::new(42);

        assert_eq!(builder1.object_id(3), builder2.object_id(3));
        assert_eq!(builder1.email("ada"), builder2.email("ada"));
    }

    #[test]
    fn test_object_ids_ascend_with_index() {
        let builder = TestDataBuilder::from_test_name("my_test");
        assert!(builder.object_id(1).bytes() < builder.object_id(2).bytes());
        assert!(builder.timestamp(1) < builder.timestamp(2));
    }

    #[test]
    fn test_data_builder_different_names() {
        let builder1 = TestDataBuilder::from_test_name("test1");
        let builder2 = TestDataBuilder::from_test_name("test2");

        assert_ne!(builder1.object_id(0), builder2.object_id(0));
    }
}
