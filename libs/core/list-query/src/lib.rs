//! Generic list-query engine for back-office collections.
//!
//! A [`QuerySpec`] (filter, search, sort, select, pagination) is resolved
//! against an [`EntityProfile`] into a [`FindQuery`] and handed to a
//! [`QueryExecutor`]. The same engine serves every entity; only the profile
//! differs.
//!
//! ```ignore
//! use list_query::{EntityProfile, MongoExecutor, QuerySpec, run};
//!
//! let executor = MongoExecutor::new(db);
//! let contacts = EntityProfile::new("contacts", "contacts").searchable(&["name", "email"]);
//! let listing = run(&executor, &contacts, &QuerySpec::new().with_search("john").paginate(10, 0)).await?;
//! ```

mod builder;
mod error;
mod executor;
mod filter;
mod mongo;
mod pagination;
mod profile;
mod projection;
mod query;
mod sort;

pub use builder::{ListPlan, Listing, plan, run};
pub use error::{ListQueryError, ListQueryResult};
pub use executor::{FindQuery, QueryExecutor};
pub use filter::{normalize_filter, tokenize_search};
pub use mongo::MongoExecutor;
pub use pagination::PageWindow;
pub use profile::EntityProfile;
pub use projection::{redact, resolve_projection};
pub use query::{PaginationInput, QuerySpec, Selection};
pub use sort::{default_sort, resolve_sort};
