//! # Tidemark
//!
//! Filter-by-example ORM core over `may_postgres`.
//!
//! A domain type is a plain struct with `#[derive(Domain)]`. Its fields form a
//! cached, ordered descriptor table (the field registry). A filter is just an
//! instance of the type: every field that differs from a blank instance becomes
//! an equality predicate, and an order instance contributes its non-default
//! fields as sort keys. The resulting SELECT runs through a [`SqlExecutor`] and
//! each row is mapped back into a fresh instance by column name.
//!
//! ```rust
//! use tidemark::{Domain, QueryEngine, ValueRow};
//! use tidemark::test_helpers::MemoryExecutor;
//!
//! #[derive(Domain, Default, Debug, PartialEq)]
//! struct Person {
//!     name: String,
//!     age: i32,
//! }
//!
//! let executor = MemoryExecutor::new().with_rows(
//!     "Person",
//!     vec![
//!         ValueRow::new().with("name", "Bob").with("age", 30i32),
//!         ValueRow::new().with("name", "Ann").with("age", 30i32),
//!     ],
//! );
//! let engine = QueryEngine::new(executor);
//!
//! let filter = Person { age: 30, ..Person::default() };
//! let order = Person { name: "any".into(), ..Person::default() };
//! let people: Vec<Person> = engine.list_ordered(&filter, &order).unwrap();
//!
//! assert_eq!(people[0].name, "Ann");
//! assert_eq!(
//!     engine.executor().last_statement().unwrap().sql,
//!     "SELECT\n  name,\n  age\nFROM Person\nWHERE age=?\nORDER BY name;"
//! );
//! ```
//!
//! Fields left at their default value (`0`, `""`, `false`, `None`) never
//! become predicates, so a filter cannot ask for "age = 0".

// Lets `#[derive(Domain)]` output (which names `::tidemark`) compile inside this crate
extern crate self as tidemark;

pub mod config;
pub mod diff;
pub mod domain;
pub mod error;
pub mod executor;
#[cfg(any(feature = "metrics", feature = "tracing"))]
pub mod metrics;
pub mod query;
pub mod registry;
pub mod row;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod value;

pub use diff::{
    diff, diff_any, filter_fields, structurally_equal, template_fields, AnyDomain, DiffResult,
};
pub use domain::{Domain, Extends, FieldDescriptor};
pub use error::OrmError;
pub use executor::{ExecError, MayPostgresExecutor, SqlExecutor};
pub use query::{FilterClause, PlaceholderStyle, QueryEngine, SelectQuery};
pub use registry::{fields, FieldCache, FieldMap};
pub use row::ValueRow;
pub use value::{ValueExtractionError, ValueType};

// Derive macro shares the trait's name, like serde's `Serialize`
pub use tidemark_derive::Domain;
