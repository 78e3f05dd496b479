//! Query building and execution for domain types.
//!
//! - **Select**: single-table SELECT builder (`SelectQuery`, `FilterClause`)
//! - **Execution**: filter/order templates to domain instances (`QueryEngine`)
//! - **Value Conversion**: `sea_query::Value` to `ToSql` parameters and
//!   PostgreSQL rows to [`ValueRow`](crate::ValueRow)
//!
//! # Examples
//!
//! ```no_run
//! use tidemark::{config::TidemarkConfig, Domain, MayPostgresExecutor, QueryEngine};
//!
//! #[derive(Domain, Default, Debug)]
//! #[table_name = "people"]
//! struct Person {
//!     name: String,
//!     age: i32,
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TidemarkConfig::load()?;
//! let executor = MayPostgresExecutor::connect(&config.database)?;
//! let engine = QueryEngine::with_config(executor, config.query);
//!
//! // Everyone aged 30, sorted by name
//! let filter = Person { age: 30, ..Person::default() };
//! let order = Person { name: "*".into(), ..Person::default() };
//! let people: Vec<Person> = engine.list_ordered(&filter, &order)?;
//! # Ok(())
//! # }
//! ```

pub mod execution;
pub mod select;
pub mod value_conversion;

pub use execution::{build_select, map_row, QueryEngine};
pub use select::{FilterClause, PlaceholderStyle, SelectQuery};
