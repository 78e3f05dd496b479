//! SQL executor seam
//!
//! The query engine never talks to a database directly. It hands SQL text and
//! positional `sea_query::Value` parameters to a [`SqlExecutor`] and gets
//! [`ValueRow`]s back. [`MayPostgresExecutor`] is the adapter over
//! `may_postgres::Client`; tests use `test_helpers::MemoryExecutor`
//! (`test-helpers` feature).

use crate::config::DatabaseConfig;
use crate::query::value_conversion::{row_to_value_row, with_converted_params};
use crate::query::PlaceholderStyle;
use crate::row::ValueRow;
use may_postgres::{Client, Error as PostgresError};
use sea_query::Value;
use std::fmt;
use std::time::Instant;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Executor error type
///
/// Returned unchanged to callers of the query engine (wrapped in
/// [`OrmError::Executor`](crate::OrmError::Executor)).
#[derive(Debug)]
pub enum ExecError {
    /// `PostgreSQL` error from `may_postgres`
    PostgresError(PostgresError),
    /// Query execution error
    QueryError(String),
    /// Row parsing/conversion error
    ParseError(String),
    /// Other execution errors
    Other(String),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::PostgresError(e) => write!(f, "PostgreSQL error: {e}"),
            ExecError::QueryError(s) => write!(f, "Query error: {s}"),
            ExecError::ParseError(s) => write!(f, "Parse error: {s}"),
            ExecError::Other(s) => write!(f, "Execution error: {s}"),
        }
    }
}

impl std::error::Error for ExecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecError::PostgresError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PostgresError> for ExecError {
    fn from(err: PostgresError) -> Self {
        ExecError::PostgresError(err)
    }
}

/// Trait for running parameterized SELECT statements
///
/// Implementations bind `params` positionally, in slice order, and return
/// every row with values addressable by column name. They perform no
/// coercion: a column's `Value` variant must already match the field it maps
/// to.
///
/// # Examples
///
/// ```no_run
/// use tidemark::{SqlExecutor, ExecError, MayPostgresExecutor};
/// use sea_query::Value;
///
/// # fn example(executor: &MayPostgresExecutor) -> Result<(), ExecError> {
/// let rows = executor.query_all(
///     "SELECT\n  name\nFROM Person\nWHERE age=$1;",
///     &[Value::Int(Some(30))],
/// )?;
/// let names: Vec<_> = rows.iter().filter_map(|r| r.get("name")).collect();
/// # Ok(())
/// # }
/// ```
pub trait SqlExecutor {
    /// Execute a query and return all rows
    ///
    /// # Errors
    ///
    /// Returns `ExecError` if the query execution or row conversion fails.
    fn query_all(&self, query: &str, params: &[Value]) -> Result<Vec<ValueRow>, ExecError>;

    /// Placeholder syntax this executor understands.
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Question
    }
}

impl<E: SqlExecutor + ?Sized> SqlExecutor for &E {
    fn query_all(&self, query: &str, params: &[Value]) -> Result<Vec<ValueRow>, ExecError> {
        (**self).query_all(query, params)
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        (**self).placeholder_style()
    }
}

/// Implementation of `SqlExecutor` for `may_postgres::Client`
pub struct MayPostgresExecutor {
    client: Client,
}

impl MayPostgresExecutor {
    /// Create a new executor from a `may_postgres::Client`
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the `database` section of the configuration
    ///
    /// # Errors
    ///
    /// Returns `ExecError::Other` for an empty URL and
    /// `ExecError::PostgresError` when the connection fails.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tidemark::{config::TidemarkConfig, MayPostgresExecutor};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = TidemarkConfig::load()?;
    /// let executor = MayPostgresExecutor::connect(&config.database)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn connect(config: &DatabaseConfig) -> Result<Self, ExecError> {
        if config.url.trim().is_empty() {
            return Err(ExecError::Other("database url cannot be empty".to_string()));
        }
        // may_postgres::connect is blocking and works inside or outside coroutines
        let client = may_postgres::connect(&config.url)?;
        log::debug!("connected to postgres");
        Ok(Self::new(client))
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Consume the executor and return the underlying client
    pub fn into_client(self) -> Client {
        self.client
    }
}

impl SqlExecutor for MayPostgresExecutor {
    fn query_all(&self, query: &str, params: &[Value]) -> Result<Vec<ValueRow>, ExecError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_query_span(query).entered();

        let start = Instant::now();
        let result = with_converted_params(params, |params| {
            self.client.query(query, params).map_err(ExecError::PostgresError)
        })
        .and_then(|rows| rows.iter().map(row_to_value_row).collect::<Result<Vec<_>, _>>());

        log::trace!("postgres query finished in {:?}", start.elapsed());

        result
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Numbered
    }
}
