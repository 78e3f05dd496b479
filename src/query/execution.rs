//! Query execution: filter/order templates in, domain instances out.
//!
//! `QueryEngine` turns a filter instance (and optionally an order instance)
//! into a [`SelectQuery`], runs it through its [`SqlExecutor`] and maps every
//! returned row into a fresh domain instance, column by name.

use crate::config::QueryConfig;
use crate::diff::{filter_fields, template_fields, DiffResult};
use crate::domain::{Domain, Extends};
use crate::error::OrmError;
use crate::executor::SqlExecutor;
use crate::query::select::{PlaceholderStyle, SelectQuery};
use crate::registry::{fields, FieldMap};
use crate::row::ValueRow;
use std::any::type_name;
use std::time::Instant;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Build the SELECT for a filter and optional order template.
///
/// - columns: every registered field of `D`, in registry order
/// - WHERE: one `column=?` per field of `filter` that differs from a blank `D`
/// - ORDER BY: the fields of `order` that differ from a blank `D`, ascending;
///   the order template's values are ignored
///
/// # Errors
///
/// Returns `OrmError::InvalidArgument` if `D` has no persistable fields, or
/// the registry error for an invalid field table.
pub fn build_select<D: Domain>(filter: &D, order: Option<&D>) -> Result<SelectQuery, OrmError> {
    assemble::<D>(filter_fields(filter)?, order.map(filter_fields::<D>).transpose()?)
}

fn assemble<D: Domain>(
    predicates: DiffResult,
    keys: Option<DiffResult>,
) -> Result<SelectQuery, OrmError> {
    let columns = fields::<D>()?;
    if columns.is_empty() {
        return Err(OrmError::InvalidArgument(format!(
            "domain {} has no persistable fields",
            type_name::<D>()
        )));
    }

    let mut query = SelectQuery::new(D::TABLE_NAME).columns(columns.names());
    for clause in predicates.into_clauses() {
        query = query.filter(clause);
    }
    if let Some(keys) = keys {
        for column in keys.columns() {
            query = query.order_by(column);
        }
    }
    Ok(query)
}

/// Build a fully populated instance from one row.
///
/// # Errors
///
/// - `OrmError::MissingColumn` if the row lacks a registered column
/// - `OrmError::FieldAccess` if a value does not fit its field
pub fn map_row<D: Domain>(columns: &FieldMap<D>, row: &ValueRow) -> Result<D, OrmError> {
    let mut instance = D::default();
    for field in columns.iter() {
        let value = row.get(field.name()).cloned().ok_or(OrmError::MissingColumn {
            table: D::TABLE_NAME,
            column: field.name(),
        })?;
        field
            .set(&mut instance, value)
            .map_err(|source| OrmError::FieldAccess {
                domain: type_name::<D>(),
                field: field.name(),
                source,
            })?;
    }
    Ok(instance)
}

/// Read-only query facade over an executor
///
/// # Example
///
/// ```rust
/// use tidemark::{Domain, QueryEngine, ValueRow};
/// use tidemark::test_helpers::MemoryExecutor;
///
/// #[derive(Domain, Default, Debug, Clone, PartialEq)]
/// struct Person {
///     name: String,
///     age: i32,
/// }
///
/// let executor = MemoryExecutor::new();
/// executor.insert("Person", ValueRow::new().with("name", "Alice").with("age", 30i32));
/// executor.insert("Person", ValueRow::new().with("name", "Bob").with("age", 25i32));
///
/// let engine = QueryEngine::new(executor);
/// let filter = Person { age: 30, ..Person::default() };
/// let people: Vec<Person> = engine.list(&filter).unwrap();
///
/// assert_eq!(people, vec![Person { name: "Alice".into(), age: 30 }]);
/// ```
pub struct QueryEngine<E> {
    executor: E,
    config: QueryConfig,
}

impl<E: SqlExecutor> QueryEngine<E> {
    /// Create an engine with default settings
    pub fn new(executor: E) -> Self {
        Self::with_config(executor, QueryConfig::default())
    }

    pub fn with_config(executor: E, config: QueryConfig) -> Self {
        Self { executor, config }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Effective placeholder style: the configured override, else the executor's
    pub fn placeholder_style(&self) -> PlaceholderStyle {
        self.config
            .placeholder
            .unwrap_or_else(|| self.executor.placeholder_style())
    }

    /// The SELECT `list`/`list_ordered` would run, without running it
    ///
    /// # Errors
    ///
    /// See [`build_select`].
    pub fn select<D, F>(&self, filter: &F, order: Option<&D>) -> Result<SelectQuery, OrmError>
    where
        D: Domain,
        F: Extends<D>,
    {
        assemble::<D>(
            template_fields::<D, F>(filter)?,
            order.map(filter_fields::<D>).transpose()?,
        )
    }

    /// All rows of `D`'s table matching the filter's non-default fields
    ///
    /// The filter may be `D` or any descendant of `D`. Only `D`'s columns can
    /// become predicates, and a field counts as set when it differs from
    /// `F::default()`, the blank instance of the filter's own type.
    ///
    /// # Errors
    ///
    /// Returns `OrmError::Executor` unchanged when the executor fails, and the
    /// errors of [`build_select`] and [`map_row`].
    pub fn list<D, F>(&self, filter: &F) -> Result<Vec<D>, OrmError>
    where
        D: Domain,
        F: Extends<D>,
    {
        self.run::<D>(template_fields::<D, F>(filter)?, None)
    }

    /// Like [`list`](Self::list), sorted by the order template's non-default fields
    ///
    /// # Errors
    ///
    /// Same as [`list`](Self::list).
    pub fn list_ordered<D, F, O>(&self, filter: &F, order: &O) -> Result<Vec<D>, OrmError>
    where
        D: Domain,
        F: Extends<D>,
        O: Extends<D>,
    {
        self.run::<D>(
            template_fields::<D, F>(filter)?,
            Some(template_fields::<D, O>(order)?),
        )
    }

    /// The single matching row, if any
    ///
    /// # Errors
    ///
    /// Returns `OrmError::Ambiguous` if more than one row matches, plus the
    /// errors of [`list`](Self::list).
    pub fn find<D, F>(&self, filter: &F) -> Result<Option<D>, OrmError>
    where
        D: Domain,
        F: Extends<D>,
    {
        let mut rows = self.list(filter)?;
        match rows.len() {
            0 | 1 => Ok(rows.pop()),
            matched => Err(OrmError::Ambiguous {
                table: D::TABLE_NAME,
                matched,
            }),
        }
    }

    /// The single matching row
    ///
    /// # Errors
    ///
    /// Returns `OrmError::NotFound` if no row matches, plus the errors of
    /// [`find`](Self::find).
    pub fn get<D, F>(&self, filter: &F) -> Result<D, OrmError>
    where
        D: Domain,
        F: Extends<D>,
    {
        self.find(filter)?.ok_or(OrmError::NotFound {
            table: D::TABLE_NAME,
        })
    }

    fn run<D: Domain>(
        &self,
        predicates: DiffResult,
        keys: Option<DiffResult>,
    ) -> Result<Vec<D>, OrmError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::list_span(D::TABLE_NAME).entered();

        let columns = fields::<D>()?;
        let query = assemble::<D>(predicates, keys)?;
        if query.predicates().is_empty() && self.config.warn_on_unfiltered {
            log::warn!(
                "filter on {} has no non-default fields; reading the whole table \
                 (fields set to their default value never become predicates)",
                D::TABLE_NAME
            );
        }

        let (sql, params) = query.build(self.placeholder_style());
        if self.config.log_statements {
            log::debug!("{sql} -- params: {params:?}");
        }

        let start = Instant::now();
        let result = self.executor.query_all(&sql, &params);
        #[cfg(feature = "metrics")]
        {
            METRICS.record_query(start.elapsed());
            if result.is_err() {
                METRICS.record_query_error();
            }
        }
        let rows = result?;
        log::trace!(
            "{} row(s) from {} in {:?}",
            rows.len(),
            D::TABLE_NAME,
            start.elapsed()
        );

        let instances = rows
            .iter()
            .map(|row| map_row(columns, row))
            .collect::<Result<Vec<D>, _>>()?;
        #[cfg(feature = "metrics")]
        METRICS.record_rows_mapped(instances.len());
        Ok(instances)
    }
}
