//! In-memory executor for tests and examples.
//!
//! [`MemoryExecutor`] understands exactly the SELECT shape produced by
//! [`SelectQuery`](crate::query::SelectQuery): a column list, one table,
//! AND-joined equality predicates and ascending sort keys. Every statement it
//! receives is recorded so tests can assert on the SQL text and parameters.

use crate::executor::{ExecError, SqlExecutor};
use crate::query::PlaceholderStyle;
use crate::row::ValueRow;
use sea_query::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// One statement seen by a [`MemoryExecutor`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Vec<ValueRow>>,
    statements: Vec<RecordedStatement>,
    fail_next: Option<String>,
}

/// Table-of-rows executor
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    state: Mutex<State>,
    style: PlaceholderStyle,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect `$n` placeholders instead of `?`
    pub fn with_placeholder_style(mut self, style: PlaceholderStyle) -> Self {
        self.style = style;
        self
    }

    /// Declare a table with no rows
    pub fn create_table(&self, table: &str) {
        self.state().tables.entry(table.to_string()).or_default();
    }

    /// Append a row, creating the table if needed
    pub fn insert(&self, table: &str, row: ValueRow) {
        self.state().tables.entry(table.to_string()).or_default().push(row);
    }

    /// Append several rows, builder style
    pub fn with_rows<I>(self, table: &str, rows: I) -> Self
    where
        I: IntoIterator<Item = ValueRow>,
    {
        self.state()
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows);
        self
    }

    /// Make the next `query_all` fail with `ExecError::QueryError(message)`
    pub fn fail_next(&self, message: impl Into<String>) {
        self.state().fail_next = Some(message.into());
    }

    /// Every statement received so far, oldest first
    pub fn statements(&self) -> Vec<RecordedStatement> {
        self.state().statements.clone()
    }

    pub fn last_statement(&self) -> Option<RecordedStatement> {
        self.state().statements.last().cloned()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not poison the fixture for the rest
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SqlExecutor for MemoryExecutor {
    fn query_all(&self, query: &str, params: &[Value]) -> Result<Vec<ValueRow>, ExecError> {
        let mut state = self.state();
        state.statements.push(RecordedStatement {
            sql: query.to_string(),
            params: params.to_vec(),
        });
        if let Some(message) = state.fail_next.take() {
            return Err(ExecError::QueryError(message));
        }

        let parsed = ParsedSelect::parse(query)?;
        let rows = state.tables.get(parsed.table).ok_or_else(|| {
            ExecError::QueryError(format!("relation \"{}\" does not exist", parsed.table))
        })?;

        let mut predicates = Vec::with_capacity(parsed.predicates.len());
        for (column, index) in &parsed.predicates {
            let value = params.get(*index).ok_or_else(|| {
                ExecError::QueryError(format!("no parameter bound for placeholder {}", index + 1))
            })?;
            predicates.push((*column, value));
        }

        let mut matched: Vec<&ValueRow> = rows
            .iter()
            .filter(|row| {
                predicates
                    .iter()
                    .all(|(column, value)| row.get(column) == Some(*value))
            })
            .collect();

        matched.sort_by(|a, b| {
            parsed
                .order_by
                .iter()
                .map(|column| compare_optional(a.get(column), b.get(column)))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        Ok(matched
            .into_iter()
            .map(|row| {
                parsed
                    .columns
                    .iter()
                    .filter_map(|column| row.get(column).map(|value| (*column, value.clone())))
                    .collect()
            })
            .collect())
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        self.style
    }
}

#[derive(Debug)]
struct ParsedSelect<'q> {
    columns: Vec<&'q str>,
    table: &'q str,
    /// Column and zero-based parameter index
    predicates: Vec<(&'q str, usize)>,
    order_by: Vec<&'q str>,
}

impl<'q> ParsedSelect<'q> {
    fn parse(sql: &'q str) -> Result<Self, ExecError> {
        let body = sql
            .strip_suffix(';')
            .ok_or_else(|| parse_error(sql, "missing terminating ';'"))?;
        let mut lines = body.lines();
        if lines.next() != Some("SELECT") {
            return Err(parse_error(sql, "expected SELECT"));
        }

        let mut parsed = ParsedSelect {
            columns: Vec::new(),
            table: "",
            predicates: Vec::new(),
            order_by: Vec::new(),
        };
        for line in lines {
            if let Some(table) = line.strip_prefix("FROM ") {
                parsed.table = table;
            } else if let Some(predicate) = line
                .strip_prefix("WHERE ")
                .or_else(|| line.strip_prefix("  AND "))
            {
                let (column, placeholder) = predicate
                    .split_once('=')
                    .ok_or_else(|| parse_error(sql, "predicate without '='"))?;
                let index = match placeholder.strip_prefix('$') {
                    Some(n) => n
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .ok_or_else(|| parse_error(sql, "bad numbered placeholder"))?,
                    None if placeholder == "?" => parsed.predicates.len(),
                    None => return Err(parse_error(sql, "unknown placeholder")),
                };
                parsed.predicates.push((column, index));
            } else if let Some(keys) = line.strip_prefix("ORDER BY ") {
                parsed.order_by = keys.split(", ").collect();
            } else if let Some(column) = line.strip_prefix("  ") {
                parsed.columns.push(column.trim_end_matches(','));
            } else {
                return Err(parse_error(sql, "unexpected line"));
            }
        }

        if parsed.table.is_empty() {
            return Err(parse_error(sql, "missing FROM"));
        }
        Ok(parsed)
    }
}

fn parse_error(sql: &str, reason: &str) -> ExecError {
    ExecError::ParseError(format!("{reason}: {sql:?}"))
}

fn compare_optional(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => compare_values(a, b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
    }
}

/// Ascending order with NULLs first
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::TinyInt(x), Value::TinyInt(y)) => x.cmp(y),
        (Value::SmallInt(x), Value::SmallInt(y)) => x.cmp(y),
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::BigInt(x), Value::BigInt(y)) => x.cmp(y),
        (Value::BigUnsigned(x), Value::BigUnsigned(y)) => x.cmp(y),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::Double(x), Value::Double(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bytes(x), Value::Bytes(y)) => x.cmp(y),
        _ => format!("{a:?}").cmp(&format!("{b:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> MemoryExecutor {
        MemoryExecutor::new().with_rows(
            "Person",
            vec![
                ValueRow::new().with("name", "Cid").with("age", 25i32),
                ValueRow::new().with("name", "Ann").with("age", 30i32),
                ValueRow::new().with("name", "Ben").with("age", 30i32),
            ],
        )
    }

    #[test]
    fn test_filters_sorts_and_projects() {
        let executor = people();
        let rows = executor
            .query_all(
                "SELECT\n  name\nFROM Person\nWHERE age=?\nORDER BY name;",
                &[Value::Int(Some(30))],
            )
            .unwrap();

        let names: Vec<_> = rows.iter().filter_map(|r| r.get("name")).cloned().collect();
        assert_eq!(names, vec![Value::from("Ann"), Value::from("Ben")]);
        assert!(rows.iter().all(|r| r.get("age").is_none()));
    }

    #[test]
    fn test_numbered_placeholders() {
        let executor = people().with_placeholder_style(PlaceholderStyle::Numbered);
        let rows = executor
            .query_all(
                "SELECT\n  name\nFROM Person\nWHERE name=$1\n  AND age=$2;",
                &[Value::from("Cid"), Value::Int(Some(25))],
            )
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(executor.placeholder_style(), PlaceholderStyle::Numbered);
    }

    #[test]
    fn test_records_statements_and_injects_failure() {
        let executor = people();
        executor.fail_next("boom");

        let err = executor
            .query_all("SELECT\n  name\nFROM Person;", &[])
            .unwrap_err();
        assert!(matches!(err, ExecError::QueryError(ref m) if m == "boom"));
        assert!(executor.query_all("SELECT\n  name\nFROM Person;", &[]).is_ok());
        assert_eq!(executor.statements().len(), 2);
    }

    #[test]
    fn test_unknown_table() {
        let err = MemoryExecutor::new()
            .query_all("SELECT\n  name\nFROM Ghost;", &[])
            .unwrap_err();
        assert!(err.to_string().contains("Ghost"));
    }

    #[test]
    fn test_nulls_sort_first() {
        assert_eq!(
            compare_values(&Value::Int(None), &Value::Int(Some(-5))),
            Ordering::Less
        );
    }
}
