//! Select query builder.
//!
//! `SelectQuery` holds a table, a column list, equality predicates and sort
//! keys, and renders them as one SELECT statement. Identifiers come from
//! domain metadata (type and field names) and are emitted literally, without
//! quoting. Values never appear in the SQL text: every predicate value becomes
//! a positional parameter.
//!
//! Rendered shape:
//!
//! ```text
//! SELECT
//!   name,
//!   age
//! FROM Person
//! WHERE name=?
//!   AND age=?
//! ORDER BY name, age;
//! ```

use sea_query::Value;
use serde::Deserialize;
use std::fmt;

/// Parameter placeholder syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderStyle {
    /// `?` for every parameter
    #[default]
    Question,
    /// `$1`, `$2`, ... (PostgreSQL)
    Numbered,
}

impl PlaceholderStyle {
    /// Placeholder for the parameter at zero-based `index`
    pub fn placeholder(self, index: usize) -> String {
        match self {
            PlaceholderStyle::Question => "?".to_string(),
            PlaceholderStyle::Numbered => format!("${}", index + 1),
        }
    }
}

/// One WHERE predicate
#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    /// `column = value`
    Equals { column: &'static str, value: Value },
}

impl FilterClause {
    pub fn column(&self) -> &'static str {
        match self {
            FilterClause::Equals { column, .. } => column,
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            FilterClause::Equals { value, .. } => value,
        }
    }

    fn render(&self, placeholder: &str) -> String {
        match self {
            FilterClause::Equals { column, .. } => format!("{column}={placeholder}"),
        }
    }
}

/// Query builder for a single-table SELECT
///
/// # Example
///
/// ```rust
/// use tidemark::query::{FilterClause, PlaceholderStyle, SelectQuery};
/// use sea_query::Value;
///
/// let query = SelectQuery::new("Person")
///     .columns(["name", "age"])
///     .filter(FilterClause::Equals { column: "name", value: Value::from("Alice") })
///     .order_by("age");
///
/// let (sql, params) = query.build(PlaceholderStyle::Numbered);
/// assert_eq!(sql, "SELECT\n  name,\n  age\nFROM Person\nWHERE name=$1\nORDER BY age;");
/// assert_eq!(params, vec![Value::from("Alice")]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    table: &'static str,
    columns: Vec<&'static str>,
    predicates: Vec<FilterClause>,
    order_by: Vec<&'static str>,
}

impl SelectQuery {
    /// Create a new select query for `table`
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            columns: Vec::new(),
            predicates: Vec::new(),
            order_by: Vec::new(),
        }
    }

    /// Add a column to the SELECT list
    pub fn column(mut self, column: &'static str) -> Self {
        self.columns.push(column);
        self
    }

    /// Add several columns to the SELECT list, in order
    pub fn columns<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = &'static str>,
    {
        self.columns.extend(columns);
        self
    }

    /// Add a predicate; predicates are AND-joined
    pub fn filter(mut self, clause: FilterClause) -> Self {
        self.predicates.push(clause);
        self
    }

    /// Add an ascending ORDER BY key
    pub fn order_by(mut self, column: &'static str) -> Self {
        self.order_by.push(column);
        self
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn selected_columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn predicates(&self) -> &[FilterClause] {
        &self.predicates
    }

    pub fn order_columns(&self) -> &[&'static str] {
        &self.order_by
    }

    /// Predicate values in WHERE clause order
    pub fn params(&self) -> Vec<Value> {
        self.predicates.iter().map(|p| p.value().clone()).collect()
    }

    /// Render the SQL text
    pub fn to_sql(&self, style: PlaceholderStyle) -> String {
        let mut sql = String::from("SELECT\n  ");
        sql.push_str(&self.columns.join(",\n  "));
        sql.push_str("\nFROM ");
        sql.push_str(self.table);

        if !self.predicates.is_empty() {
            let predicates: Vec<String> = self
                .predicates
                .iter()
                .enumerate()
                .map(|(index, p)| p.render(&style.placeholder(index)))
                .collect();
            sql.push_str("\nWHERE ");
            sql.push_str(&predicates.join("\n  AND "));
        }

        if !self.order_by.is_empty() {
            sql.push_str("\nORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }

        sql.push(';');
        sql
    }

    /// Render the SQL text and take the parameters
    pub fn build(self, style: PlaceholderStyle) -> (String, Vec<Value>) {
        let sql = self.to_sql(style);
        let params = self
            .predicates
            .into_iter()
            .map(|clause| match clause {
                FilterClause::Equals { value, .. } => value,
            })
            .collect();
        (sql, params)
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql(PlaceholderStyle::Question))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person_query() -> SelectQuery {
        SelectQuery::new("Person").columns(["name", "age"])
    }

    #[test]
    fn test_select_without_predicates_has_no_where() {
        assert_eq!(person_query().to_string(), "SELECT\n  name,\n  age\nFROM Person;");
    }

    #[test]
    fn test_predicates_are_and_joined_in_order() {
        let query = person_query()
            .filter(FilterClause::Equals {
                column: "name",
                value: Value::from("Alice"),
            })
            .filter(FilterClause::Equals {
                column: "age",
                value: Value::Int(Some(30)),
            });

        assert_eq!(
            query.to_sql(PlaceholderStyle::Question),
            "SELECT\n  name,\n  age\nFROM Person\nWHERE name=?\n  AND age=?;"
        );
        assert_eq!(
            query.to_sql(PlaceholderStyle::Numbered),
            "SELECT\n  name,\n  age\nFROM Person\nWHERE name=$1\n  AND age=$2;"
        );
        assert_eq!(query.params(), vec![Value::from("Alice"), Value::Int(Some(30))]);
    }

    #[test]
    fn test_order_by_is_comma_joined() {
        let query = person_query().order_by("name").order_by("age");
        assert!(query.to_string().ends_with("\nFROM Person\nORDER BY name, age;"));
    }

    #[test]
    fn test_values_never_interpolated() {
        let (sql, params) = person_query()
            .filter(FilterClause::Equals {
                column: "name",
                value: Value::from("x'; DROP TABLE Person; --"),
            })
            .build(PlaceholderStyle::Question);

        assert!(!sql.contains("DROP"));
        assert_eq!(params.len(), 1);
    }
}
