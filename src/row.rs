//! Result rows addressed by column name.
//!
//! `ValueRow` is the row shape every [`SqlExecutor`](crate::executor::SqlExecutor)
//! returns. The query engine reads it by column name only, never by position.

use sea_query::Value;

/// One result row: ordered `(column, value)` pairs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueRow {
    columns: Vec<(String, Value)>,
}

impl ValueRow {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, builder style
    ///
    /// # Example
    ///
    /// ```rust
    /// use tidemark::ValueRow;
    /// use sea_query::Value;
    ///
    /// let row = ValueRow::new()
    ///     .with("name", "Alice")
    ///     .with("age", 30i32);
    /// assert_eq!(row.get("age"), Some(&Value::Int(Some(30))));
    /// ```
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    /// Append a column. A repeated column name shadows nothing: lookups
    /// return the first occurrence.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((column.into(), value.into()));
    }

    /// Look up a value by exact column name
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column names in row order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<C: Into<String>> FromIterator<(C, Value)> for ValueRow {
    fn from_iter<I: IntoIterator<Item = (C, Value)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().map(|(c, v)| (c.into(), v)).collect(),
        }
    }
}
