//! Error types for registry, diff and query operations.

use crate::executor::ExecError;
use crate::value::ValueExtractionError;
use std::fmt;

/// Error type for ORM operations
///
/// Executor failures are carried unchanged in [`OrmError::Executor`]; every
/// other variant is raised by this crate before or after the executor call.
#[derive(Debug)]
pub enum OrmError {
    /// Input cannot form a valid query
    InvalidArgument(String),
    /// A type-erased instance is not the expected domain type or a descendant of it
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    /// Two persistable fields of one domain type share a name
    DuplicateField {
        domain: &'static str,
        field: &'static str,
    },
    /// A field could not be written from a row value
    FieldAccess {
        domain: &'static str,
        field: &'static str,
        source: ValueExtractionError,
    },
    /// A result row has no value for a registered column
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
    /// `find` matched more than one row
    Ambiguous {
        table: &'static str,
        matched: usize,
    },
    /// `get` matched no row
    NotFound { table: &'static str },
    /// Error raised by the SQL executor
    Executor(ExecError),
}

impl fmt::Display for OrmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrmError::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            OrmError::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {expected} or a descendant, got {actual}")
            }
            OrmError::DuplicateField { domain, field } => {
                write!(f, "Duplicate field {field} in domain {domain}")
            }
            OrmError::FieldAccess {
                domain,
                field,
                source,
            } => write!(f, "Field {domain}.{field} cannot be set: {source}"),
            OrmError::MissingColumn { table, column } => {
                write!(f, "Result row from {table} has no column {column}")
            }
            OrmError::Ambiguous { table, matched } => {
                write!(f, "Ambiguous result: expected at most one row from {table}, got {matched}")
            }
            OrmError::NotFound { table } => write!(f, "No matching row in {table}"),
            // Transparent: executor errors surface as-is
            OrmError::Executor(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for OrmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OrmError::FieldAccess { source, .. } => Some(source),
            OrmError::Executor(e) => e.source(),
            _ => None,
        }
    }
}

impl From<ExecError> for OrmError {
    fn from(err: ExecError) -> Self {
        OrmError::Executor(err)
    }
}
