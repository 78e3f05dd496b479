//! Value conversion between SeaQuery values and may_postgres.
//!
//! Two directions:
//! - parameters: `sea_query::Value` → `ToSql` trait objects for binding
//! - rows: `may_postgres::Row` → [`ValueRow`], driven by each column's
//!   PostgreSQL type

use crate::executor::ExecError;
use crate::row::ValueRow;
use crate::value::ValueType;
use may_postgres::types::{ToSql, Type};
use may_postgres::Row;
use sea_query::Value;

/// Convert SeaQuery values to may_postgres ToSql parameters.
///
/// Every value is boxed into an owned, typed parameter first; the closure
/// then receives references into that storage, valid for the closure scope.
/// Nulls keep their column type (`Value::Int(None)` binds as a null `int4`).
///
/// # Errors
///
/// Returns `ExecError::Other` if an unsupported value type is encountered or
/// an unsigned value does not fit the signed column type.
pub fn with_converted_params<F, R>(values: &[Value], f: F) -> Result<R, ExecError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, ExecError>,
{
    let owned = values
        .iter()
        .map(to_sql_param)
        .collect::<Result<Vec<_>, _>>()?;
    let params: Vec<&dyn ToSql> = owned.iter().map(|p| p.as_ref()).collect();
    f(&params)
}

fn to_sql_param(value: &Value) -> Result<Box<dyn ToSql>, ExecError> {
    let param: Box<dyn ToSql> = match value {
        Value::Bool(v) => Box::new(*v),
        // PostgreSQL has no one-byte integer; widen to int2
        Value::TinyInt(v) => Box::new(v.map(i16::from)),
        Value::SmallInt(v) => Box::new(*v),
        Value::Int(v) => Box::new(*v),
        Value::BigInt(v) => Box::new(*v),
        Value::TinyUnsigned(v) => Box::new(v.map(i16::from)),
        Value::SmallUnsigned(v) => Box::new(v.map(i32::from)),
        Value::Unsigned(v) => Box::new(v.map(i64::from)),
        Value::BigUnsigned(v) => {
            let signed = v
                .map(|u| {
                    i64::try_from(u).map_err(|_| {
                        ExecError::Other(format!(
                            "BigUnsigned value {} exceeds i64::MAX ({}), cannot be safely cast to i64",
                            u,
                            i64::MAX
                        ))
                    })
                })
                .transpose()?;
            Box::new(signed)
        }
        Value::Float(v) => Box::new(*v),
        Value::Double(v) => Box::new(*v),
        Value::String(v) => Box::new(v.clone()),
        Value::Bytes(v) => Box::new(v.clone()),
        Value::Json(v) => Box::new(v.as_deref().cloned()),
        other => return typed_param(other),
    };
    Ok(param)
}

// Variants whose payload shape is owned by sea-query's feature-gated types.
fn typed_param(value: &Value) -> Result<Box<dyn ToSql>, ExecError> {
    fn try_as<T>(value: &Value) -> Option<Option<T>>
    where
        T: sea_query::ValueType + sea_query::Nullable,
    {
        <Option<T> as sea_query::ValueType>::try_from(value.clone()).ok()
    }

    if let Some(v) = try_as::<uuid::Uuid>(value) {
        return Ok(Box::new(v));
    }
    if let Some(v) = try_as::<chrono::NaiveDateTime>(value) {
        return Ok(Box::new(v));
    }
    if let Some(v) = try_as::<chrono::DateTime<chrono::Utc>>(value) {
        return Ok(Box::new(v));
    }
    if let Some(v) = try_as::<chrono::NaiveDate>(value) {
        return Ok(Box::new(v));
    }
    if let Some(v) = try_as::<rust_decimal::Decimal>(value) {
        return Ok(Box::new(v));
    }
    Err(ExecError::Other(format!(
        "Unsupported value type in query: {:?}",
        value
    )))
}

/// Convert a `may_postgres::Row` into a [`ValueRow`] keyed by column name.
///
/// # Errors
///
/// Returns `ExecError::ParseError` for column types with no `Value` mapping
/// and `ExecError::PostgresError` when a column cannot be decoded.
pub fn row_to_value_row(row: &Row) -> Result<ValueRow, ExecError> {
    let mut values = ValueRow::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = column_value(row, idx, column.type_()).map_err(|e| match e {
            ExecError::ParseError(msg) => {
                ExecError::ParseError(format!("column {}: {}", column.name(), msg))
            }
            other => other,
        })?;
        values.push(column.name(), value);
    }
    Ok(values)
}

fn column_value(row: &Row, idx: usize, ty: &Type) -> Result<Value, ExecError> {
    let value = if *ty == Type::BOOL {
        Value::Bool(row.try_get(idx)?)
    } else if *ty == Type::INT2 {
        Value::SmallInt(row.try_get(idx)?)
    } else if *ty == Type::INT4 {
        Value::Int(row.try_get(idx)?)
    } else if *ty == Type::INT8 {
        Value::BigInt(row.try_get(idx)?)
    } else if *ty == Type::FLOAT4 {
        Value::Float(row.try_get(idx)?)
    } else if *ty == Type::FLOAT8 {
        Value::Double(row.try_get(idx)?)
    } else if *ty == Type::TEXT
        || *ty == Type::VARCHAR
        || *ty == Type::BPCHAR
        || *ty == Type::NAME
    {
        Value::String(row.try_get(idx)?)
    } else if *ty == Type::BYTEA {
        Value::Bytes(row.try_get(idx)?)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        row.try_get::<_, Option<serde_json::Value>>(idx)?.into_value()
    } else if *ty == Type::UUID {
        Value::from(row.try_get::<_, Option<uuid::Uuid>>(idx)?)
    } else if *ty == Type::TIMESTAMP {
        Value::from(row.try_get::<_, Option<chrono::NaiveDateTime>>(idx)?)
    } else if *ty == Type::TIMESTAMPTZ {
        Value::from(row.try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)?)
    } else if *ty == Type::DATE {
        Value::from(row.try_get::<_, Option<chrono::NaiveDate>>(idx)?)
    } else if *ty == Type::NUMERIC {
        Value::from(row.try_get::<_, Option<rust_decimal::Decimal>>(idx)?)
    } else {
        return Err(ExecError::ParseError(format!(
            "unsupported column type {}",
            ty
        )));
    };
    Ok(value)
}
