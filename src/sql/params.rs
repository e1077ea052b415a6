//! Bind serde_json::Value params to sqlx SQLite queries and decode rows back to JSON.

use crate::session::Row;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};

/// A value SQLite can bind. Converts from serde_json::Value.
#[derive(Clone, Debug, PartialEq)]
pub enum SqliteBindValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Text(String),
}

impl SqliteBindValue {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => SqliteBindValue::Null,
            Value::Bool(b) => SqliteBindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    SqliteBindValue::I64(i)
                } else if let Some(f) = n.as_f64() {
                    SqliteBindValue::F64(f)
                } else {
                    SqliteBindValue::Text(n.to_string())
                }
            }
            Value::String(s) => SqliteBindValue::Text(s.clone()),
            // Nested values are stored as JSON text.
            Value::Array(_) | Value::Object(_) => SqliteBindValue::Text(v.to_string()),
        }
    }

    pub fn bind<'q>(
        self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match self {
            SqliteBindValue::Null => query.bind(Option::<String>::None),
            SqliteBindValue::Bool(b) => query.bind(b),
            SqliteBindValue::I64(n) => query.bind(n),
            SqliteBindValue::F64(n) => query.bind(n),
            SqliteBindValue::Text(s) => query.bind(s),
        }
    }
}

/// Bind every param in order.
pub fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[Value],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for p in params {
        query = SqliteBindValue::from_json(p).bind(query);
    }
    query
}

pub fn row_to_json(row: &SqliteRow) -> Result<Row, sqlx::Error> {
    use sqlx::{Column, Row as _};
    let mut map = Row::new();
    for (i, col) in row.columns().iter().enumerate() {
        map.insert(col.name().to_string(), cell_to_value(row, i)?);
    }
    Ok(map)
}

/// SQLite values carry their own storage class, so decode by that rather than the declared type.
fn cell_to_value(row: &SqliteRow, index: usize) -> Result<Value, sqlx::Error> {
    use sqlx::{Row as _, TypeInfo, ValueRef};
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage = raw.type_info().name().to_ascii_uppercase();
    Ok(match storage.as_str() {
        "INTEGER" | "BOOLEAN" | "INT8" => Value::Number(row.try_get::<i64, _>(index)?.into()),
        "REAL" => serde_json::Number::from_f64(row.try_get::<f64, _>(index)?)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "BLOB" => Value::Array(
            row.try_get::<Vec<u8>, _>(index)?
                .into_iter()
                .map(|b| Value::Number(b.into()))
                .collect(),
        ),
        _ => Value::String(row.try_get::<String, _>(index)?),
    })
}
