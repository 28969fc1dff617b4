//! `DataSource` over a SQLite pool

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, SqlitePool, TypeInfo, ValueRef};

use crate::data::error::DataError;
use crate::data::query::Statement;
use crate::data::source::{DataSource, Row, float_value};
use crate::data::sql::{SqlDialect, SqliteDialect};

/// Runs rendered statements against a SQLite pool
#[derive(Clone)]
pub struct SqliteSource {
    pool: SqlitePool,
}

impl SqliteSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DataSource for SqliteSource {
    fn dialect(&self) -> &'static dyn SqlDialect {
        &SqliteDialect
    }

    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Row>, DataError> {
        let mut query = sqlx::query(&statement.sql);
        for value in &statement.binds {
            query = bind_value(query, value);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(DataError::from_sqlite)?;

        rows.iter().map(decode_row).collect()
    }
}

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => query.bind(s.clone()),
        // Arrays and objects are compared as JSON text
        other => query.bind(other.to_string()),
    }
}

/// Decode by the runtime storage class, using the declared column type only
/// to recover booleans
fn decode_row(row: &SqliteRow) -> Result<Row, DataError> {
    let mut columns = Map::new();

    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index).map_err(DataError::from_sqlite)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let storage = raw.type_info().name().to_string();
            match (storage.as_str(), column.type_info().name()) {
                ("INTEGER", "BOOLEAN") => Value::Bool(
                    row.try_get_unchecked::<bool, _>(index)
                        .map_err(DataError::from_sqlite)?,
                ),
                ("INTEGER", _) => Value::from(
                    row.try_get_unchecked::<i64, _>(index)
                        .map_err(DataError::from_sqlite)?,
                ),
                ("REAL", _) => float_value(
                    row.try_get_unchecked::<f64, _>(index)
                        .map_err(DataError::from_sqlite)?,
                ),
                ("TEXT", _) => Value::String(
                    row.try_get_unchecked::<String, _>(index)
                        .map_err(DataError::from_sqlite)?,
                ),
                (other, _) => {
                    return Err(DataError::UnsupportedType {
                        column: column.name().to_string(),
                        type_name: other.to_string(),
                    });
                }
            }
        };
        columns.insert(column.name().to_string(), value);
    }

    Ok(Row::new(columns))
}
