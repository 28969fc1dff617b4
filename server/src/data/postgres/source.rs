//! `DataSource` over a PostgreSQL pool

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Decode, PgPool, Postgres, Row as _, Type, TypeInfo};

use crate::data::error::DataError;
use crate::data::query::Statement;
use crate::data::source::{DataSource, Row, float_value};
use crate::data::sql::{PostgresDialect, SqlDialect};

/// Runs rendered statements against a PostgreSQL pool
#[derive(Clone)]
pub struct PostgresSource {
    pool: PgPool,
}

impl PostgresSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DataSource for PostgresSource {
    fn dialect(&self) -> &'static dyn SqlDialect {
        &PostgresDialect
    }

    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Row>, DataError> {
        let mut query = sqlx::query(&statement.sql);
        for value in &statement.binds {
            query = bind_value(query, value);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(DataError::from_postgres)?;

        rows.iter().map(decode_row).collect()
    }
}

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// Bind a JSON value with a concrete PostgreSQL type
///
/// Parameters are typed on the wire, so timestamp-looking strings are sent as
/// timestamps to keep comparisons against TIMESTAMPTZ columns valid.
fn bind_value<'q>(query: PgQuery<'q>, value: &Value) -> PgQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => {
            if let Ok(ts) = DateTime::<FixedOffset>::parse_from_rfc3339(s) {
                query.bind(ts)
            } else if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                query.bind(date)
            } else {
                query.bind(s.clone())
            }
        }
        other => query.bind(other.to_string()),
    }
}

fn get<'r, T>(row: &'r PgRow, index: usize) -> Result<Option<T>, DataError>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get::<Option<T>, _>(index)
        .map_err(DataError::from_postgres)
}

fn decode_row(row: &PgRow) -> Result<Row, DataError> {
    let mut columns = Map::new();

    for (index, column) in row.columns().iter().enumerate() {
        let type_name = column.type_info().name();
        let value = match type_name {
            "INT2" => get::<i16>(row, index)?.map(Value::from),
            "INT4" => get::<i32>(row, index)?.map(Value::from),
            "INT8" => get::<i64>(row, index)?.map(Value::from),
            "FLOAT4" => get::<f32>(row, index)?.map(|f| float_value(f as f64)),
            "FLOAT8" => get::<f64>(row, index)?.map(float_value),
            "BOOL" => get::<bool>(row, index)?.map(Value::Bool),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "UNKNOWN" => {
                get::<String>(row, index)?.map(Value::String)
            }
            "TIMESTAMPTZ" => get::<DateTime<Utc>>(row, index)?
                .map(|ts| Value::String(ts.to_rfc3339_opts(SecondsFormat::Secs, true))),
            "TIMESTAMP" => get::<NaiveDateTime>(row, index)?
                .map(|ts| Value::String(ts.format("%Y-%m-%dT%H:%M:%S").to_string())),
            "DATE" => get::<NaiveDate>(row, index)?.map(|d| Value::String(d.to_string())),
            other => {
                return Err(DataError::UnsupportedType {
                    column: column.name().to_string(),
                    type_name: other.to_string(),
                });
            }
        };
        columns.insert(column.name().to_string(), value.unwrap_or(Value::Null));
    }

    Ok(Row::new(columns))
}
