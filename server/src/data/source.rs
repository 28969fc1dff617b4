//! Backend-neutral query execution
//!
//! `DataSource` is the seam between the filter engine and a database pool.
//! Rows come back as ordered name → JSON value records so aggregate columns of
//! any shape can be decoded without a per-query struct.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use super::error::DataError;
use super::query::{Select, Statement};
use super::sql::SqlDialect;

/// One result row keyed by column label
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn new(columns: Map<String, Value>) -> Self {
        Self(columns)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Column value, `Null` when the column is absent
    pub fn value(&self, column: &str) -> Value {
        self.0.get(column).cloned().unwrap_or(Value::Null)
    }

    /// Value of the first column
    pub fn first(&self) -> Option<&Value> {
        self.0.values().next()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.0.insert(column.into(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Read access to a relational database
///
/// Implementations must allow concurrent `fetch_all` calls from one task;
/// the filter engine fans aggregate queries out over a shared reference.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Dialect used to render statements for this source
    fn dialect(&self) -> &'static dyn SqlDialect;

    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Row>, DataError>;

    async fn fetch_one(&self, statement: &Statement) -> Result<Row, DataError> {
        self.fetch_all(statement)
            .await?
            .into_iter()
            .next()
            .ok_or(DataError::NoRows)
    }

    /// First column of the first row
    async fn fetch_scalar(&self, statement: &Statement) -> Result<Value, DataError> {
        let row = self.fetch_one(statement).await?;
        Ok(row.first().cloned().unwrap_or(Value::Null))
    }

    /// Render and run a query
    async fn execute(&self, query: &Select) -> Result<Vec<Row>, DataError> {
        let statement = query.build(self.dialect())?;
        tracing::trace!(
            sql = %statement.sql,
            binds = statement.binds.len(),
            backend = self.dialect().name(),
            "Executing query"
        );
        self.fetch_all(&statement).await
    }

    async fn execute_one(&self, query: &Select) -> Result<Row, DataError> {
        self.execute(query)
            .await?
            .into_iter()
            .next()
            .ok_or(DataError::NoRows)
    }

    async fn execute_scalar(&self, query: &Select) -> Result<Value, DataError> {
        let row = self.execute_one(query).await?;
        Ok(row.first().cloned().unwrap_or(Value::Null))
    }
}

/// JSON number from a float, `Null` for NaN and infinities
pub(crate) fn float_value(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
