//! Fixtures shared by the filter tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;

use super::base::ColumnBundle;
use crate::data::error::DataError;
use crate::data::query::{Model, Relation, Select, Statement};
use crate::data::source::{DataSource, Row};
use crate::data::sql::SqlDialect;
use crate::data::sqlite::SqliteSource;

pub static GROUPS: Model = Model {
    table: "item_groups",
    fields: &["id", "name", "updated_at"],
    relations: &[],
};

pub static ITEMS: Model = Model {
    table: "items",
    fields: &[
        "id",
        "name",
        "category",
        "price",
        "rating",
        "is_new",
        "created_at",
        "updated_at",
        "group_id",
    ],
    relations: &[Relation {
        name: "group",
        target: &GROUPS,
        local_key: "group_id",
        remote_key: "id",
    }],
};

const FIXTURE: &str = r#"
CREATE TABLE item_groups (id INTEGER PRIMARY KEY, name TEXT NOT NULL, updated_at TEXT NOT NULL);
CREATE TABLE items (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    category TEXT,
    price REAL,
    rating REAL,
    is_new BOOLEAN,
    created_at TEXT,
    updated_at TEXT,
    group_id INTEGER REFERENCES item_groups(id)
);
INSERT INTO item_groups VALUES
    (1, 'Tools', '2023-01-01T00:00:00Z'),
    (2, 'Toys', '2024-05-01T00:00:00Z');
INSERT INTO items VALUES
    (1, 'Alpha', 'A', 10, 4.5, 1, '2023-01-15T10:00:00Z', '2024-01-10T00:00:00Z', 1),
    (2, 'beta', 'A', 20, NULL, 0, '2023-03-20T10:00:00Z', '2024-02-10T00:00:00Z', 1),
    (3, 'Gamma', 'B', 30, 3.0, 1, '2024-01-05T10:00:00Z', '2024-03-01T00:00:00Z', 2),
    (4, 'delta', 'B', 40, NULL, 0, '2024-02-11T10:00:00Z', '2023-06-01T00:00:00Z', 2),
    (5, 'Epsilon', 'C', 50, 5.0, NULL, '2024-02-29T10:00:00Z', '2023-07-01T00:00:00Z', NULL);
"#;

/// In-memory SQLite with five `items` rows across categories A, A, B, B, C
/// priced 10 through 50
pub async fn items_source() -> RecordingSource {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect(":memory:")
        .await
        .unwrap();
    sqlx::raw_sql(FIXTURE).execute(&pool).await.unwrap();
    RecordingSource::new(SqliteSource::new(pool))
}

/// Records every statement and tracks how many run at once
pub struct RecordingSource {
    inner: SqliteSource,
    statements: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Option<Duration>,
}

impl RecordingSource {
    pub fn new(inner: SqliteSource) -> Self {
        Self {
            inner,
            statements: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().clone()
    }

    pub fn clear(&self) {
        self.statements.lock().clear();
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for RecordingSource {
    fn dialect(&self) -> &'static dyn SqlDialect {
        self.inner.dialect()
    }

    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Row>, DataError> {
        self.statements.lock().push(statement.sql.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.inner.fetch_all(statement).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Ids of the returned rows in order
pub fn ids(rows: &[Row]) -> Vec<i64> {
    rows.iter()
        .map(|row| row.value("id").as_i64().unwrap())
        .collect()
}

/// Run a column bundle on its own over `query` and parse the result
pub async fn bundled(source: &dyn DataSource, query: Select, bundle: ColumnBundle) -> Value {
    let row = source
        .execute_one(&query.columns(bundle.columns.clone()))
        .await
        .unwrap();
    bundle.parse(&row).unwrap()
}
