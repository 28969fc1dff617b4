//! Data storage layer
//!
//! Provides database services and the query engine built on them:
//! - `query` - Backend-neutral SELECT builder and static table models
//! - `sql` - SQL dialects for the supported backends
//! - `source` - `DataSource` trait that executes rendered statements
//! - `filters` - Declarative filter sets with specs/facets aggregation
//! - `sqlite` / `postgres` - Backend services, schemas and migrations
//! - `error` - Unified error type for all backends

pub mod error;
pub mod filters;
pub mod postgres;
pub mod query;
pub mod source;
pub mod sql;
pub mod sqlite;

pub use error::DataError;
pub use postgres::PostgresService;
pub use source::{DataSource, Row};
pub use sql::Backend;
pub use sqlite::SqliteService;

use std::path::Path;
use std::sync::Arc;

use crate::core::config::PostgresConfig;

/// Transactional database service enum
///
/// Wraps the underlying backend-specific service (SQLite or PostgreSQL).
/// Services are stored as Arc so a repository can hold a source while the
/// service itself is closed at shutdown.
pub enum TransactionalService {
    /// SQLite backend (default, embedded)
    Sqlite(Arc<SqliteService>),
    /// PostgreSQL backend (for shared deployments)
    Postgres(Arc<PostgresService>),
}

impl TransactionalService {
    /// Initialize the service for the configured backend
    ///
    /// For SQLite backend, uses the database path.
    /// For PostgreSQL backend, requires a PostgresConfig.
    pub async fn init(
        backend: Backend,
        sqlite_path: &Path,
        postgres_config: Option<&PostgresConfig>,
    ) -> Result<Self, DataError> {
        match backend {
            Backend::Sqlite => {
                let service = SqliteService::init(sqlite_path).await?;
                Ok(Self::Sqlite(Arc::new(service)))
            }
            Backend::Postgres => {
                let config = postgres_config.ok_or_else(|| {
                    DataError::Config("PostgreSQL configuration required".to_string())
                })?;
                let service = PostgresService::init(config).await?;
                Ok(Self::Postgres(Arc::new(service)))
            }
        }
    }

    /// Query executor for the active backend
    pub fn source(&self) -> Arc<dyn DataSource> {
        match self {
            Self::Sqlite(s) => Arc::new(s.source()),
            Self::Postgres(p) => Arc::new(p.source()),
        }
    }

    /// Close the database connection gracefully
    pub async fn close(&self) {
        match self {
            Self::Sqlite(s) => s.close().await,
            Self::Postgres(p) => p.close().await,
        }
    }

    /// Get the backend type
    pub fn backend(&self) -> Backend {
        match self {
            Self::Sqlite(_) => Backend::Sqlite,
            Self::Postgres(_) => Backend::Postgres,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_service_exposes_source() {
        let dir = tempfile::tempdir().unwrap();
        let service = TransactionalService::init(Backend::Sqlite, &dir.path().join("t.db"), None)
            .await
            .unwrap();
        assert_eq!(service.backend(), Backend::Sqlite);
        assert_eq!(service.source().dialect().name(), "sqlite");
        service.close().await;
    }

    #[tokio::test]
    async fn test_postgres_requires_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = TransactionalService::init(Backend::Postgres, &dir.path().join("t.db"), None)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DataError::Config(_)));
    }
}
