//! Unified error type for data layer
//!
//! This module provides a unified error type that can represent errors from
//! both database backends (SQLite, PostgreSQL) as well as row decoding and
//! query rendering failures.

use thiserror::Error;

/// Unified error type for data layer operations
///
/// This error type wraps backend-specific errors while preserving context
/// about which backend generated the error.
#[derive(Error, Debug)]
pub enum DataError {
    /// SQLite database error
    #[error("SQLite error: {0}")]
    Sqlite(sqlx::Error),

    /// PostgreSQL database error
    #[error("PostgreSQL error: {0}")]
    Postgres(sqlx::Error),

    /// Result column whose database type has no JSON mapping
    #[error("Unsupported type {type_name} for column {column}; CAST it in the query")]
    UnsupportedType { column: String, type_name: String },

    /// Aggregate value that could not be parsed into its expected shape
    #[error("Failed to decode column {column}: {message}")]
    Decode { column: String, message: String },

    /// SQL feature the dialect cannot render
    #[error("{feature} is not supported on {backend}")]
    Unsupported {
        backend: &'static str,
        feature: &'static str,
    },

    /// Query expected a row but returned none
    #[error("Query returned no rows")]
    NoRows,

    /// Entity lookup by key found nothing
    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: String },

    /// Stored schema version has no migration step to reach it
    #[error("No {backend} migration registered for schema version {version}")]
    MissingMigration { backend: &'static str, version: i32 },

    /// Database schema is ahead of this build
    #[error("{backend} schema version {found} is newer than supported version {supported}")]
    SchemaTooNew {
        backend: &'static str,
        found: i32,
        supported: i32,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Create a SQLite error with preserved context
    pub fn from_sqlite(e: sqlx::Error) -> Self {
        Self::Sqlite(e)
    }

    /// Create a PostgreSQL error with preserved context
    pub fn from_postgres(e: sqlx::Error) -> Self {
        Self::Postgres(e)
    }

    pub fn decode(column: &str, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Check if this is a connection-related error that might be transient
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Sqlite(e) | Self::Postgres(e) => {
                matches!(
                    e,
                    sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
                )
            }
            _ => false,
        }
    }

    /// Get the backend name that generated this error
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Postgres(_) => "postgres",
            Self::MissingMigration { backend, .. } | Self::SchemaTooNew { backend, .. } => backend,
            Self::Unsupported { backend, .. } => backend,
            Self::UnsupportedType { .. }
            | Self::Decode { .. }
            | Self::NoRows
            | Self::NotFound { .. }
            | Self::Config(_)
            | Self::Io(_) => "unknown",
        }
    }
}

impl From<crate::data::sqlite::SqliteError> for DataError {
    fn from(e: crate::data::sqlite::SqliteError) -> Self {
        use crate::data::sqlite::SqliteError;
        match e {
            SqliteError::Database(e) => Self::Sqlite(e),
            SqliteError::Io(e) => Self::Io(e),
            SqliteError::MissingMigration(version) => Self::MissingMigration {
                backend: "sqlite",
                version,
            },
            SqliteError::SchemaTooNew { found, supported } => Self::SchemaTooNew {
                backend: "sqlite",
                found,
                supported,
            },
        }
    }
}

impl From<crate::data::postgres::PostgresError> for DataError {
    fn from(e: crate::data::postgres::PostgresError) -> Self {
        use crate::data::postgres::PostgresError;
        match e {
            PostgresError::Database(e) => Self::Postgres(e),
            PostgresError::MissingMigration(version) => Self::MissingMigration {
                backend: "postgres",
                version,
            },
            PostgresError::SchemaTooNew { found, supported } => Self::SchemaTooNew {
                backend: "postgres",
                found,
                supported,
            },
            PostgresError::Config(msg) => Self::Config(msg),
        }
    }
}
