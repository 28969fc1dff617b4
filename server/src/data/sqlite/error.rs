//! SQLite service errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqliteError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The database directory could not be created
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No migration registered for schema version {0}")]
    MissingMigration(i32),

    /// The file was written by a newer release of the catalog schema
    #[error("Database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: i32, supported: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_too_new_display() {
        let err = SqliteError::SchemaTooNew {
            found: 3,
            supported: 1,
        };
        assert_eq!(
            err.to_string(),
            "Database schema version 3 is newer than supported version 1"
        );
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: SqliteError = io_err.into();
        assert!(matches!(err, SqliteError::Io(_)));
    }
}
