//! PostgreSQL service errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostgresError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("No migration registered for schema version {0}")]
    MissingMigration(i32),

    /// The database was migrated by a newer release of the catalog schema
    #[error("Database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: i32, supported: i32 },

    /// Missing or unparsable connection settings
    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_migration_display() {
        assert_eq!(
            PostgresError::MissingMigration(2).to_string(),
            "No migration registered for schema version 2"
        );
    }
}
