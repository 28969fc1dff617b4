use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use super::cli::CliConfig;
use super::constants::{CONFIG_FILE_NAME, DEFAULT_MAX_CONCURRENCY, SQLITE_DB_FILENAME};
use crate::data::filters::FilterSettings;
use crate::data::sql::Backend;

// =============================================================================
// File Configuration (JSON)
// =============================================================================

/// PostgreSQL section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PostgresFileConfig {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub statement_timeout_secs: Option<u64>,
}

/// Database section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseFileConfig {
    /// Backend: sqlite (default) or postgres
    pub backend: Option<Backend>,
    /// SQLite database file
    pub path: Option<PathBuf>,
    pub postgres: Option<PostgresFileConfig>,
}

/// Filter engine section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FiltersFileConfig {
    pub optimization: Option<bool>,
    pub max_concurrency: Option<usize>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub database: Option<DatabaseFileConfig>,
    pub filters: Option<FiltersFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// PostgreSQL connection settings
///
/// Zero values fall back to the defaults in `core::constants`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub statement_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub backend: Backend,
    pub path: PathBuf,
    /// Present whenever a PostgreSQL URL was configured
    pub postgres: Option<PostgresConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub filters: FilterSettings,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Local directory config OR CLI-specified config path
    /// 3. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let path = if let Some(ref path) = cli.config {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Some(path.clone())
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        let file_config = match path {
            Some(path) => {
                let config = FileConfig::load_from_file(&path)?;
                config.warn_unknown_fields();
                config
            }
            None => FileConfig::default(),
        };

        Self::resolve(cli, file_config)
    }

    /// Layer CLI/env values over the file config and defaults
    fn resolve(cli: &CliConfig, file_config: FileConfig) -> Result<Self> {
        let file_database = file_config.database.unwrap_or_default();
        let file_postgres = file_database.postgres.unwrap_or_default();
        let file_filters = file_config.filters.unwrap_or_default();

        let backend = cli.backend.or(file_database.backend).unwrap_or_default();
        let path = cli
            .database
            .clone()
            .or(file_database.path)
            .unwrap_or_else(|| PathBuf::from(SQLITE_DB_FILENAME));

        let postgres = cli
            .postgres_url
            .clone()
            .or(file_postgres.url)
            .map(|url| PostgresConfig {
                url,
                max_connections: file_postgres.max_connections.unwrap_or_default(),
                statement_timeout_secs: file_postgres.statement_timeout_secs.unwrap_or_default(),
            });

        if backend == Backend::Postgres && postgres.is_none() {
            anyhow::bail!(
                "PostgreSQL backend selected but no URL configured (database.postgres.url or --postgres-url)"
            );
        }

        // --no-optimization can only turn bundling off
        let optimization = !cli.no_optimization && file_filters.optimization.unwrap_or(true);
        let max_concurrency = cli
            .max_concurrency
            .or(file_filters.max_concurrency)
            .unwrap_or(DEFAULT_MAX_CONCURRENCY);
        if max_concurrency == 0 {
            anyhow::bail!("filters.max_concurrency must be at least 1");
        }

        let config = Self {
            database: DatabaseConfig {
                backend,
                path,
                postgres,
            },
            filters: FilterSettings {
                optimization,
                max_concurrency,
            },
        };
        tracing::debug!(
            backend = config.database.backend.name(),
            optimization,
            max_concurrency,
            "Configuration resolved"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_file_config_parse_partial() {
        let json = r#"{ "filters": { "max_concurrency": 8 } }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        let filters = config.filters.as_ref().unwrap();
        assert_eq!(filters.max_concurrency, Some(8));
        assert!(filters.optimization.is_none());
        assert!(config.database.is_none());
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let json = r#"{ "database": { "backend": "postgres" }, "filterz": {} }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        assert_eq!(
            config.database.as_ref().unwrap().backend,
            Some(Backend::Postgres)
        );
        assert!(config.extra.get("filterz").is_some());
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::resolve(&CliConfig::default(), FileConfig::default()).unwrap();

        assert_eq!(config.database.backend, Backend::Sqlite);
        assert_eq!(config.database.path, PathBuf::from(SQLITE_DB_FILENAME));
        assert!(config.database.postgres.is_none());
        assert_eq!(config.filters, FilterSettings::default());
        assert_eq!(config.filters.max_concurrency, 100);
    }

    #[test]
    fn test_load_layers_cli_over_file() {
        let file = write_config(
            r#"{
                "database": {
                    "path": "/tmp/from-file.db",
                    "postgres": { "url": "postgres://file", "max_connections": 4 }
                },
                "filters": { "optimization": false, "max_concurrency": 16 }
            }"#,
        );

        let cli = CliConfig {
            config: Some(file.path().to_path_buf()),
            postgres_url: Some("postgres://cli".to_string()),
            max_concurrency: Some(2),
            ..Default::default()
        };
        let config = AppConfig::load(&cli).unwrap();

        assert_eq!(config.database.path, PathBuf::from("/tmp/from-file.db"));
        let postgres = config.database.postgres.unwrap();
        assert_eq!(postgres.url, "postgres://cli");
        assert_eq!(postgres.max_connections, 4);
        assert!(!config.filters.optimization);
        assert_eq!(config.filters.max_concurrency, 2);
    }

    #[test]
    fn test_no_optimization_flag_wins() {
        let file_config: FileConfig =
            serde_json::from_str(r#"{ "filters": { "optimization": true } }"#).unwrap();
        let cli = CliConfig {
            no_optimization: true,
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli, file_config).unwrap();
        assert!(!config.filters.optimization);
    }

    #[test]
    fn test_postgres_requires_url() {
        let cli = CliConfig {
            backend: Some(Backend::Postgres),
            ..Default::default()
        };
        let err = AppConfig::resolve(&cli, FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("no URL configured"));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let cli = CliConfig {
            max_concurrency: Some(0),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli, FileConfig::default()).is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let cli = CliConfig {
            config: Some(PathBuf::from("/nonexistent/storefront.json")),
            ..Default::default()
        };
        let err = AppConfig::load(&cli).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_invalid_config_file() {
        let file = write_config("{ not json");
        let cli = CliConfig {
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let err = AppConfig::load(&cli).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
