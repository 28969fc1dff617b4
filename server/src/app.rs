//! Core application

use anyhow::{Context, Result};
use serde_json::Value;

use crate::core::cli::{self, Action, CliConfig, Commands, QueryArgs};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME, ENV_LOG};
use crate::data::TransactionalService;
use crate::domain::Catalog;

pub struct CoreApp {
    pub config: AppConfig,
    pub database: TransactionalService,
    pub catalog: Catalog,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("{} starting", APP_NAME);

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::init(&cli_config).await?;
        let result = match command {
            Commands::Migrate => {
                println!(
                    "Database schema is up to date ({})",
                    app.database.backend().name()
                );
                Ok(())
            }
            Commands::Query(args) => app.query(&args).await,
        };

        app.database.close().await;
        result
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        // Definitions are validated before any connection is opened
        let catalog = Catalog::new(config.filters).context("Invalid filter set definition")?;

        let database = TransactionalService::init(
            config.database.backend,
            &config.database.path,
            config.database.postgres.as_ref(),
        )
        .await
        .with_context(|| {
            format!(
                "Failed to initialize {} database",
                config.database.backend.name()
            )
        })?;

        Ok(Self {
            config,
            database,
            catalog,
        })
    }

    /// Run one admin query and print the result as pretty JSON
    pub async fn query(&self, args: &QueryArgs) -> Result<()> {
        let output = self.execute(args).await?;
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    async fn execute(&self, args: &QueryArgs) -> Result<Value> {
        let repository = self
            .catalog
            .repository(args.entity, self.database.source())
            .with_context(|| format!("No filter set registered for {}", args.entity))?;

        let params = args.filter_params();
        let excluded: Vec<&str> = args.exclude.iter().map(String::as_str).collect();
        let shown = serde_json::Value::Object(params.clone());
        tracing::debug!(
            entity = %args.entity,
            action = ?args.action,
            params = %shown,
            "Running query"
        );

        let output = match args.action {
            Action::List => serde_json::to_value(repository.list(params).await?)?,
            Action::Retrieve => serde_json::to_value(repository.retrieve(params).await?)?,
            Action::Count => Value::from(repository.count(params).await?),
            Action::Specs => Value::Object(repository.specs(params, &excluded).await?),
            Action::Facets => Value::Object(repository.facets(params, &excluded).await?),
        };
        Ok(output)
    }

    fn init_logging() {
        let default_filter = "warn,storefront_server=info".to_string();

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        // Results go to stdout, so logs are kept on stderr
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use serde_json::json;

    use super::*;
    use crate::core::cli::Cli;

    async fn app(dir: &tempfile::TempDir) -> CoreApp {
        let cli = CliConfig {
            config: None,
            database: Some(dir.path().join("catalog.db")),
            ..Default::default()
        };
        CoreApp::init(&cli).await.unwrap()
    }

    fn args(argv: &[&str]) -> QueryArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Query(args) => args,
            Commands::Migrate => panic!("expected a query command"),
        }
    }

    #[tokio::test]
    async fn test_query_against_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;

        let sqlx_pool = match &app.database {
            TransactionalService::Sqlite(service) => service.pool().clone(),
            TransactionalService::Postgres(_) => unreachable!(),
        };
        sqlx::raw_sql(
            "INSERT INTO product_categories (id, name) VALUES (1, 'Phones'), (2, 'Laptops');",
        )
        .execute(&sqlx_pool)
        .await
        .unwrap();

        let count = app
            .execute(&args(&["storefront", "query", "product-categories", "count"]))
            .await
            .unwrap();
        assert_eq!(count, json!(2));

        let rows = app
            .execute(&args(&[
                "storefront",
                "query",
                "product-categories",
                "list",
                "--sort",
                "name",
            ]))
            .await
            .unwrap();
        assert_eq!(rows[0]["name"], json!("Laptops"));
        assert_eq!(rows[1]["name"], json!("Phones"));

        let facets = app
            .execute(&args(&[
                "storefront",
                "query",
                "product-categories",
                "facets",
                "-p",
                r#"{"name": "top"}"#,
            ]))
            .await
            .unwrap();
        assert_eq!(facets["count"], json!(1));

        let err = app
            .execute(&args(&[
                "storefront",
                "query",
                "products",
                "retrieve",
                "-p",
                r#"{"id": 7}"#,
            ]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("products 7 not found"));

        app.database.close().await;
    }
}
