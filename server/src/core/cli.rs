use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};

use std::path::PathBuf;

use super::constants::{
    ENV_BACKEND, ENV_CONFIG, ENV_DATABASE, ENV_MAX_CONCURRENCY, ENV_NO_OPTIMIZATION,
    ENV_POSTGRES_URL,
};
use crate::data::sql::Backend;
use crate::domain::{AdminQuery, Entity, SortOrder};

#[derive(Parser)]
#[command(name = "storefront")]
#[command(version, about = "Catalog admin queries with filter specs and facets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, short = 'd', global = true, env = ENV_DATABASE)]
    pub database: Option<PathBuf>,

    /// Database backend (sqlite or postgres)
    #[arg(long, global = true, env = ENV_BACKEND, value_parser = parse_backend)]
    pub backend: Option<Backend>,

    /// PostgreSQL connection URL (when using postgres backend)
    #[arg(long, global = true, env = ENV_POSTGRES_URL)]
    pub postgres_url: Option<String>,

    /// Run every specs/facets filter as its own query
    #[arg(long, global = true, env = ENV_NO_OPTIMIZATION)]
    pub no_optimization: bool,

    /// Maximum specs/facets queries in flight per request
    #[arg(long, global = true, env = ENV_MAX_CONCURRENCY)]
    pub max_concurrency: Option<usize>,
}

/// Parse database backend from CLI/env string
fn parse_backend(s: &str) -> Result<Backend, String> {
    match s.to_lowercase().as_str() {
        "sqlite" => Ok(Backend::Sqlite),
        "postgres" | "postgresql" => Ok(Backend::Postgres),
        _ => Err(format!(
            "Invalid backend '{}'. Valid options: sqlite, postgres",
            s
        )),
    }
}

fn parse_entity(s: &str) -> Result<Entity, String> {
    s.parse()
}

fn parse_sort_order(s: &str) -> Result<SortOrder, String> {
    match s.to_lowercase().as_str() {
        "asc" => Ok(SortOrder::Asc),
        "desc" => Ok(SortOrder::Desc),
        _ => Err(format!("Invalid order '{}'. Valid options: asc, desc", s)),
    }
}

/// Parse a JSON object of filter parameters
fn parse_params(s: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str(s) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("Filter parameters must be a JSON object".to_string()),
        Err(e) => Err(format!("Invalid JSON: {}", e)),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Create or upgrade the database schema
    Migrate,
    /// Run an admin query against one entity
    Query(QueryArgs),
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Filtered rows
    List,
    /// The single row matching the parameters
    Retrieve,
    /// Number of filtered rows
    Count,
    /// Values available within the filtered rows
    Specs,
    /// Values available per filter with its own parameter lifted
    Facets,
}

#[derive(Args, Clone, Debug)]
pub struct QueryArgs {
    /// Entity to query (e.g. products, product-categories, users)
    #[arg(value_parser = parse_entity)]
    pub entity: Entity,

    #[command(subcommand)]
    pub action: Action,

    /// Filter parameters as a JSON object, e.g. '{"name": "phone"}'
    #[arg(long, short = 'p', global = true, value_parser = parse_params)]
    pub params: Option<Map<String, Value>>,

    /// Filters to leave out of specs/facets (comma separated)
    #[arg(long, global = true, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Sort field for list pages
    #[arg(long, global = true)]
    pub sort: Option<String>,

    /// Sort direction (asc or desc)
    #[arg(long, global = true, default_value = "asc", value_parser = parse_sort_order)]
    pub order: SortOrder,

    /// First row of the page
    #[arg(long, global = true, default_value_t = 0)]
    pub start: u64,

    /// Row after the last row of the page
    #[arg(long, global = true, default_value_t = 10)]
    pub end: u64,
}

impl QueryArgs {
    /// Page parameters overlaid with the explicit `--params`
    pub fn filter_params(&self) -> Map<String, Value> {
        let mut params = AdminQuery {
            id: None,
            sort: self.sort.clone(),
            order: self.order,
            start: self.start,
            end: self.end,
        }
        .into_params();
        if let Some(explicit) = &self.params {
            params.extend(explicit.clone());
        }
        params
    }
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub backend: Option<Backend>,
    pub postgres_url: Option<String>,
    pub no_optimization: bool,
    pub max_concurrency: Option<usize>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        database: cli.database,
        backend: cli.backend,
        postgres_url: cli.postgres_url,
        no_optimization: cli.no_optimization,
        max_concurrency: cli.max_concurrency,
    };
    (config, cli.command)
}
