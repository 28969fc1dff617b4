// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "Storefront";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "storefront.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "STOREFRONT_CONFIG";

// =============================================================================
// Environment Variables
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "STOREFRONT_LOG";

/// Environment variable for the SQLite database file
pub const ENV_DATABASE: &str = "STOREFRONT_DATABASE";

/// Environment variable for the database backend (`sqlite` or `postgres`)
pub const ENV_BACKEND: &str = "STOREFRONT_BACKEND";

/// Environment variable for the PostgreSQL connection URL
pub const ENV_POSTGRES_URL: &str = "STOREFRONT_POSTGRES_URL";

/// Environment variable to disable column bundling for specs/facets
pub const ENV_NO_OPTIMIZATION: &str = "STOREFRONT_NO_OPTIMIZATION";

/// Environment variable for the specs/facets concurrency limit
pub const ENV_MAX_CONCURRENCY: &str = "STOREFRONT_MAX_CONCURRENCY";

// =============================================================================
// SQLite
// =============================================================================

/// Default SQLite database file name
pub const SQLITE_DB_FILENAME: &str = "storefront.db";

/// Connection pool size
pub const SQLITE_MAX_CONNECTIONS: u32 = 5;

/// Busy timeout for locked databases
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 30;

/// Page cache size (negative = KiB)
pub const SQLITE_CACHE_SIZE: &str = "-64000";

// =============================================================================
// PostgreSQL
// =============================================================================

pub const POSTGRES_DEFAULT_MAX_CONNECTIONS: u32 = 20;

pub const POSTGRES_DEFAULT_MIN_CONNECTIONS: u32 = 1;

pub const POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

pub const POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// Filter Engine
// =============================================================================

/// Maximum specs/facets queries in flight for one request
pub const DEFAULT_MAX_CONCURRENCY: usize = 100;

/// Column label of the total row count in the bundled facets query
pub const FACETS_COUNT_COLUMN: &str = "count";
