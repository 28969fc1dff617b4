//! SQLite schema definitions
//!
//! Timestamps are stored as RFC 3339 UTC text so that range comparisons
//! against ISO strings order correctly and `strftime` can read them.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema SQL
pub const SCHEMA: &str = r#"
-- =============================================================================
-- Infrastructure: Schema version tracking
-- =============================================================================
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at INTEGER NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at INTEGER NOT NULL,
    execution_time_ms INTEGER,
    success INTEGER NOT NULL DEFAULT 1
);

-- =============================================================================
-- 1. Product categories
-- =============================================================================
CREATE TABLE IF NOT EXISTS product_categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

-- =============================================================================
-- 2. Products (references categories)
-- =============================================================================
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    base_price REAL NOT NULL,
    price_multiplier REAL NOT NULL DEFAULT 1,
    description TEXT,
    video TEXT,
    product_category_id INTEGER REFERENCES product_categories(id),
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_products_category ON products(product_category_id);

-- =============================================================================
-- 3. Product modifications and their values
-- =============================================================================
CREATE TABLE IF NOT EXISTS product_modifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    icon TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE TABLE IF NOT EXISTS product_modification_values (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    price REAL NOT NULL,
    modification_id INTEGER NOT NULL REFERENCES product_modifications(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_modification_values_modification
    ON product_modification_values(modification_id);

CREATE TABLE IF NOT EXISTS product_categories_modifications (
    product_category_id INTEGER NOT NULL REFERENCES product_categories(id) ON DELETE CASCADE,
    product_modification_id INTEGER NOT NULL REFERENCES product_modifications(id) ON DELETE CASCADE,
    PRIMARY KEY (product_category_id, product_modification_id)
);

-- =============================================================================
-- 4. Measure categories and their values
-- =============================================================================
CREATE TABLE IF NOT EXISTS measure_categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE TABLE IF NOT EXISTS measure_values (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    category_id INTEGER NOT NULL REFERENCES measure_categories(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_measure_values_category ON measure_values(category_id);

CREATE TABLE IF NOT EXISTS product_categories_measure_categories (
    product_category_id INTEGER NOT NULL REFERENCES product_categories(id) ON DELETE CASCADE,
    measure_category_id INTEGER NOT NULL REFERENCES measure_categories(id) ON DELETE CASCADE,
    PRIMARY KEY (product_category_id, measure_category_id)
);

-- =============================================================================
-- 5. Users
-- =============================================================================
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    hashed_password TEXT NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT 1,
    is_admin BOOLEAN NOT NULL DEFAULT 0,
    phone TEXT UNIQUE,
    birth_date TEXT,
    street TEXT,
    city TEXT,
    country TEXT
);

CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
"#;
