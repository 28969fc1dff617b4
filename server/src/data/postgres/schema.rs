//! PostgreSQL schema definitions
//!
//! Mirrors the SQLite catalog schema. Prices use DOUBLE PRECISION so that
//! aggregates decode without an arbitrary-precision type.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema SQL for PostgreSQL
pub const SCHEMA: &str = r#"
-- =============================================================================
-- Infrastructure: Schema version tracking
-- =============================================================================
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at BIGINT NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at BIGINT NOT NULL,
    execution_time_ms INTEGER,
    success BOOLEAN NOT NULL DEFAULT TRUE
);

-- =============================================================================
-- 1. Product categories and products
-- =============================================================================
CREATE TABLE IF NOT EXISTS product_categories (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS products (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    base_price DOUBLE PRECISION NOT NULL,
    price_multiplier DOUBLE PRECISION NOT NULL DEFAULT 1,
    description TEXT,
    video TEXT,
    product_category_id BIGINT REFERENCES product_categories(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_products_category ON products(product_category_id);

-- =============================================================================
-- 2. Product modifications and their values
-- =============================================================================
CREATE TABLE IF NOT EXISTS product_modifications (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    icon TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS product_modification_values (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    price DOUBLE PRECISION NOT NULL,
    modification_id BIGINT NOT NULL REFERENCES product_modifications(id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_modification_values_modification
    ON product_modification_values(modification_id);

CREATE TABLE IF NOT EXISTS product_categories_modifications (
    product_category_id BIGINT NOT NULL REFERENCES product_categories(id) ON DELETE CASCADE,
    product_modification_id BIGINT NOT NULL REFERENCES product_modifications(id) ON DELETE CASCADE,
    PRIMARY KEY (product_category_id, product_modification_id)
);

-- =============================================================================
-- 3. Measure categories and their values
-- =============================================================================
CREATE TABLE IF NOT EXISTS measure_categories (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS measure_values (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    category_id BIGINT NOT NULL REFERENCES measure_categories(id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_measure_values_category ON measure_values(category_id);

CREATE TABLE IF NOT EXISTS product_categories_measure_categories (
    product_category_id BIGINT NOT NULL REFERENCES product_categories(id) ON DELETE CASCADE,
    measure_category_id BIGINT NOT NULL REFERENCES measure_categories(id) ON DELETE CASCADE,
    PRIMARY KEY (product_category_id, measure_category_id)
);

-- =============================================================================
-- 4. Users
-- =============================================================================
CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    hashed_password TEXT NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    is_admin BOOLEAN NOT NULL DEFAULT FALSE,
    phone TEXT UNIQUE,
    birth_date TIMESTAMPTZ,
    street TEXT,
    city TEXT,
    country TEXT
);
"#;
