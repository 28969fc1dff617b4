//! Catalog tables as seen by the query builder
//!
//! Field lists mirror the schema in `data::sqlite::schema` and
//! `data::postgres::schema`, except that `users.hashed_password` is never
//! selected.

use crate::data::query::{Model, Relation};

pub static PRODUCT_CATEGORIES: Model = Model {
    table: "product_categories",
    fields: &["id", "name", "created_at", "updated_at"],
    relations: &[],
};

pub static PRODUCTS: Model = Model {
    table: "products",
    fields: &[
        "id",
        "name",
        "base_price",
        "price_multiplier",
        "description",
        "video",
        "product_category_id",
        "created_at",
        "updated_at",
    ],
    relations: &[Relation {
        name: "category",
        target: &PRODUCT_CATEGORIES,
        local_key: "product_category_id",
        remote_key: "id",
    }],
};

pub static PRODUCT_MODIFICATIONS: Model = Model {
    table: "product_modifications",
    fields: &["id", "name", "icon", "created_at", "updated_at"],
    relations: &[Relation {
        name: "product_categories",
        target: &PRODUCT_CATEGORIES_MODIFICATIONS,
        local_key: "id",
        remote_key: "product_modification_id",
    }],
};

pub static PRODUCT_MODIFICATION_VALUES: Model = Model {
    table: "product_modification_values",
    fields: &[
        "id",
        "name",
        "price",
        "modification_id",
        "created_at",
        "updated_at",
    ],
    relations: &[Relation {
        name: "modification",
        target: &PRODUCT_MODIFICATIONS,
        local_key: "modification_id",
        remote_key: "id",
    }],
};

pub static PRODUCT_CATEGORIES_MODIFICATIONS: Model = Model {
    table: "product_categories_modifications",
    fields: &["product_category_id", "product_modification_id"],
    relations: &[],
};

pub static MEASURE_CATEGORIES: Model = Model {
    table: "measure_categories",
    fields: &["id", "name", "created_at", "updated_at"],
    relations: &[Relation {
        name: "product_categories",
        target: &PRODUCT_CATEGORIES_MEASURE_CATEGORIES,
        local_key: "id",
        remote_key: "measure_category_id",
    }],
};

pub static MEASURE_VALUES: Model = Model {
    table: "measure_values",
    fields: &["id", "name", "category_id", "created_at", "updated_at"],
    relations: &[Relation {
        name: "category",
        target: &MEASURE_CATEGORIES,
        local_key: "category_id",
        remote_key: "id",
    }],
};

pub static PRODUCT_CATEGORIES_MEASURE_CATEGORIES: Model = Model {
    table: "product_categories_measure_categories",
    fields: &["product_category_id", "measure_category_id"],
    relations: &[],
};

pub static USERS: Model = Model {
    table: "users",
    fields: &[
        "id",
        "first_name",
        "last_name",
        "email",
        "is_active",
        "is_admin",
        "phone",
        "birth_date",
        "street",
        "city",
        "country",
    ],
    relations: &[],
};
