//! Catalog administration
//!
//! - `models` - Table definitions for the catalog schema
//! - `filtersets` - Admin filter sets per entity
//! - `repository` - List, lookup, count, specs and facets over one entity
//! - `catalog` - Entity registry handing out repositories

pub mod catalog;
pub mod filtersets;
pub mod models;
pub mod repository;

pub use catalog::{Catalog, Entity};
pub use repository::{AdminQuery, AdminRepository, SortOrder};
