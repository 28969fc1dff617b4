//! Utility functions for the application

pub mod concurrency;
pub mod sql;
