//! Backend-neutral query builder
//!
//! Queries are assembled as values (`Select` of `Expr` trees) and rendered
//! for a specific `SqlDialect` only when executed.

mod expr;
mod model;
mod select;

pub use expr::{BinaryOp, Expr};
pub use model::{Model, Relation};
pub use select::{Distinct, JoinKind, OrderTerm, Select, Statement};
