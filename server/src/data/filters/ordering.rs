//! Sorting and paging parameters

use serde_json::Value;

use super::base::{FieldRef, Filter};
use super::values::{as_list, as_u64, is_empty};
use crate::data::query::{Expr, Model, Select};

#[derive(Debug, Clone)]
enum SortKey {
    Field {
        model: &'static Model,
        field: &'static str,
    },
    Expr(Expr),
}

/// Replaces the query ordering with the requested sort keys
///
/// The parameter is a list such as `["-price", "name"]`; a `-` prefix sorts
/// descending and earlier keys take priority. Keys that are not declared are
/// skipped. Any non-empty list discards the existing ordering.
#[derive(Debug, Clone, Default)]
pub struct OrderingFilter {
    keys: Vec<(&'static str, SortKey)>,
}

impl OrderingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every field of `model`, each under its own name
    pub fn model_fields(model: &'static Model) -> Self {
        model
            .fields
            .iter()
            .fold(Self::new(), |ordering, &field| ordering.field(field, model, field))
    }

    /// Sort key `key` orders by `model.field`
    pub fn field(mut self, key: &'static str, model: &'static Model, field: &'static str) -> Self {
        self.keys.push((key, SortKey::Field { model, field }));
        self
    }

    /// Sort key `key` orders by an arbitrary expression
    pub fn expr(mut self, key: &'static str, expr: Expr) -> Self {
        self.keys.push((key, SortKey::Expr(expr)));
        self
    }

    fn resolve(&self, key: &str) -> Option<Expr> {
        self.keys
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, sort)| match sort {
                SortKey::Field { model, field } => model.column(field),
                SortKey::Expr(expr) => expr.clone(),
            })
    }
}

impl Filter for OrderingFilter {
    fn filter(&self, query: Select, value: &Value) -> Select {
        let keys = as_list(value);
        if keys.is_empty() {
            return query;
        }

        keys.iter()
            .filter_map(Value::as_str)
            .fold(query.clear_order_by(), |query, key| {
                let (key, descending) = match key.strip_prefix('-') {
                    Some(key) => (key, true),
                    None => (key, false),
                };
                match self.resolve(key) {
                    Some(expr) if !key.is_empty() => query.order_by(expr, descending),
                    _ => query,
                }
            })
    }

    fn references(&self) -> Vec<FieldRef> {
        self.keys
            .iter()
            .filter_map(|(_, sort)| match sort {
                SortKey::Field { model, field } => Some(FieldRef::Column {
                    model: *model,
                    field: *field,
                }),
                SortKey::Expr(_) => None,
            })
            .collect()
    }
}

/// Ordering with `id` as the final tie-breaker
///
/// No ordering, or one that already mentions `id`, becomes `["id"]`.
pub fn with_default_ordering(ordering: Option<Vec<String>>) -> Vec<String> {
    match ordering {
        Some(ordering) if !ordering.iter().any(|key| key == "id") => {
            let mut ordering = ordering;
            ordering.push("id".to_string());
            ordering
        }
        _ => vec!["id".to_string()],
    }
}

/// Applies `[offset, limit]` or `{"offset": .., "limit": ..}`
#[derive(Debug, Clone, Copy, Default)]
pub struct LimitOffsetPagination;

impl Filter for LimitOffsetPagination {
    fn filter(&self, query: Select, value: &Value) -> Select {
        if is_empty(value) {
            return query;
        }

        let (offset, limit) = match value {
            Value::Array(items) => (
                items.first().and_then(as_u64),
                items.get(1).and_then(as_u64),
            ),
            Value::Object(map) => (
                map.get("offset").and_then(as_u64),
                map.get("limit").and_then(as_u64),
            ),
            _ => (None, None),
        };

        let query = match offset {
            Some(offset) => query.offset(offset),
            None => query,
        };
        match limit {
            Some(limit) => query.limit(limit),
            None => query,
        }
    }
}
