//! Case-insensitive text search across several columns

use serde_json::Value;

use super::base::{FieldRef, Filter};
use super::values::is_empty;
use crate::data::query::{Expr, Model, Select};
use crate::utils::sql::search_pattern;

/// Matches rows where any of `fields` contains the search term
///
/// Glob wildcards in the term (`*`, `?`) switch to whole-value matching.
/// Columns are cast to text, so numeric fields such as ids are searchable.
#[derive(Debug, Clone)]
pub struct SearchFilter {
    model: &'static Model,
    fields: Vec<&'static str>,
    exclude: bool,
    nullable: bool,
}

impl SearchFilter {
    pub fn new(model: &'static Model, fields: &[&'static str]) -> Self {
        Self {
            model,
            fields: fields.to_vec(),
            exclude: false,
            nullable: false,
        }
    }

    pub fn exclude(mut self) -> Self {
        self.exclude = true;
        self
    }

    /// Apply an empty term as "any non-null value" instead of skipping
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

impl Filter for SearchFilter {
    fn filter(&self, query: Select, value: &Value) -> Select {
        if !self.nullable && is_empty(value) {
            return query;
        }

        let term = match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        let pattern = search_pattern(&term);

        let predicate = Expr::or(
            self.fields
                .iter()
                .map(|field| self.model.column(field).cast_text().ilike(pattern.as_str()))
                .collect(),
        );

        if self.exclude {
            query.and_where(predicate.is_not_true())
        } else {
            query.and_where(predicate)
        }
    }

    fn references(&self) -> Vec<FieldRef> {
        self.fields
            .iter()
            .map(|&field| FieldRef::Column {
                model: self.model,
                field,
            })
            .collect()
    }
}
