//! Boolean column filters

use async_trait::async_trait;
use serde_json::Value;

use super::base::{
    ColumnBundle, Facets, FacetsColumns, FieldRef, Filter, Specs, SpecsColumns, Target,
    distinct_values, target_options,
};
use super::values::{as_bool, normalize_bool, parse_json_array, sorted_unique};
use crate::data::error::DataError;
use crate::data::query::{Expr, Model, Select};
use crate::data::source::DataSource;

/// `column = true|false`
///
/// Parameters that are not recognisably boolean leave the query unchanged.
/// Specs and facets list the distinct values present, `false` first.
#[derive(Debug, Clone)]
pub struct BooleanFilter {
    target: Target,
}

impl BooleanFilter {
    pub fn new(model: &'static Model, field: &'static str) -> Self {
        Self {
            target: Target::new(model, field),
        }
    }
}

fn present_booleans(values: Vec<Value>) -> Value {
    Value::Array(sorted_unique(
        values.into_iter().map(normalize_bool).collect(),
        false,
    ))
}

impl Filter for BooleanFilter {
    fn filter(&self, query: Select, value: &Value) -> Select {
        self.target.filter_with(query, value, |column, value| {
            let flag = as_bool(value);
            if flag.is_none() {
                tracing::debug!(field = self.target.field, %value, "Ignoring non-boolean filter value");
            }
            flag.map(|flag| column.eq(flag))
        })
    }

    fn references(&self) -> Vec<FieldRef> {
        self.target.references()
    }

    fn as_specs(&self) -> Option<&dyn Specs> {
        Some(self)
    }

    fn as_facets(&self) -> Option<&dyn Facets> {
        Some(self)
    }

    fn as_specs_columns(&self) -> Option<&dyn SpecsColumns> {
        Some(self)
    }

    fn as_facets_columns(&self) -> Option<&dyn FacetsColumns> {
        Some(self)
    }
}

#[async_trait]
impl Specs for BooleanFilter {
    async fn specs(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError> {
        let values = distinct_values(source, query, self.target.column(), false).await?;
        Ok(present_booleans(values))
    }
}

#[async_trait]
impl Facets for BooleanFilter {
    async fn facets(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError> {
        self.specs(source, query).await
    }
}

impl SpecsColumns for BooleanFilter {
    fn specs_columns(&self, name: &str) -> ColumnBundle {
        ColumnBundle::single(
            name,
            self.target.column().json_array_agg(),
            |alias, raw| Ok(present_booleans(parse_json_array(raw, alias)?)),
        )
    }
}

impl FacetsColumns for BooleanFilter {
    fn facets_columns(&self, name: &str) -> ColumnBundle {
        self.specs_columns(name)
    }
}

/// One-directional gate on a boolean column
///
/// The parameter is inverted first when the filter is excluding. A ticked
/// result keeps rows where the column equals it (always `true`); an unticked
/// one changes nothing.
/// Dedicated specs and facets are always `true`: the checkbox can always be
/// offered. The bundled facet reports whether any row in the filtered set
/// would pass the gate.
#[derive(Debug, Clone)]
pub struct CheckboxFilter {
    target: Target,
}

impl CheckboxFilter {
    pub fn new(model: &'static Model, field: &'static str) -> Self {
        Self {
            target: Target::new(model, field),
        }
    }

    /// Invert the parameter before gating
    pub fn exclude(mut self) -> Self {
        self.target.exclude = true;
        self
    }

    fn expected(&self) -> bool {
        !self.target.exclude
    }

    /// The parameter after the `exclude` inversion
    fn effective(&self, value: &Value) -> Option<bool> {
        as_bool(value).map(|ticked| ticked != self.target.exclude)
    }
}

impl Filter for CheckboxFilter {
    fn filter(&self, query: Select, value: &Value) -> Select {
        match self.effective(value) {
            Some(true) => query.and_where(self.target.column().eq(true)),
            _ => query,
        }
    }

    fn references(&self) -> Vec<FieldRef> {
        self.target.references()
    }

    fn as_specs(&self) -> Option<&dyn Specs> {
        Some(self)
    }

    fn as_facets(&self) -> Option<&dyn Facets> {
        Some(self)
    }

    fn as_facets_columns(&self) -> Option<&dyn FacetsColumns> {
        Some(self)
    }
}

#[async_trait]
impl Specs for CheckboxFilter {
    async fn specs(&self, _source: &dyn DataSource, _query: Select) -> Result<Value, DataError> {
        Ok(Value::Bool(true))
    }
}

#[async_trait]
impl Facets for CheckboxFilter {
    async fn facets(&self, _source: &dyn DataSource, _query: Select) -> Result<Value, DataError> {
        Ok(Value::Bool(true))
    }
}

impl FacetsColumns for CheckboxFilter {
    fn facets_columns(&self, name: &str) -> ColumnBundle {
        let matching = Expr::case(
            self.target.column().eq(self.expected()),
            Expr::raw("1"),
            Expr::raw("NULL"),
        )
        .count();
        let any = Expr::case(matching.gt_expr(Expr::raw("0")), Expr::Bool(true), Expr::Bool(false));

        ColumnBundle::single(name, any, |_, raw| {
            Ok(Value::Bool(as_bool(&raw).unwrap_or(false)))
        })
    }
}

target_options!(BooleanFilter);
