//! Filter capabilities and shared building blocks
//!
//! Every filter narrows a query. Beyond that a filter may describe its
//! domain in two ways:
//! - specs: the full value domain within the filtered result set
//! - facets: the domain with the filter's own parameter removed
//!
//! Either may be computed by a dedicated query (`Specs` / `Facets`) or by
//! contributing columns to one aggregate query shared across the filter set
//! (`SpecsColumns` / `FacetsColumns`).

use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::schemas::RangeSchema;
use super::values::{compare_values, is_empty, sorted_unique, value_key};
use crate::data::error::DataError;
use crate::data::query::{Expr, Model, Select};
use crate::data::source::{DataSource, Row};

pub trait Filter: Send + Sync + fmt::Debug {
    /// Narrow `query` by the request parameter `value`
    fn filter(&self, query: Select, value: &Value) -> Select;

    /// Model fields and relations this filter reads, checked at build time
    fn references(&self) -> Vec<FieldRef> {
        Vec::new()
    }

    fn as_specs(&self) -> Option<&dyn Specs> {
        None
    }

    fn as_facets(&self) -> Option<&dyn Facets> {
        None
    }

    fn as_specs_columns(&self) -> Option<&dyn SpecsColumns> {
        None
    }

    fn as_facets_columns(&self) -> Option<&dyn FacetsColumns> {
        None
    }
}

#[async_trait]
pub trait Specs: Send + Sync {
    async fn specs(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError>;
}

#[async_trait]
pub trait Facets: Send + Sync {
    async fn facets(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError>;
}

pub trait SpecsColumns: Send + Sync {
    /// Columns to add to the shared specs query; `name` is the filter's name
    fn specs_columns(&self, name: &str) -> ColumnBundle;
}

pub trait FacetsColumns: Send + Sync {
    /// Columns to add to the shared facets query; `name` is the filter's name
    fn facets_columns(&self, name: &str) -> ColumnBundle;
}

type RowParser = Box<dyn Fn(&Row) -> Result<Value, DataError> + Send + Sync>;

/// Aggregate columns plus the function that reads them back
///
/// Column aliases are derived from the filter name and must be unique within
/// a filter set; building the set rejects collisions.
pub struct ColumnBundle {
    pub columns: Vec<Expr>,
    parser: RowParser,
}

impl ColumnBundle {
    pub fn new(
        columns: Vec<Expr>,
        parser: impl Fn(&Row) -> Result<Value, DataError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            columns,
            parser: Box::new(parser),
        }
    }

    /// A single column aliased to `name`
    pub fn single(
        name: &str,
        expr: Expr,
        parse: impl Fn(&str, Value) -> Result<Value, DataError> + Send + Sync + 'static,
    ) -> Self {
        let alias = name.to_string();
        Self::new(vec![expr.label(name)], move |row| {
            parse(&alias, row.value(&alias))
        })
    }

    pub fn parse(&self, row: &Row) -> Result<Value, DataError> {
        (self.parser)(row)
    }

    /// Aliases of the labelled columns
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().filter_map(|column| match column {
            Expr::Label { alias, .. } => Some(alias.as_str()),
            _ => None,
        })
    }
}

impl fmt::Debug for ColumnBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnBundle")
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

/// A model attribute a filter depends on
#[derive(Debug, Clone, Copy)]
pub enum FieldRef {
    Column {
        model: &'static Model,
        field: &'static str,
    },
    /// `field` on the target of `model.relation`
    Related {
        model: &'static Model,
        relation: &'static str,
        field: &'static str,
    },
}

/// The column a field filter targets and its common options
#[derive(Debug, Clone, Copy)]
pub struct Target {
    pub model: &'static Model,
    pub field: &'static str,
    /// Keep rows where the predicate is false or NULL instead
    pub exclude: bool,
    /// Treat an empty parameter as a request for NULL rather than a no-op
    pub nullable: bool,
}

impl Target {
    pub fn new(model: &'static Model, field: &'static str) -> Self {
        Self {
            model,
            field,
            exclude: false,
            nullable: false,
        }
    }

    pub fn column(&self) -> Expr {
        self.model.column(self.field)
    }

    /// Narrow `query` by `predicate(column, value)`
    ///
    /// Empty values leave the query untouched unless the target is nullable,
    /// in which case they select NULL rows. A predicate of `None` means the
    /// value could not be interpreted and the query is left as is.
    pub fn filter_with(
        &self,
        query: Select,
        value: &Value,
        predicate: impl FnOnce(Expr, &Value) -> Option<Expr>,
    ) -> Select {
        if is_empty(value) {
            if !self.nullable {
                return query;
            }
            return self.apply(query, self.column().is_null());
        }
        match predicate(self.column(), value) {
            Some(predicate) => self.apply(query, predicate),
            None => query,
        }
    }

    pub fn apply(&self, query: Select, predicate: Expr) -> Select {
        if self.exclude {
            query.and_where(predicate.is_not_true())
        } else {
            query.and_where(predicate)
        }
    }

    pub fn references(&self) -> Vec<FieldRef> {
        vec![FieldRef::Column {
            model: self.model,
            field: self.field,
        }]
    }
}

/// Adds the `exclude()` and `nullable()` builder options to filters that
/// wrap a `Target`
macro_rules! target_options {
    ($($filter:ty),+ $(,)?) => {$(
        impl $filter {
            /// Keep the rows the predicate rejects (including NULL matches)
            pub fn exclude(mut self) -> Self {
                self.target.exclude = true;
                self
            }

            /// Filter on NULL when the parameter is empty
            pub fn nullable(mut self) -> Self {
                self.target.nullable = true;
                self
            }
        }
    )+};
}

pub(crate) use target_options;

/// Distinct non-null values of `expr` within `query`, sorted
pub(crate) async fn distinct_values(
    source: &dyn DataSource,
    query: Select,
    expr: Expr,
    descending: bool,
) -> Result<Vec<Value>, DataError> {
    let query = query
        .columns(vec![expr.clone().label("value")])
        .and_where(expr.is_not_null())
        .distinct();
    let values = source
        .execute(&query)
        .await?
        .into_iter()
        .map(|row| row.value("value"))
        .collect();
    Ok(sorted_unique(values, descending))
}

/// Row counts per distinct non-null value of `expr`, keyed by the value
///
/// Over a DISTINCT query each de-duplicated row is counted once.
pub(crate) async fn value_counts(
    source: &dyn DataSource,
    query: Select,
    expr: Expr,
) -> Result<Value, DataError> {
    let query = if query.is_distinct() {
        // Group the de-duplicated rows, not the joined ones
        let value = Expr::column("d", "facet_value");
        query
            .add_columns(vec![expr.clone().label("facet_value")])
            .and_where(expr.is_not_null())
            .subquery("d")
            .columns(vec![
                value.clone().label("value"),
                Expr::count_all().label("count"),
            ])
            .group_by(vec![value])
    } else {
        query
            .columns(vec![
                expr.clone().label("value"),
                Expr::count_all().label("count"),
            ])
            .and_where(expr.clone().is_not_null())
            .group_by(vec![expr])
    };

    let mut rows = source.execute(&query).await?;
    rows.sort_by(|a, b| compare_values(&a.value("value"), &b.value("value")));

    let counts: Map<String, Value> = rows
        .into_iter()
        .map(|row| (value_key(&row.value("value")), row.value("count")))
        .collect();
    Ok(Value::Object(counts))
}

/// `{"min": .., "max": ..}` of `expr` within `query`
pub(crate) async fn min_max(
    source: &dyn DataSource,
    query: Select,
    expr: Expr,
    schema: RangeSchema,
    name: &str,
) -> Result<Value, DataError> {
    let query = query.columns(vec![
        expr.clone().min().label("min_value"),
        expr.max().label("max_value"),
    ]);
    let row = source.execute_one(&query).await?;
    schema.parse(name, row.value("min_value"), row.value("max_value"))
}

/// Bundled counterpart of [`min_max`], aliased `min_<name>` / `max_<name>`
pub(crate) fn min_max_bundle(name: &str, expr: Expr, schema: RangeSchema) -> ColumnBundle {
    let min_alias = format!("min_{}", name);
    let max_alias = format!("max_{}", name);
    let columns = vec![
        expr.clone().min().label(min_alias.as_str()),
        expr.max().label(max_alias.as_str()),
    ];
    let name = name.to_string();
    ColumnBundle::new(columns, move |row| {
        schema.parse(&name, row.value(&min_alias), row.value(&max_alias))
    })
}
