//! Filters whose behavior is supplied as closures by the filter set author

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use super::base::{ColumnBundle, Facets, FacetsColumns, FieldRef, Filter, Specs, SpecsColumns};
use super::values::is_empty;
use crate::data::error::DataError;
use crate::data::query::Select;
use crate::data::source::DataSource;

pub type FilterFn = Arc<dyn Fn(Select, &Value) -> Select + Send + Sync>;
pub type AggregateFn = Arc<
    dyn for<'a> Fn(&'a dyn DataSource, Select) -> BoxFuture<'a, Result<Value, DataError>>
        + Send
        + Sync,
>;
pub type ColumnsFn = Arc<dyn Fn(&str) -> ColumnBundle + Send + Sync>;

#[derive(Clone)]
struct Aggregate(AggregateFn);

#[async_trait]
impl Specs for Aggregate {
    async fn specs(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError> {
        (self.0)(source, query).await
    }
}

#[async_trait]
impl Facets for Aggregate {
    async fn facets(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError> {
        (self.0)(source, query).await
    }
}

#[derive(Clone)]
struct Columns(ColumnsFn);

impl SpecsColumns for Columns {
    fn specs_columns(&self, name: &str) -> ColumnBundle {
        (self.0)(name)
    }
}

impl FacetsColumns for Columns {
    fn facets_columns(&self, name: &str) -> ColumnBundle {
        (self.0)(name)
    }
}

/// Custom filter logic, e.g. membership through a junction table
///
/// Only the capabilities that were supplied are reported, so the filter set
/// never asks for specs or facets the author did not provide. Empty
/// parameters never reach the filter closure.
#[derive(Clone)]
pub struct MethodFilter {
    filter: FilterFn,
    specs: Option<Aggregate>,
    facets: Option<Aggregate>,
    specs_columns: Option<Columns>,
    facets_columns: Option<Columns>,
    references: Vec<FieldRef>,
}

impl MethodFilter {
    pub fn new(filter: impl Fn(Select, &Value) -> Select + Send + Sync + 'static) -> Self {
        Self {
            filter: Arc::new(filter),
            specs: None,
            facets: None,
            specs_columns: None,
            facets_columns: None,
            references: Vec::new(),
        }
    }

    pub fn with_specs<F>(mut self, specs: F) -> Self
    where
        F: for<'a> Fn(&'a dyn DataSource, Select) -> BoxFuture<'a, Result<Value, DataError>>
            + Send
            + Sync
            + 'static,
    {
        self.specs = Some(Aggregate(Arc::new(specs)));
        self
    }

    pub fn with_facets<F>(mut self, facets: F) -> Self
    where
        F: for<'a> Fn(&'a dyn DataSource, Select) -> BoxFuture<'a, Result<Value, DataError>>
            + Send
            + Sync
            + 'static,
    {
        self.facets = Some(Aggregate(Arc::new(facets)));
        self
    }

    pub fn with_specs_columns(
        mut self,
        columns: impl Fn(&str) -> ColumnBundle + Send + Sync + 'static,
    ) -> Self {
        self.specs_columns = Some(Columns(Arc::new(columns)));
        self
    }

    pub fn with_facets_columns(
        mut self,
        columns: impl Fn(&str) -> ColumnBundle + Send + Sync + 'static,
    ) -> Self {
        self.facets_columns = Some(Columns(Arc::new(columns)));
        self
    }

    /// Declare model fields the closures use so they are validated at build
    pub fn with_references(mut self, references: Vec<FieldRef>) -> Self {
        self.references = references;
        self
    }
}

impl fmt::Debug for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodFilter")
            .field("specs", &self.specs.is_some())
            .field("facets", &self.facets.is_some())
            .field("specs_columns", &self.specs_columns.is_some())
            .field("facets_columns", &self.facets_columns.is_some())
            .finish()
    }
}

impl Filter for MethodFilter {
    fn filter(&self, query: Select, value: &Value) -> Select {
        if is_empty(value) {
            return query;
        }
        (self.filter)(query, value)
    }

    fn references(&self) -> Vec<FieldRef> {
        self.references.clone()
    }

    fn as_specs(&self) -> Option<&dyn Specs> {
        self.specs.as_ref().map(|s| s as &dyn Specs)
    }

    fn as_facets(&self) -> Option<&dyn Facets> {
        self.facets.as_ref().map(|f| f as &dyn Facets)
    }

    fn as_specs_columns(&self) -> Option<&dyn SpecsColumns> {
        self.specs_columns.as_ref().map(|c| c as &dyn SpecsColumns)
    }

    fn as_facets_columns(&self) -> Option<&dyn FacetsColumns> {
        self.facets_columns.as_ref().map(|c| c as &dyn FacetsColumns)
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;
    use serde_json::json;

    use super::*;
    use crate::data::filters::testing::{GROUPS, ITEMS, bundled, ids, items_source};
    use crate::data::query::Expr;

    fn group_filter() -> MethodFilter {
        MethodFilter::new(|query, value| {
            let group = ITEMS.relation("group").unwrap();
            query
                .join_relation(&ITEMS, group)
                .and_where(GROUPS.column("name").eq(value.clone()))
        })
    }

    #[tokio::test]
    async fn test_delegates_filter() {
        let source = items_source().await;
        let query = group_filter()
            .filter(Select::from_model(&ITEMS), &json!("Toys"))
            .order_by(ITEMS.column("id"), false);
        assert_eq!(ids(&source.execute(&query).await.unwrap()), vec![3, 4]);
    }

    #[tokio::test]
    async fn test_empty_value_not_delegated() {
        let filter = MethodFilter::new(|_, _| panic!("must not be called"));
        let query = filter.filter(Select::from_model(&ITEMS), &json!(""));
        assert!(!query.has_table("item_groups"));
    }

    #[test]
    fn test_only_supplied_capabilities() {
        let filter = group_filter();
        assert!(filter.as_specs().is_none());
        assert!(filter.as_facets().is_none());
        assert!(filter.as_specs_columns().is_none());
        assert!(filter.as_facets_columns().is_none());

        let filter = group_filter().with_facets_columns(|name| {
            ColumnBundle::single(name, Expr::count_all(), |_, raw| Ok(raw))
        });
        assert!(filter.as_facets_columns().is_some());
        assert!(filter.as_specs_columns().is_none());
    }

    #[tokio::test]
    async fn test_delegates_specs_and_columns() {
        let source = items_source().await;
        let filter = group_filter()
            .with_specs(|source, query| {
                async move {
                    let group = ITEMS.relation("group").unwrap();
                    let query = query
                        .join_relation(&ITEMS, group)
                        .columns(vec![GROUPS.column("name").label("name")])
                        .distinct()
                        .order_by(GROUPS.column("name"), false);
                    let rows = source.execute(&query).await?;
                    Ok(Value::Array(rows.iter().map(|r| r.value("name")).collect()))
                }
                .boxed()
            })
            .with_specs_columns(|name| {
                ColumnBundle::single(
                    name,
                    ITEMS.column("group_id").count_distinct(),
                    |_, raw| Ok(raw),
                )
            });

        let query = Select::from_model(&ITEMS);
        let specs = filter
            .as_specs()
            .unwrap()
            .specs(&source, query.clone())
            .await
            .unwrap();
        assert_eq!(specs, json!(["Tools", "Toys"]));

        let bundle = filter.as_specs_columns().unwrap().specs_columns("groups");
        assert_eq!(bundled(&source, query, bundle).await, json!(2));
    }
}
