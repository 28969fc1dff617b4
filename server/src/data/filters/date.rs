//! Filters over components of a timestamp column

use async_trait::async_trait;
use serde_json::Value;

use super::base::{
    ColumnBundle, Facets, FacetsColumns, FieldRef, Filter, Specs, SpecsColumns, Target,
    distinct_values, target_options,
};
use super::values::{as_list, coerce_number, parse_json_array, sorted_unique, value_key};
use crate::data::error::DataError;
use crate::data::query::{Expr, Model, Select};
use crate::data::source::DataSource;
use crate::data::sql::DatePart;

/// Matches an extracted date part (year, month, ...) against the parameter
///
/// Specs and facets list the distinct parts present, newest first.
#[derive(Debug, Clone)]
pub struct DatePartFilter {
    target: Target,
    part: DatePart,
    multiple: bool,
}

impl DatePartFilter {
    pub fn new(model: &'static Model, field: &'static str, part: DatePart) -> Self {
        Self {
            target: Target::new(model, field),
            part,
            multiple: false,
        }
    }

    /// Accept a list of parts and match any of them
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    fn part(&self) -> Expr {
        self.target.column().date_part(self.part)
    }
}

fn part_choices(values: Vec<Value>) -> Value {
    Value::Array(
        values
            .into_iter()
            .map(|v| serde_json::json!({ "value": v, "label": v }))
            .collect(),
    )
}

impl Filter for DatePartFilter {
    fn filter(&self, query: Select, value: &Value) -> Select {
        let (part, multiple) = (self.part, self.multiple);
        self.target.filter_with(query, value, |column, value| {
            let extracted = column.date_part(part);
            Some(if multiple {
                extracted.in_list(as_list(value).into_iter().map(coerce_number).collect())
            } else {
                extracted.eq(coerce_number(value.clone()))
            })
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
impl Specs for DatePartFilter {
    async fn specs(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError> {
        let values = distinct_values(source, query, self.part(), true).await?;
        Ok(part_choices(values))
    }
}

#[async_trait]
impl Facets for DatePartFilter {
    async fn facets(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError> {
        let values = distinct_values(source, query, self.part(), true).await?;
        Ok(Value::Array(values))
    }
}

impl SpecsColumns for DatePartFilter {
    fn specs_columns(&self, name: &str) -> ColumnBundle {
        ColumnBundle::single(name, self.part().json_array_agg(), |alias, raw| {
            Ok(part_choices(sorted_unique(parse_json_array(raw, alias)?, true)))
        })
    }
}

impl FacetsColumns for DatePartFilter {
    fn facets_columns(&self, name: &str) -> ColumnBundle {
        ColumnBundle::single(name, self.part().json_array_agg(), |alias, raw| {
            Ok(Value::Array(sorted_unique(parse_json_array(raw, alias)?, true)))
        })
    }
}

/// Matches a `YYYY-MM` string built from the column
///
/// Specs label each month with its first day (`YYYY-MM-01`).
#[derive(Debug, Clone)]
pub struct YearMonthFilter {
    target: Target,
}

impl YearMonthFilter {
    pub fn new(model: &'static Model, field: &'static str) -> Self {
        Self {
            target: Target::new(model, field),
        }
    }

    fn year_month(&self) -> Expr {
        self.target.column().year_month()
    }
}

fn month_choices(values: Vec<Value>) -> Value {
    Value::Array(
        values
            .into_iter()
            .map(|v| {
                let label = format!("{}-01", value_key(&v));
                serde_json::json!({ "value": v, "label": label })
            })
            .collect(),
    )
}

impl Filter for YearMonthFilter {
    fn filter(&self, query: Select, value: &Value) -> Select {
        self.target.filter_with(query, value, |column, value| {
            Some(column.year_month().eq(Value::String(value_key(value))))
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
impl Specs for YearMonthFilter {
    async fn specs(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError> {
        let values = distinct_values(source, query, self.year_month(), true).await?;
        Ok(month_choices(values))
    }
}

#[async_trait]
impl Facets for YearMonthFilter {
    async fn facets(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError> {
        let values = distinct_values(source, query, self.year_month(), true).await?;
        Ok(Value::Array(values))
    }
}

impl SpecsColumns for YearMonthFilter {
    fn specs_columns(&self, name: &str) -> ColumnBundle {
        ColumnBundle::single(name, self.year_month().json_array_agg(), |alias, raw| {
            Ok(month_choices(sorted_unique(parse_json_array(raw, alias)?, true)))
        })
    }
}

impl FacetsColumns for YearMonthFilter {
    fn facets_columns(&self, name: &str) -> ColumnBundle {
        ColumnBundle::single(name, self.year_month().json_array_agg(), |alias, raw| {
            Ok(Value::Array(sorted_unique(parse_json_array(raw, alias)?, true)))
        })
    }
}

target_options!(DatePartFilter, YearMonthFilter);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::data::filters::field::ExactFilter;
    use crate::data::filters::testing::{ITEMS, bundled, ids, items_source};

    async fn run(source: &dyn DataSource, filter: &dyn Filter, value: Value) -> Vec<i64> {
        let query = filter
            .filter(Select::from_model(&ITEMS), &value)
            .order_by(ITEMS.column("id"), false);
        ids(&source.execute(&query).await.unwrap())
    }

    #[tokio::test]
    async fn test_year_filter_accepts_text() {
        let source = items_source().await;
        let filter = DatePartFilter::new(&ITEMS, "created_at", DatePart::Year);
        assert_eq!(run(&source, &filter, json!(2023)).await, vec![1, 2]);
        assert_eq!(run(&source, &filter, json!("2024")).await, vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn test_month_filter_multiple() {
        let source = items_source().await;
        let filter = DatePartFilter::new(&ITEMS, "created_at", DatePart::Month).multiple();
        assert_eq!(run(&source, &filter, json!([1, "3"])).await, vec![1, 2, 3]);

        let excluded = DatePartFilter::new(&ITEMS, "created_at", DatePart::Month)
            .multiple()
            .exclude();
        assert_eq!(run(&source, &excluded, json!([1, 3])).await, vec![4, 5]);
    }

    #[tokio::test]
    async fn test_date_part_specs_descending() {
        let source = items_source().await;
        let filter = DatePartFilter::new(&ITEMS, "created_at", DatePart::Year);
        let query = Select::from_model(&ITEMS);

        let specs = filter.specs(&source, query.clone()).await.unwrap();
        assert_eq!(
            specs,
            json!([
                {"value": 2024, "label": 2024},
                {"value": 2023, "label": 2023},
            ])
        );
        let bundle = filter.specs_columns("year");
        assert_eq!(bundled(&source, query.clone(), bundle).await, specs);

        let facets = filter.facets(&source, query.clone()).await.unwrap();
        assert_eq!(facets, json!([2024, 2023]));
        let bundle = filter.facets_columns("year");
        assert_eq!(bundled(&source, query, bundle).await, facets);
    }

    #[tokio::test]
    async fn test_year_month_filter() {
        let source = items_source().await;
        let filter = YearMonthFilter::new(&ITEMS, "created_at");
        assert_eq!(run(&source, &filter, json!("2024-02")).await, vec![4, 5]);
        assert_eq!(run(&source, &filter, json!("2024-2")).await, Vec::<i64>::new());
    }

    #[tokio::test]
    async fn test_year_month_specs() {
        let source = items_source().await;
        let filter = YearMonthFilter::new(&ITEMS, "created_at");
        let query = ExactFilter::new(&ITEMS, "category")
            .exclude()
            .filter(Select::from_model(&ITEMS), &json!("C"));

        let specs = filter.specs(&source, query.clone()).await.unwrap();
        assert_eq!(
            specs,
            json!([
                {"value": "2024-02", "label": "2024-02-01"},
                {"value": "2024-01", "label": "2024-01-01"},
                {"value": "2023-03", "label": "2023-03-01"},
                {"value": "2023-01", "label": "2023-01-01"},
            ])
        );
        let bundle = filter.specs_columns("created");
        assert_eq!(bundled(&source, query.clone(), bundle).await, specs);

        let facets = filter.facets(&source, query.clone()).await.unwrap();
        let bundle = filter.facets_columns("created");
        assert_eq!(bundled(&source, query, bundle).await, facets);
        assert_eq!(facets.as_array().unwrap().len(), 4);
    }
}
