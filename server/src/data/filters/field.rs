//! Single-column value filters: exact, inclusion, enumeration, comparison
//! and range

use async_trait::async_trait;
use serde_json::Value;

use super::base::{
    ColumnBundle, Facets, FacetsColumns, FieldRef, Filter, Specs, SpecsColumns, Target,
    distinct_values, min_max, min_max_bundle, target_options, value_counts,
};
use super::schemas::{Choice, Choices, RangeSchema};
use super::values::{as_list, as_range, coerce_number, parse_json_array, sorted_unique, value_key};
use crate::data::error::DataError;
use crate::data::query::{BinaryOp, Expr, Model, Select};
use crate::data::source::DataSource;

/// `column = value`
///
/// Specs list the distinct values present; facets count rows per value.
#[derive(Debug, Clone)]
pub struct ExactFilter {
    target: Target,
}

impl ExactFilter {
    pub fn new(model: &'static Model, field: &'static str) -> Self {
        Self {
            target: Target::new(model, field),
        }
    }
}

impl Filter for ExactFilter {
    fn filter(&self, query: Select, value: &Value) -> Select {
        self.target
            .filter_with(query, value, |column, value| Some(column.eq(value.clone())))
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
}

#[async_trait]
impl Specs for ExactFilter {
    async fn specs(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError> {
        let values = distinct_values(source, query, self.target.column(), false).await?;
        Ok(Value::Array(values))
    }
}

#[async_trait]
impl Facets for ExactFilter {
    async fn facets(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError> {
        value_counts(source, query, self.target.column()).await
    }
}

/// `column IN (values)`; a scalar parameter is treated as a one-element list
#[derive(Debug, Clone)]
pub struct InFilter {
    target: Target,
}

impl InFilter {
    pub fn new(model: &'static Model, field: &'static str) -> Self {
        Self {
            target: Target::new(model, field),
        }
    }
}

impl Filter for InFilter {
    fn filter(&self, query: Select, value: &Value) -> Select {
        self.target
            .filter_with(query, value, |column, value| Some(column.in_list(as_list(value))))
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
}

#[async_trait]
impl Specs for InFilter {
    async fn specs(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError> {
        let values = distinct_values(source, query, self.target.column(), false).await?;
        Ok(Value::Array(values))
    }
}

#[async_trait]
impl Facets for InFilter {
    async fn facets(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError> {
        value_counts(source, query, self.target.column()).await
    }
}

/// Equality (or inclusion) over a column holding one of a fixed set of values
///
/// Specs pair each present value with its label; facets list the present
/// values. Both are also available as bundled columns.
#[derive(Debug, Clone)]
pub struct EnumFilter {
    target: Target,
    choices: Vec<Choice>,
    multiple: bool,
}

impl EnumFilter {
    pub fn new(model: &'static Model, field: &'static str, choices: Vec<Choice>) -> Self {
        Self {
            target: Target::new(model, field),
            choices,
            multiple: false,
        }
    }

    /// Choices taken from a [`Choices`] implementation
    pub fn of<C: Choices>(model: &'static Model, field: &'static str) -> Self {
        Self::new(model, field, C::choices())
    }

    /// Accept a list of values and match any of them
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    fn label(&self, value: Value) -> Value {
        let key = value_key(&value);
        self.choices
            .iter()
            .find(|choice| choice.value == value || value_key(&choice.value) == key)
            .map(Choice::to_value)
            .unwrap_or_else(|| Choice::new(value, key).to_value())
    }

    fn labelled(&self, values: Vec<Value>) -> Value {
        Value::Array(values.into_iter().map(|v| self.label(v)).collect())
    }
}

impl Filter for EnumFilter {
    fn filter(&self, query: Select, value: &Value) -> Select {
        let multiple = self.multiple;
        self.target.filter_with(query, value, |column, value| {
            Some(if multiple {
                column.in_list(as_list(value))
            } else {
                column.eq(value.clone())
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
impl Specs for EnumFilter {
    async fn specs(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError> {
        let values = distinct_values(source, query, self.target.column(), false).await?;
        Ok(self.labelled(values))
    }
}

#[async_trait]
impl Facets for EnumFilter {
    async fn facets(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError> {
        let values = distinct_values(source, query, self.target.column(), false).await?;
        Ok(Value::Array(values))
    }
}

impl SpecsColumns for EnumFilter {
    fn specs_columns(&self, name: &str) -> ColumnBundle {
        let filter = self.clone();
        ColumnBundle::single(
            name,
            self.target.column().json_array_agg(),
            move |alias, raw| {
                let values = sorted_unique(parse_json_array(raw, alias)?, false);
                Ok(filter.labelled(values))
            },
        )
    }
}

impl FacetsColumns for EnumFilter {
    fn facets_columns(&self, name: &str) -> ColumnBundle {
        ColumnBundle::single(
            name,
            self.target.column().json_array_agg(),
            |alias, raw| {
                let values = sorted_unique(parse_json_array(raw, alias)?, false);
                Ok(Value::Array(values))
            },
        )
    }
}

/// `column <op> value` with a configurable comparison operator
///
/// Specs and facets report the column's `{min, max}`.
#[derive(Debug, Clone)]
pub struct NumberFilter {
    target: Target,
    op: BinaryOp,
    schema: RangeSchema,
}

impl NumberFilter {
    pub fn new(model: &'static Model, field: &'static str, op: BinaryOp) -> Self {
        Self {
            target: Target::new(model, field),
            op,
            schema: RangeSchema::Number,
        }
    }
}

impl Filter for NumberFilter {
    fn filter(&self, query: Select, value: &Value) -> Select {
        let (op, nullable) = (self.op, self.target.nullable);
        self.target.filter_with(query, value, |column, value| {
            let predicate = column.clone().compare(op, coerce_number(value.clone()));
            Some(if nullable {
                Expr::or(vec![predicate, column.is_null()])
            } else {
                predicate
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
impl Specs for NumberFilter {
    async fn specs(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError> {
        min_max(source, query, self.target.column(), self.schema, self.target.field).await
    }
}

#[async_trait]
impl Facets for NumberFilter {
    async fn facets(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError> {
        min_max(source, query, self.target.column(), self.schema, self.target.field).await
    }
}

impl SpecsColumns for NumberFilter {
    fn specs_columns(&self, name: &str) -> ColumnBundle {
        min_max_bundle(name, self.target.column(), self.schema)
    }
}

impl FacetsColumns for NumberFilter {
    fn facets_columns(&self, name: &str) -> ColumnBundle {
        min_max_bundle(name, self.target.column(), self.schema)
    }
}

/// `min <= column <= max` with either bound optional
///
/// The parameter is `[min, max]` or `{"min": .., "max": ..}`.
#[derive(Debug, Clone)]
pub struct RangeFilter {
    target: Target,
    schema: RangeSchema,
}

impl RangeFilter {
    pub fn new(model: &'static Model, field: &'static str) -> Self {
        Self {
            target: Target::new(model, field),
            schema: RangeSchema::Number,
        }
    }

    /// Report min/max as timestamps instead of numbers
    pub fn datetime(mut self) -> Self {
        self.schema = RangeSchema::Datetime;
        self
    }

    fn bound(&self, value: Value) -> Value {
        match self.schema {
            RangeSchema::Number => coerce_number(value),
            RangeSchema::Datetime => value,
        }
    }
}

impl Filter for RangeFilter {
    fn filter(&self, query: Select, value: &Value) -> Select {
        self.target.filter_with(query, value, |column, value| {
            let (min, max) = as_range(value);
            let mut bounds = Vec::new();
            if let Some(min) = min {
                bounds.push(column.clone().gte(self.bound(min)));
            }
            if let Some(max) = max {
                bounds.push(column.clone().lte(self.bound(max)));
            }
            if bounds.is_empty() {
                return None;
            }

            let predicate = Expr::and(bounds);
            Some(if self.target.nullable {
                Expr::or(vec![predicate, column.is_null()])
            } else {
                predicate
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
impl Specs for RangeFilter {
    async fn specs(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError> {
        min_max(source, query, self.target.column(), self.schema, self.target.field).await
    }
}

#[async_trait]
impl Facets for RangeFilter {
    async fn facets(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError> {
        min_max(source, query, self.target.column(), self.schema, self.target.field).await
    }
}

impl SpecsColumns for RangeFilter {
    fn specs_columns(&self, name: &str) -> ColumnBundle {
        min_max_bundle(name, self.target.column(), self.schema)
    }
}

impl FacetsColumns for RangeFilter {
    fn facets_columns(&self, name: &str) -> ColumnBundle {
        min_max_bundle(name, self.target.column(), self.schema)
    }
}

target_options!(ExactFilter, InFilter, EnumFilter, NumberFilter, RangeFilter);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::data::filters::testing::{GROUPS, ITEMS, bundled, ids, items_source};

    async fn run(source: &dyn DataSource, filter: &dyn Filter, value: Value) -> Vec<i64> {
        let query = filter
            .filter(Select::from_model(&ITEMS), &value)
            .order_by(ITEMS.column("id"), false);
        ids(&source.execute(&query).await.unwrap())
    }

    fn category_choices() -> Vec<Choice> {
        vec![
            Choice::new("A", "Apparel"),
            Choice::new("B", "Books"),
            Choice::new("C", "Cars"),
        ]
    }

    #[tokio::test]
    async fn test_exact_filter() {
        let source = items_source().await;
        let filter = ExactFilter::new(&ITEMS, "category");
        assert_eq!(run(&source, &filter, json!("A")).await, vec![1, 2]);
        assert_eq!(run(&source, &filter, json!("Z")).await, Vec::<i64>::new());
    }

    #[tokio::test]
    async fn test_empty_value_is_noop() {
        let source = items_source().await;
        let filters: Vec<Box<dyn Filter>> = vec![
            Box::new(ExactFilter::new(&ITEMS, "category")),
            Box::new(InFilter::new(&ITEMS, "category")),
            Box::new(EnumFilter::new(&ITEMS, "category", category_choices())),
            Box::new(NumberFilter::new(&ITEMS, "price", BinaryOp::Lte)),
            Box::new(RangeFilter::new(&ITEMS, "price")),
        ];
        for filter in &filters {
            for empty in [json!(null), json!(""), json!([])] {
                assert_eq!(
                    run(&source, filter.as_ref(), empty).await,
                    vec![1, 2, 3, 4, 5],
                    "{:?}",
                    filter
                );
            }
        }
    }

    #[tokio::test]
    async fn test_exclude_is_complement() {
        let source = items_source().await;
        let cases: Vec<(Box<dyn Filter>, Box<dyn Filter>, Value)> = vec![
            (
                Box::new(ExactFilter::new(&ITEMS, "category")),
                Box::new(ExactFilter::new(&ITEMS, "category").exclude()),
                json!("A"),
            ),
            (
                Box::new(InFilter::new(&ITEMS, "category")),
                Box::new(InFilter::new(&ITEMS, "category").exclude()),
                json!(["A", "C"]),
            ),
            (
                Box::new(RangeFilter::new(&ITEMS, "rating")),
                Box::new(RangeFilter::new(&ITEMS, "rating").exclude()),
                json!([4, null]),
            ),
            (
                Box::new(NumberFilter::new(&ITEMS, "rating", BinaryOp::Lt)),
                Box::new(NumberFilter::new(&ITEMS, "rating", BinaryOp::Lt).exclude()),
                json!(4.6),
            ),
        ];

        for (include, exclude, value) in cases {
            let mut kept = run(&source, include.as_ref(), value.clone()).await;
            let dropped = run(&source, exclude.as_ref(), value).await;
            assert!(kept.iter().all(|id| !dropped.contains(id)));
            kept.extend(dropped);
            kept.sort();
            assert_eq!(kept, vec![1, 2, 3, 4, 5]);
        }
    }

    #[tokio::test]
    async fn test_nullable_empty_matches_null() {
        let source = items_source().await;
        let filter = ExactFilter::new(&ITEMS, "rating").nullable();
        assert_eq!(run(&source, &filter, json!(null)).await, vec![2, 4]);
        assert_eq!(run(&source, &filter, json!(3.0)).await, vec![3]);
    }

    #[tokio::test]
    async fn test_in_filter_accepts_scalar() {
        let source = items_source().await;
        let filter = InFilter::new(&ITEMS, "id");
        assert_eq!(run(&source, &filter, json!([5, 1])).await, vec![1, 5]);
        assert_eq!(run(&source, &filter, json!(3)).await, vec![3]);
    }

    #[tokio::test]
    async fn test_range_upper_bound_only() {
        let source = items_source().await;
        let filter = RangeFilter::new(&ITEMS, "rating");
        assert_eq!(run(&source, &filter, json!([null, 4.5])).await, vec![1, 3]);
        assert_eq!(
            run(&source, &filter, json!({"max": "4.5"})).await,
            vec![1, 3]
        );

        let nullable = RangeFilter::new(&ITEMS, "rating").nullable();
        assert_eq!(
            run(&source, &nullable, json!([null, 4.5])).await,
            vec![1, 2, 3, 4]
        );
    }

    #[tokio::test]
    async fn test_range_both_bounds() {
        let source = items_source().await;
        let filter = RangeFilter::new(&ITEMS, "price");
        assert_eq!(run(&source, &filter, json!([20, 40])).await, vec![2, 3, 4]);
        assert_eq!(run(&source, &filter, json!([null, null])).await, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_datetime_range() {
        let source = items_source().await;
        let filter = RangeFilter::new(&ITEMS, "created_at").datetime();
        assert_eq!(
            run(&source, &filter, json!(["2024-01-01T00:00:00Z", null])).await,
            vec![3, 4, 5]
        );

        let specs = filter
            .specs(&source, Select::from_model(&ITEMS))
            .await
            .unwrap();
        assert_eq!(
            specs,
            json!({"min": "2023-01-15T10:00:00Z", "max": "2024-02-29T10:00:00Z"})
        );
    }

    #[tokio::test]
    async fn test_number_filter_operators() {
        let source = items_source().await;
        let lte = NumberFilter::new(&ITEMS, "price", BinaryOp::Lte);
        assert_eq!(run(&source, &lte, json!(10)).await, vec![1]);
        let gt = NumberFilter::new(&ITEMS, "price", BinaryOp::Gt);
        assert_eq!(run(&source, &gt, json!("30")).await, vec![4, 5]);
        let nullable = NumberFilter::new(&ITEMS, "rating", BinaryOp::Gte).nullable();
        assert_eq!(run(&source, &nullable, json!(4.5)).await, vec![1, 2, 4, 5]);
    }

    #[tokio::test]
    async fn test_exact_specs_and_facets() {
        let source = items_source().await;
        let filter = ExactFilter::new(&ITEMS, "category");
        let query = Select::from_model(&ITEMS);

        let specs = filter.specs(&source, query.clone()).await.unwrap();
        assert_eq!(specs, json!(["A", "B", "C"]));

        let facets = filter.facets(&source, query).await.unwrap();
        assert_eq!(facets, json!({"A": 2, "B": 2, "C": 1}));
    }

    #[tokio::test]
    async fn test_facets_count_distinct_rows_once() {
        let source = items_source().await;
        let filter = ExactFilter::new(&GROUPS, "name");
        // Each group joins two items
        let joined = Select::from_model(&GROUPS).join(
            "items",
            ITEMS.column("group_id").eq_expr(GROUPS.column("id")),
        );

        let facets = filter.facets(&source, joined.clone()).await.unwrap();
        assert_eq!(facets, json!({"Tools": 2, "Toys": 2}));

        let facets = filter.facets(&source, joined.distinct()).await.unwrap();
        assert_eq!(facets, json!({"Tools": 1, "Toys": 1}));
    }

    #[tokio::test]
    async fn test_range_bundle_matches_dedicated() {
        let source = items_source().await;
        let filter = RangeFilter::new(&ITEMS, "price");
        let query = ExactFilter::new(&ITEMS, "category")
            .filter(Select::from_model(&ITEMS), &json!("B"));

        let dedicated = filter.specs(&source, query.clone()).await.unwrap();
        assert_eq!(dedicated, json!({"min": 30.0, "max": 40.0}));

        let bundle = filter.specs_columns("price");
        assert_eq!(bundled(&source, query.clone(), bundle).await, dedicated);
        let bundle = filter.facets_columns("price");
        assert_eq!(bundled(&source, query, bundle).await, dedicated);
    }

    #[tokio::test]
    async fn test_range_specs_over_empty_set() {
        let source = items_source().await;
        let filter = NumberFilter::new(&ITEMS, "price", BinaryOp::Eq);
        let query = filter.filter(Select::from_model(&ITEMS), &json!(1000));

        let dedicated = filter.specs(&source, query.clone()).await.unwrap();
        assert_eq!(dedicated, json!({"min": null, "max": null}));
        let bundle = filter.specs_columns("price");
        assert_eq!(bundled(&source, query, bundle).await, dedicated);
    }

    #[tokio::test]
    async fn test_enum_specs_labels() {
        let source = items_source().await;
        let filter = EnumFilter::new(&ITEMS, "category", category_choices());
        let query = RangeFilter::new(&ITEMS, "price")
            .filter(Select::from_model(&ITEMS), &json!([25, null]));

        let specs = filter.specs(&source, query.clone()).await.unwrap();
        assert_eq!(
            specs,
            json!([
                {"value": "B", "label": "Books"},
                {"value": "C", "label": "Cars"},
            ])
        );
        let bundle = filter.specs_columns("category");
        assert_eq!(bundled(&source, query.clone(), bundle).await, specs);

        let facets = filter.facets(&source, query.clone()).await.unwrap();
        assert_eq!(facets, json!(["B", "C"]));
        let bundle = filter.facets_columns("category");
        assert_eq!(bundled(&source, query, bundle).await, facets);
    }

    #[tokio::test]
    async fn test_enum_multiple_and_unknown_label() {
        let source = items_source().await;
        let filter = EnumFilter::new(&ITEMS, "category", vec![Choice::new("A", "Apparel")]).multiple();
        assert_eq!(run(&source, &filter, json!(["A", "C"])).await, vec![1, 2, 5]);

        let specs = filter
            .specs(&source, Select::from_model(&ITEMS))
            .await
            .unwrap();
        assert_eq!(specs[2], json!({"value": "C", "label": "C"}));
    }

    struct Sizes;

    impl Choices for Sizes {
        fn choices() -> Vec<Choice> {
            vec![Choice::new("A", "Small"), Choice::new("B", "Large")]
        }
    }

    #[test]
    fn test_enum_from_choices() {
        let filter = EnumFilter::of::<Sizes>(&ITEMS, "category");
        assert_eq!(filter.label(json!("B")), json!({"value": "B", "label": "Large"}));
    }
}
