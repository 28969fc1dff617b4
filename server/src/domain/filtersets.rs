//! Admin filter sets, one per catalog entity

use futures::FutureExt;
use serde_json::Value;

use super::models::{
    MEASURE_CATEGORIES, MEASURE_VALUES, PRODUCT_CATEGORIES, PRODUCT_MODIFICATION_VALUES,
    PRODUCT_MODIFICATIONS, PRODUCTS, USERS,
};
use crate::data::error::DataError;
use crate::data::filters::values::{as_list, sorted_unique};
use crate::data::filters::{
    BooleanFilter, ChangedWithRelatedFilter, CheckboxFilter, ChoiceFilter, DatePartFilter,
    ExactFilter, FieldRef, FilterError, FilterSetBuilder, FilterSetDefinition, InFilter,
    LimitOffsetPagination, MethodFilter, NumberFilter, OrderingFilter, RangeFilter, SearchFilter,
    YearMonthFilter,
};
use crate::data::query::{BinaryOp, Expr, Model, Relation, Select};
use crate::data::source::DataSource;
use crate::data::sql::DatePart;

/// Builder pre-loaded with `id`, `ids`, `order` and `pagination`
pub fn admin_filters(model: &'static Model) -> FilterSetBuilder {
    FilterSetBuilder::new()
        .filter("id", ExactFilter::new(model, "id"))
        .filter("ids", InFilter::new(model, "id"))
        .filter("order", OrderingFilter::model_fields(model))
        .filter("pagination", LimitOffsetPagination)
}

const LINKED_FIELD: &str = "product_category_id";

/// The junction table behind `relation` and its category column
fn junction(model: &'static Model, relation: &str) -> Option<(&'static Relation, Expr)> {
    model
        .relation(relation)
        .map(|rel| (rel, rel.target.column(LINKED_FIELD)))
}

/// Distinct category ids linked to the rows of `query`
async fn linked_category_ids(
    model: &'static Model,
    relation: &'static str,
    source: &dyn DataSource,
    query: Select,
) -> Result<Value, DataError> {
    let Some((rel, column)) = junction(model, relation) else {
        return Ok(Value::Array(Vec::new()));
    };
    let query = query
        .join_relation(model, rel)
        .columns(vec![column.clone().label("value")])
        .and_where(column.is_not_null())
        .distinct();
    let values = source
        .execute(&query)
        .await?
        .into_iter()
        .map(|row| row.value("value"))
        .collect();
    Ok(Value::Array(sorted_unique(values, false)))
}

/// Rows linked to any of the given product categories through the junction
/// table behind `relation`
///
/// Specs and facets list the linked category ids.
fn linked_product_categories(model: &'static Model, relation: &'static str) -> MethodFilter {
    MethodFilter::new(move |query, value| match junction(model, relation) {
        Some((rel, column)) => query
            .join_relation(model, rel)
            .and_where(column.in_list(as_list(value))),
        None => query,
    })
    .with_specs(move |source, query| {
        linked_category_ids(model, relation, source, query).boxed()
    })
    .with_facets(move |source, query| {
        linked_category_ids(model, relation, source, query).boxed()
    })
    .with_references(vec![FieldRef::Related {
        model,
        relation,
        field: LINKED_FIELD,
    }])
}

pub fn products() -> Result<FilterSetDefinition, FilterError> {
    admin_filters(&PRODUCTS)
        .filter("name", SearchFilter::new(&PRODUCTS, &["name"]))
        .filter(
            "base_price",
            NumberFilter::new(&PRODUCTS, "base_price", BinaryOp::Eq),
        )
        .filter(
            "product_category_id",
            ExactFilter::new(&PRODUCTS, "product_category_id"),
        )
        .filter("created", YearMonthFilter::new(&PRODUCTS, "created_at"))
        .filter(
            "changed",
            ChangedWithRelatedFilter::new(&PRODUCTS, &[("category", true)]),
        )
        .build()
}

pub fn product_categories() -> Result<FilterSetDefinition, FilterError> {
    admin_filters(&PRODUCT_CATEGORIES)
        .filter("name", SearchFilter::new(&PRODUCT_CATEGORIES, &["name"]))
        .build()
}

pub fn product_modifications() -> Result<FilterSetDefinition, FilterError> {
    admin_filters(&PRODUCT_MODIFICATIONS)
        .filter("name", SearchFilter::new(&PRODUCT_MODIFICATIONS, &["name"]))
        .filter(
            "product_categories",
            linked_product_categories(&PRODUCT_MODIFICATIONS, "product_categories"),
        )
        .build()
}

pub fn product_modification_values() -> Result<FilterSetDefinition, FilterError> {
    admin_filters(&PRODUCT_MODIFICATION_VALUES)
        .filter(
            "name",
            SearchFilter::new(&PRODUCT_MODIFICATION_VALUES, &["name"]),
        )
        .filter("price", RangeFilter::new(&PRODUCT_MODIFICATION_VALUES, "price"))
        .filter(
            "modification_id",
            ExactFilter::new(&PRODUCT_MODIFICATION_VALUES, "modification_id"),
        )
        .build()
}

pub fn measure_categories() -> Result<FilterSetDefinition, FilterError> {
    admin_filters(&MEASURE_CATEGORIES)
        .filter("name", SearchFilter::new(&MEASURE_CATEGORIES, &["name"]))
        .filter(
            "product_categories",
            linked_product_categories(&MEASURE_CATEGORIES, "product_categories"),
        )
        .build()
}

pub fn measure_values() -> Result<FilterSetDefinition, FilterError> {
    admin_filters(&MEASURE_VALUES)
        .filter("name", SearchFilter::new(&MEASURE_VALUES, &["name"]))
        .filter("category_id", ExactFilter::new(&MEASURE_VALUES, "category_id"))
        .build()
}

pub fn users() -> Result<FilterSetDefinition, FilterError> {
    admin_filters(&USERS)
        .filter("email", SearchFilter::new(&USERS, &["email"]))
        .filter("phone", SearchFilter::new(&USERS, &["phone"]))
        .filter("is_active", BooleanFilter::new(&USERS, "is_active"))
        .filter("is_admin", CheckboxFilter::new(&USERS, "is_admin"))
        .filter(
            "birth_year",
            DatePartFilter::new(&USERS, "birth_date", DatePart::Year).multiple(),
        )
        .filter("birth_month", YearMonthFilter::new(&USERS, "birth_date"))
        .filter(
            "country",
            ChoiceFilter::new(&USERS, "country")
                .display("country")
                .multiple(),
        )
        .build()
}
