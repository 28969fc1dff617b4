//! Text choices labelled by a display column or a fixed choice list

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;

use super::base::{
    ColumnBundle, Facets, FacetsColumns, FieldRef, Filter, Specs, Target, distinct_values,
    target_options,
};
use super::schemas::Choice;
use super::values::{as_list, is_empty, parse_json_array, sorted_unique, value_key};
use crate::data::error::DataError;
use crate::data::query::{Expr, Model, Select};
use crate::data::source::DataSource;

/// Equality (or inclusion) over a column whose specs are `{value, label}`
/// pairs
///
/// Labels come either from another column of the same row (`display`) or
/// from a fixed choice list. Without either, specs and facets are `null`.
/// Facets can be bundled; specs always need their own query.
#[derive(Debug, Clone)]
pub struct ChoiceFilter {
    target: Target,
    display: Option<&'static str>,
    order_by: Option<&'static str>,
    choices: Option<Vec<Choice>>,
    multiple: bool,
}

impl ChoiceFilter {
    pub fn new(model: &'static Model, field: &'static str) -> Self {
        Self {
            target: Target::new(model, field),
            display: None,
            order_by: None,
            choices: None,
            multiple: false,
        }
    }

    /// Label each value with `field` of the same row
    pub fn display(mut self, field: &'static str) -> Self {
        self.display = Some(field);
        self
    }

    /// Order display specs by `field`; a leading `-` sorts descending
    pub fn order_by(mut self, field: &'static str) -> Self {
        self.order_by = Some(field);
        self
    }

    /// Label values from a fixed list, in list order
    pub fn choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = Some(choices);
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    fn is_labelled(&self) -> bool {
        self.display.is_some() || self.choices.is_some()
    }

    fn order_field(&self) -> (&'static str, bool) {
        match self.order_by {
            Some(field) => match field.strip_prefix('-') {
                Some(field) => (field, true),
                None => (field, false),
            },
            None => (self.target.field, false),
        }
    }

    async fn display_specs(
        &self,
        source: &dyn DataSource,
        query: Select,
        display: &'static str,
    ) -> Result<Value, DataError> {
        let model = self.target.model;
        let (order_field, descending) = self.order_field();

        let choices = query
            .columns(vec![
                self.target.column().label("value"),
                model.column(display).label("label"),
                model.column(order_field).label("order_by"),
            ])
            .subquery("c")
            .columns(vec![
                Expr::column("c", "value").cast_text().label("value"),
                Expr::column("c", "label").cast_text().label("label"),
                Expr::column("c", "order_by").cast_text().label("order_by"),
            ])
            .and_where(Expr::column("c", "value").is_not_null())
            .distinct()
            .order_by(Expr::ident("order_by"), descending);

        let mut seen = HashSet::new();
        let specs = source
            .execute(&choices)
            .await?
            .into_iter()
            .filter(|row| !is_empty(&row.value("label")))
            .filter(|row| seen.insert(value_key(&row.value("value"))))
            .map(|row| Choice::new(row.value("value"), row.value("label")).to_value())
            .collect();
        Ok(Value::Array(specs))
    }

    async fn present_values(
        &self,
        source: &dyn DataSource,
        query: Select,
    ) -> Result<Vec<Value>, DataError> {
        distinct_values(source, query, self.target.column().cast_text(), false).await
    }
}

impl Filter for ChoiceFilter {
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
        let mut refs = self.target.references();
        let model = self.target.model;
        for field in [self.display, self.order_by.map(|_| self.order_field().0)]
            .into_iter()
            .flatten()
        {
            refs.push(FieldRef::Column { model, field });
        }
        refs
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
impl Specs for ChoiceFilter {
    async fn specs(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError> {
        if let Some(display) = self.display {
            return self.display_specs(source, query, display).await;
        }
        let Some(choices) = &self.choices else {
            return Ok(Value::Null);
        };

        let present: HashSet<String> = self
            .present_values(source, query)
            .await?
            .iter()
            .map(value_key)
            .collect();
        let specs = choices
            .iter()
            .filter(|choice| present.contains(&value_key(&choice.value)))
            .map(Choice::to_value)
            .collect();
        Ok(Value::Array(specs))
    }
}

#[async_trait]
impl Facets for ChoiceFilter {
    async fn facets(&self, source: &dyn DataSource, query: Select) -> Result<Value, DataError> {
        if !self.is_labelled() {
            return Ok(Value::Null);
        }
        Ok(Value::Array(self.present_values(source, query).await?))
    }
}

impl FacetsColumns for ChoiceFilter {
    fn facets_columns(&self, name: &str) -> ColumnBundle {
        if !self.is_labelled() {
            // Aggregate so the shared query still yields exactly one row
            return ColumnBundle::single(name, Expr::raw("NULL").count(), |_, _| Ok(Value::Null));
        }
        ColumnBundle::single(
            name,
            self.target.column().cast_text().json_array_agg(),
            |alias, raw| {
                let values = sorted_unique(parse_json_array(raw, alias)?, false);
                Ok(Value::Array(values))
            },
        )
    }
}

target_options!(ChoiceFilter);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::data::filters::field::RangeFilter;
    use crate::data::filters::testing::{ITEMS, bundled, ids, items_source};

    #[tokio::test]
    async fn test_filter_single_and_multiple() {
        let source = items_source().await;
        let query = ChoiceFilter::new(&ITEMS, "category")
            .filter(Select::from_model(&ITEMS), &json!("B"));
        assert_eq!(ids(&source.execute(&query).await.unwrap()), vec![3, 4]);

        let query = ChoiceFilter::new(&ITEMS, "category")
            .multiple()
            .filter(Select::from_model(&ITEMS), &json!(["A", "B"]))
            .order_by(ITEMS.column("id"), false);
        assert_eq!(ids(&source.execute(&query).await.unwrap()), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_display_specs_ordered() {
        let source = items_source().await;
        let filter = ChoiceFilter::new(&ITEMS, "id")
            .display("name")
            .order_by("-price");
        let query = RangeFilter::new(&ITEMS, "price")
            .filter(Select::from_model(&ITEMS), &json!([null, 30]));

        let specs = filter.specs(&source, query).await.unwrap();
        assert_eq!(
            specs,
            json!([
                {"value": "3", "label": "Gamma"},
                {"value": "2", "label": "beta"},
                {"value": "1", "label": "Alpha"},
            ])
        );
    }

    #[tokio::test]
    async fn test_display_specs_drop_missing_labels() {
        let source = items_source().await;
        let filter = ChoiceFilter::new(&ITEMS, "id").display("rating");
        let specs = filter
            .specs(&source, Select::from_model(&ITEMS))
            .await
            .unwrap();
        let values: Vec<&Value> = specs
            .as_array()
            .unwrap()
            .iter()
            .map(|c| &c["value"])
            .collect();
        assert_eq!(values, vec![&json!("1"), &json!("3"), &json!("5")]);
    }

    #[tokio::test]
    async fn test_choice_list_specs_keep_list_order() {
        let source = items_source().await;
        let filter = ChoiceFilter::new(&ITEMS, "category").choices(vec![
            Choice::new("C", "Cars"),
            Choice::new("B", "Books"),
            Choice::new("A", "Apparel"),
            Choice::new("Z", "Zoo"),
        ]);
        let specs = filter
            .specs(&source, Select::from_model(&ITEMS))
            .await
            .unwrap();
        assert_eq!(
            specs,
            json!([
                {"value": "C", "label": "Cars"},
                {"value": "B", "label": "Books"},
                {"value": "A", "label": "Apparel"},
            ])
        );
    }

    #[tokio::test]
    async fn test_unlabelled_is_null() {
        let source = items_source().await;
        let filter = ChoiceFilter::new(&ITEMS, "category");
        let query = Select::from_model(&ITEMS);
        assert_eq!(filter.specs(&source, query.clone()).await.unwrap(), Value::Null);
        assert_eq!(filter.facets(&source, query.clone()).await.unwrap(), Value::Null);
        assert_eq!(
            bundled(&source, query, filter.facets_columns("category")).await,
            Value::Null
        );
    }

    #[tokio::test]
    async fn test_facets_bundle_matches_dedicated() {
        let source = items_source().await;
        let filter = ChoiceFilter::new(&ITEMS, "price").display("name");
        let query = Select::from_model(&ITEMS);

        let dedicated = filter.facets(&source, query.clone()).await.unwrap();
        assert_eq!(dedicated.as_array().unwrap().len(), 5);
        let bundle = filter.facets_columns("price");
        assert_eq!(bundled(&source, query, bundle).await, dedicated);
    }
}
