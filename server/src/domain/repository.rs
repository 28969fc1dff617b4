//! Generic admin repository over one catalog entity

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::data::error::DataError;
use crate::data::filters::{FilterSet, FilterSetDefinition, FilterSettings, with_default_ordering};
use crate::data::query::{Model, Select};
use crate::data::source::{DataSource, Row};

/// Sort direction of an admin list request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// List query as sent by admin frontends (`_sort`, `_order`, `_start`, `_end`)
///
/// Translated into the shared admin filter parameters by [`AdminQuery::into_params`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AdminQuery {
    #[serde(default)]
    pub id: Option<Vec<Value>>,
    #[serde(rename = "_sort", default)]
    pub sort: Option<String>,
    #[serde(rename = "_order", default)]
    pub order: SortOrder,
    #[serde(rename = "_start", default)]
    pub start: u64,
    #[serde(rename = "_end", default = "default_end")]
    pub end: u64,
}

fn default_end() -> u64 {
    10
}

impl Default for AdminQuery {
    fn default() -> Self {
        Self {
            id: None,
            sort: None,
            order: SortOrder::Asc,
            start: 0,
            end: default_end(),
        }
    }
}

impl AdminQuery {
    /// `ids`, `order` and `pagination` parameters for the admin filters
    pub fn into_params(self) -> Map<String, Value> {
        let mut params = Map::new();
        if let Some(ids) = self.id {
            params.insert("ids".to_string(), Value::Array(ids));
        }
        if let Some(sort) = self.sort {
            let key = match self.order {
                SortOrder::Asc => sort,
                SortOrder::Desc => format!("-{}", sort),
            };
            params.insert("order".to_string(), Value::from(vec![key]));
        }
        let limit = self.end.saturating_sub(self.start);
        params.insert(
            "pagination".to_string(),
            Value::from(vec![self.start, limit]),
        );
        params
    }
}

/// Listing, lookup and aggregation over one model
///
/// Every call builds a fresh [`FilterSet`] over `SELECT <model columns>`.
pub struct AdminRepository {
    model: &'static Model,
    definition: Arc<FilterSetDefinition>,
    source: Arc<dyn DataSource>,
    settings: FilterSettings,
}

impl AdminRepository {
    pub fn new(
        model: &'static Model,
        definition: Arc<FilterSetDefinition>,
        source: Arc<dyn DataSource>,
    ) -> Self {
        Self {
            model,
            definition,
            source,
            settings: FilterSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: FilterSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn model(&self) -> &'static Model {
        self.model
    }

    pub fn definition(&self) -> &FilterSetDefinition {
        &self.definition
    }

    fn query(&self) -> Select {
        Select::from_model(self.model)
    }

    fn filter_set(&self, params: Map<String, Value>) -> FilterSet<'_> {
        FilterSet::new(&self.definition, self.source.as_ref(), params, self.query())
            .with_settings(self.settings)
    }

    /// Filtered rows, ordered by the requested keys with `id` as tie-breaker
    pub async fn list(&self, mut params: Map<String, Value>) -> Result<Vec<Row>, DataError> {
        let requested = match params.remove("order") {
            Some(Value::Array(keys)) => Some(
                keys.into_iter()
                    .filter_map(|key| key.as_str().map(str::to_string))
                    .collect(),
            ),
            Some(Value::String(key)) => Some(vec![key]),
            _ => None,
        };
        params.insert(
            "order".to_string(),
            Value::from(with_default_ordering(requested)),
        );

        let rows = self.filter_set(params).filter().await?;
        tracing::debug!(table = self.model.table, rows = rows.len(), "Listed rows");
        Ok(rows)
    }

    pub async fn first(&self, params: Map<String, Value>) -> Result<Option<Row>, DataError> {
        Ok(self.filter_set(params).filter().await?.into_iter().next())
    }

    /// The single row matching `params`
    pub async fn retrieve(&self, params: Map<String, Value>) -> Result<Row, DataError> {
        let id = params
            .get("id")
            .map(|id| match id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_default();
        self.first(params)
            .await?
            .ok_or_else(|| DataError::not_found(self.model.table, id))
    }

    pub async fn count(&self, params: Map<String, Value>) -> Result<i64, DataError> {
        self.filter_set(params).count("id", false, true).await
    }

    pub async fn specs(
        &self,
        params: Map<String, Value>,
        excluded: &[&str],
    ) -> Result<Map<String, Value>, DataError> {
        self.filter_set(params).specs(excluded).await
    }

    pub async fn facets(
        &self,
        params: Map<String, Value>,
        excluded: &[&str],
    ) -> Result<Map<String, Value>, DataError> {
        self.filter_set(params).facets(excluded).await
    }
}
