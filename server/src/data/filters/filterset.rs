//! Named filter collections bound to a base query
//!
//! A [`FilterSetDefinition`] is built and validated once at startup. For each
//! request a [`FilterSet`] pairs it with the request parameters, a base query
//! and a data source, and runs listing, counting and the specs/facets
//! aggregation.
//!
//! Specs and facets are computed two ways. Filters that can express their
//! answer as aggregate columns, and whose parameter is not active, are
//! bundled into one shared query over the filtered rows. Everything else
//! runs a dedicated query. All queries run concurrently up to
//! `max_concurrency` at a time and the first failure aborts the call.

use std::collections::{HashMap, HashSet};
use std::fmt;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value};

use super::base::{ColumnBundle, FieldRef, Filter};
use super::error::FilterError;
use crate::core::constants::{DEFAULT_MAX_CONCURRENCY, FACETS_COUNT_COLUMN};
use crate::data::error::DataError;
use crate::data::query::{Expr, Select};
use crate::data::source::{DataSource, Row};
use crate::utils::concurrency::gather_with_concurrency;

type NamedFilter = (String, Box<dyn Filter>);

/// Collects named filters in registration order
#[derive(Default)]
pub struct FilterSetBuilder {
    filters: Vec<NamedFilter>,
}

impl FilterSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `filter` under the request parameter `name`
    pub fn filter(mut self, name: impl Into<String>, filter: impl Filter + 'static) -> Self {
        self.filters.push((name.into(), Box::new(filter)));
        self
    }

    /// Validate names and model references
    pub fn build(self) -> Result<FilterSetDefinition, FilterError> {
        validate(&self.filters)?;
        Ok(FilterSetDefinition {
            filters: self.filters,
        })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate(filters: &[NamedFilter]) -> Result<(), FilterError> {
    let mut seen = HashSet::new();
    for (name, _) in filters {
        // Names double as column labels in the bundled query
        if !is_identifier(name) || name == FACETS_COUNT_COLUMN {
            return Err(FilterError::InvalidName(name.clone()));
        }
        if !seen.insert(name.as_str()) {
            return Err(FilterError::DuplicateName(name.clone()));
        }
    }
    check_bundle_labels(filters, |filter, name| {
        filter.as_specs_columns().map(|c| c.specs_columns(name))
    })?;
    check_bundle_labels(filters, |filter, name| {
        filter.as_facets_columns().map(|c| c.facets_columns(name))
    })?;

    let mut undefined = Vec::new();
    for reference in filters.iter().flat_map(|(_, filter)| filter.references()) {
        match reference {
            FieldRef::Column { model, field } => {
                if !model.has_field(field) {
                    undefined.push(field.to_string());
                }
            }
            FieldRef::Related {
                model,
                relation,
                field,
            } => {
                let target = model
                    .relation(relation)
                    .ok_or(FilterError::UndefinedRelation {
                        table: model.table,
                        relation,
                    })?
                    .target;
                if !target.has_field(field) {
                    undefined.push(field.to_string());
                }
            }
        }
    }

    if undefined.is_empty() {
        Ok(())
    } else {
        Err(FilterError::UndefinedFields(undefined))
    }
}

/// Every label of one shared aggregate query must be distinct, since result
/// rows are keyed by column label
fn check_bundle_labels(
    filters: &[NamedFilter],
    bundle: impl Fn(&dyn Filter, &str) -> Option<ColumnBundle>,
) -> Result<(), FilterError> {
    let mut owners: HashMap<String, &str> = HashMap::new();
    owners.insert(FACETS_COUNT_COLUMN.to_string(), FACETS_COUNT_COLUMN);
    for (name, filter) in filters {
        let Some(bundle) = bundle(filter.as_ref(), name.as_str()) else {
            continue;
        };
        for label in bundle.labels() {
            if let Some(first) = owners.get(label) {
                return Err(FilterError::LabelCollision {
                    label: label.to_string(),
                    first: first.to_string(),
                    second: name.clone(),
                });
            }
            owners.insert(label.to_string(), name.as_str());
        }
    }
    Ok(())
}

/// Validated, immutable set of named filters
pub struct FilterSetDefinition {
    filters: Vec<NamedFilter>,
}

impl FilterSetDefinition {
    pub fn builder() -> FilterSetBuilder {
        FilterSetBuilder::new()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Filter> {
        self.filters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, filter)| filter.as_ref())
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &dyn Filter)> {
        self.filters
            .iter()
            .map(|(name, filter)| (name.as_str(), filter.as_ref()))
    }
}

impl fmt::Debug for FilterSetDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.filters.iter().map(|(n, f)| (n, f))).finish()
    }
}

/// Engine tuning shared by every filter set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSettings {
    /// Bundle eligible specs/facets into one query
    pub optimization: bool,
    /// Upper bound on aggregate queries in flight per call
    pub max_concurrency: usize,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            optimization: true,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Aggregate {
    Specs,
    Facets,
}

impl Aggregate {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Specs => "specs",
            Self::Facets => "facets",
        }
    }
}

type Task<'f> = BoxFuture<'f, Result<Vec<(String, Value)>, DataError>>;

/// Aggregates must see every filtered row in any order
fn aggregate_base(query: Select) -> Select {
    query.clear_order_by().clear_pagination()
}

/// One request's view of a filter set
pub struct FilterSet<'a> {
    definition: &'a FilterSetDefinition,
    source: &'a dyn DataSource,
    params: Map<String, Value>,
    base_query: Select,
    settings: FilterSettings,
}

impl<'a> FilterSet<'a> {
    pub fn new(
        definition: &'a FilterSetDefinition,
        source: &'a dyn DataSource,
        params: Map<String, Value>,
        base_query: Select,
    ) -> Self {
        Self {
            definition,
            source,
            params,
            base_query,
            settings: FilterSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: FilterSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Bundling is off when requested, or when the base query de-duplicates
    /// rows: aggregates over a DISTINCT row set differ from per-filter ones
    pub fn optimization_enabled(&self) -> bool {
        self.settings.optimization && !self.base_query.is_distinct()
    }

    /// Base query narrowed by every filter whose parameter is present
    pub fn filter_query(&self) -> Select {
        self.build_query(None)
    }

    /// Like [`filter_query`](Self::filter_query) but ignoring one filter
    pub fn filter_query_without(&self, name: &str) -> Select {
        self.build_query(Some(name))
    }

    fn build_query(&self, skip: Option<&str>) -> Select {
        self.definition
            .iter()
            .filter(|(name, _)| Some(*name) != skip)
            .fold(self.base_query.clone(), |query, (name, filter)| {
                match self.params.get(name) {
                    Some(value) => filter.filter(query, value),
                    None => query,
                }
            })
    }

    pub async fn filter(&self) -> Result<Vec<Row>, DataError> {
        self.source.execute(&self.filter_query()).await
    }

    /// Number of filtered rows, counting `id_attr` of the filtered query
    ///
    /// Ordering is always dropped; pagination only when `exclude_pagination`.
    pub async fn count(
        &self,
        id_attr: &str,
        distinct: bool,
        exclude_pagination: bool,
    ) -> Result<i64, DataError> {
        let mut query = self.filter_query().clear_order_by();
        if exclude_pagination {
            query = query.clear_pagination();
        }

        let id = Expr::column("s", id_attr);
        let counted = if distinct { id.count_distinct() } else { id.count() };
        let query = query.subquery("s").columns(vec![counted.label("count")]);

        let value = self.source.execute_scalar(&query).await?;
        value
            .as_i64()
            .ok_or_else(|| DataError::decode("count", format!("{} is not an integer", value)))
    }

    /// Selectable values per filter within the filtered rows
    pub async fn specs(&self, excluded: &[&str]) -> Result<Map<String, Value>, DataError> {
        self.aggregate(Aggregate::Specs, excluded).await
    }

    /// Per-filter results with the filter's own parameter ignored
    ///
    /// With optimization on, the result also carries the filtered row
    /// `count`.
    pub async fn facets(&self, excluded: &[&str]) -> Result<Map<String, Value>, DataError> {
        self.aggregate(Aggregate::Facets, excluded).await
    }

    async fn aggregate(
        &self,
        kind: Aggregate,
        excluded: &[&str],
    ) -> Result<Map<String, Value>, DataError> {
        let optimize = self.optimization_enabled();
        let filtered = aggregate_base(self.filter_query());
        let source = self.source;

        let mut bundles: Vec<(String, ColumnBundle)> = Vec::new();
        let mut tasks: Vec<Task<'_>> = Vec::new();

        for (name, filter) in self.definition.iter() {
            if excluded.contains(&name) {
                continue;
            }

            if optimize && !self.params.contains_key(name) {
                let bundle = match kind {
                    Aggregate::Specs => filter.as_specs_columns().map(|c| c.specs_columns(name)),
                    Aggregate::Facets => {
                        filter.as_facets_columns().map(|c| c.facets_columns(name))
                    }
                };
                if let Some(bundle) = bundle {
                    bundles.push((name.to_string(), bundle));
                    continue;
                }
            }

            let key = name.to_string();
            match kind {
                Aggregate::Specs => {
                    if let Some(specs) = filter.as_specs() {
                        let query = filtered.clone();
                        tasks.push(
                            async move { Ok(vec![(key, specs.specs(source, query).await?)]) }
                                .boxed(),
                        );
                    }
                }
                Aggregate::Facets => {
                    if let Some(facets) = filter.as_facets() {
                        let query = aggregate_base(self.filter_query_without(name));
                        tasks.push(
                            async move { Ok(vec![(key, facets.facets(source, query).await?)]) }
                                .boxed(),
                        );
                    }
                }
            }
        }

        let dedicated = tasks.len();
        let bundled = bundles.len();
        if optimize && (kind == Aggregate::Facets || !bundles.is_empty()) {
            tasks.insert(0, shared_query(source, kind, filtered, bundles));
        }

        tracing::debug!(
            kind = kind.as_str(),
            optimization = optimize,
            bundled,
            dedicated,
            "Computing filter aggregates"
        );

        let results = gather_with_concurrency(self.settings.max_concurrency, tasks).await?;
        let mut collected: HashMap<String, Value> = results.into_iter().flatten().collect();

        let mut output = Map::new();
        if let Some(count) = collected.remove(FACETS_COUNT_COLUMN) {
            output.insert(FACETS_COUNT_COLUMN.to_string(), count);
        }
        for name in self.definition.names() {
            if let Some(value) = collected.remove(name) {
                output.insert(name.to_string(), value);
            }
        }
        Ok(output)
    }
}

/// One aggregate row carrying every bundled column, plus the total row count
/// for facets
fn shared_query<'f>(
    source: &'f dyn DataSource,
    kind: Aggregate,
    filtered: Select,
    bundles: Vec<(String, ColumnBundle)>,
) -> Task<'f> {
    let mut columns = Vec::new();
    if kind == Aggregate::Facets {
        columns.push(Expr::count_all().label(FACETS_COUNT_COLUMN));
    }
    columns.extend(
        bundles
            .iter()
            .flat_map(|(_, bundle)| bundle.columns.iter().cloned()),
    );
    let query = filtered.columns(columns);

    async move {
        let row = source.execute_one(&query).await?;
        let mut values = Vec::with_capacity(bundles.len() + 1);
        if kind == Aggregate::Facets {
            values.push((
                FACETS_COUNT_COLUMN.to_string(),
                row.value(FACETS_COUNT_COLUMN),
            ));
        }
        for (name, bundle) in &bundles {
            values.push((name.clone(), bundle.parse(&row)?));
        }
        Ok(values)
    }
    .boxed()
}
