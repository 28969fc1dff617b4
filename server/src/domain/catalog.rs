//! Entity registry
//!
//! Filter set definitions are validated once when the catalog is built and
//! shared by every repository handed out afterwards.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::filtersets;
use super::models::{
    MEASURE_CATEGORIES, MEASURE_VALUES, PRODUCT_CATEGORIES, PRODUCT_MODIFICATION_VALUES,
    PRODUCT_MODIFICATIONS, PRODUCTS, USERS,
};
use super::repository::AdminRepository;
use crate::data::filters::{FilterError, FilterSetDefinition, FilterSettings};
use crate::data::query::Model;
use crate::data::source::DataSource;

/// Catalog entities exposed through the admin repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Products,
    ProductCategories,
    ProductModifications,
    ProductModificationValues,
    MeasureCategories,
    MeasureValues,
    Users,
}

impl Entity {
    pub const ALL: [Entity; 7] = [
        Entity::Products,
        Entity::ProductCategories,
        Entity::ProductModifications,
        Entity::ProductModificationValues,
        Entity::MeasureCategories,
        Entity::MeasureValues,
        Entity::Users,
    ];

    pub fn model(&self) -> &'static Model {
        match self {
            Entity::Products => &PRODUCTS,
            Entity::ProductCategories => &PRODUCT_CATEGORIES,
            Entity::ProductModifications => &PRODUCT_MODIFICATIONS,
            Entity::ProductModificationValues => &PRODUCT_MODIFICATION_VALUES,
            Entity::MeasureCategories => &MEASURE_CATEGORIES,
            Entity::MeasureValues => &MEASURE_VALUES,
            Entity::Users => &USERS,
        }
    }

    /// Kebab-case name used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Entity::Products => "products",
            Entity::ProductCategories => "product-categories",
            Entity::ProductModifications => "product-modifications",
            Entity::ProductModificationValues => "product-modification-values",
            Entity::MeasureCategories => "measure-categories",
            Entity::MeasureValues => "measure-values",
            Entity::Users => "users",
        }
    }

    fn filter_set(&self) -> Result<FilterSetDefinition, FilterError> {
        match self {
            Entity::Products => filtersets::products(),
            Entity::ProductCategories => filtersets::product_categories(),
            Entity::ProductModifications => filtersets::product_modifications(),
            Entity::ProductModificationValues => filtersets::product_modification_values(),
            Entity::MeasureCategories => filtersets::measure_categories(),
            Entity::MeasureValues => filtersets::measure_values(),
            Entity::Users => filtersets::users(),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Entity {
    type Err = String;

    /// Accepts the kebab-case name or the table name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('_', "-");
        Entity::ALL
            .into_iter()
            .find(|entity| entity.name() == normalized)
            .ok_or_else(|| {
                let valid: Vec<&str> = Entity::ALL.iter().map(Entity::name).collect();
                format!(
                    "Invalid entity '{}'. Valid options: {}",
                    s,
                    valid.join(", ")
                )
            })
    }
}

/// Validated filter sets for every entity
pub struct Catalog {
    definitions: HashMap<Entity, Arc<FilterSetDefinition>>,
    settings: FilterSettings,
}

impl Catalog {
    pub fn new(settings: FilterSettings) -> Result<Self, FilterError> {
        let definitions = Entity::ALL
            .into_iter()
            .map(|entity| Ok((entity, Arc::new(entity.filter_set()?))))
            .collect::<Result<HashMap<_, _>, FilterError>>()?;

        tracing::debug!(
            entities = definitions.len(),
            optimization = settings.optimization,
            max_concurrency = settings.max_concurrency,
            "Catalog filter sets validated"
        );
        Ok(Self {
            definitions,
            settings,
        })
    }

    pub fn definition(&self, entity: Entity) -> Option<&FilterSetDefinition> {
        self.definitions.get(&entity).map(Arc::as_ref)
    }

    /// Repository for `entity` reading from `source`
    pub fn repository(
        &self,
        entity: Entity,
        source: Arc<dyn DataSource>,
    ) -> Option<AdminRepository> {
        let definition = self.definitions.get(&entity)?;
        Some(
            AdminRepository::new(entity.model(), Arc::clone(definition), source)
                .with_settings(self.settings),
        )
    }
}
