//! Declarative filter sets
//!
//! A filter narrows a query from one request parameter. Filters may also
//! describe the values available to choose from:
//! - specs - what the currently filtered rows contain
//! - facets - what the rows would contain if this filter alone were lifted
//!
//! Either can be computed by a dedicated query or, when the filter exposes
//! aggregate columns, folded into one shared query by [`FilterSet`].

mod base;
mod boolean;
mod choice;
mod date;
mod error;
mod field;
mod filterset;
mod method;
mod ordering;
mod related;
pub mod schemas;
mod search;
pub mod values;

#[cfg(test)]
pub(crate) mod testing;

pub use base::{
    ColumnBundle, Facets, FacetsColumns, FieldRef, Filter, Specs, SpecsColumns, Target,
};
pub use boolean::{BooleanFilter, CheckboxFilter};
pub use choice::ChoiceFilter;
pub use date::{DatePartFilter, YearMonthFilter};
pub use error::FilterError;
pub use field::{EnumFilter, ExactFilter, InFilter, NumberFilter, RangeFilter};
pub use filterset::{FilterSet, FilterSetBuilder, FilterSetDefinition, FilterSettings};
pub use method::{AggregateFn, ColumnsFn, FilterFn, MethodFilter};
pub use ordering::{LimitOffsetPagination, OrderingFilter, with_default_ordering};
pub use related::ChangedWithRelatedFilter;
pub use schemas::{Choice, Choices, RangeSchema};
pub use search::SearchFilter;
