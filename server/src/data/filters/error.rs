//! Filter set configuration errors

use thiserror::Error;

/// Raised while building a filter set definition
///
/// These are programming errors in a filter set declaration, so they surface
/// once at startup rather than per request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("FilterSet must not contain non-model field names: {}", .0.join(", "))]
    UndefinedFields(Vec<String>),

    #[error("Relation {relation} is not declared on {table}")]
    UndefinedRelation {
        table: &'static str,
        relation: &'static str,
    },

    #[error("Invalid filter name {0:?}: expected an identifier other than \"count\"")]
    InvalidName(String),

    #[error("Filter {0} is registered more than once")]
    DuplicateName(String),

    #[error("Filters {first} and {second} both bundle a column labelled {label}")]
    LabelCollision {
        label: String,
        first: String,
        second: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_fields_message() {
        let err = FilterError::UndefinedFields(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            err.to_string(),
            "FilterSet must not contain non-model field names: a, b"
        );
    }

    #[test]
    fn test_undefined_relation_message() {
        let err = FilterError::UndefinedRelation {
            table: "products",
            relation: "vendor",
        };
        assert_eq!(err.to_string(), "Relation vendor is not declared on products");
    }

    #[test]
    fn test_label_collision_message() {
        let err = FilterError::LabelCollision {
            label: "min_price".to_string(),
            first: "price".to_string(),
            second: "min_price".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Filters price and min_price both bundle a column labelled min_price"
        );
    }
}
