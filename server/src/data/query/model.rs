//! Static table definitions used to resolve columns and joins

use std::fmt;

use super::Expr;

/// A table and the columns the filter engine may reference
pub struct Model {
    pub table: &'static str,
    pub fields: &'static [&'static str],
    pub relations: &'static [Relation],
}

/// A many-to-one or one-to-many link to another model
///
/// Joining a relation renders `JOIN <target> ON <target>.<remote_key> = <owner>.<local_key>`.
pub struct Relation {
    pub name: &'static str,
    pub target: &'static Model,
    pub local_key: &'static str,
    pub remote_key: &'static str,
}

impl Model {
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains(&field)
    }

    /// Qualified column reference, e.g. `products.name`
    ///
    /// Field names are checked when a filter set is built, so this never fails.
    pub fn column(&self, field: &str) -> Expr {
        Expr::column(self.table, field)
    }

    /// All declared columns in declaration order
    pub fn columns(&self) -> Vec<Expr> {
        self.fields.iter().map(|f| self.column(f)).collect()
    }

    pub fn relation(&self, name: &str) -> Option<&'static Relation> {
        self.relations.iter().find(|r| r.name == name)
    }
}

impl Relation {
    /// Join condition between the owning model and the target
    pub fn on(&self, owner: &Model) -> Expr {
        self.target
            .column(self.remote_key)
            .eq_expr(owner.column(self.local_key))
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table
    }
}

impl Eq for Model {}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("table", &self.table)
            .field("fields", &self.fields)
            .field(
                "relations",
                &self.relations.iter().map(|r| r.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl fmt::Debug for Relation {
    // Relations may be cyclic, so only the target's table is printed
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("name", &self.name)
            .field("target", &self.target.table)
            .field("local_key", &self.local_key)
            .field("remote_key", &self.remote_key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sql::SqliteDialect;

    static AUTHORS: Model = Model {
        table: "authors",
        fields: &["id", "name"],
        relations: &[],
    };

    static BOOKS: Model = Model {
        table: "books",
        fields: &["id", "title", "author_id"],
        relations: &[Relation {
            name: "author",
            target: &AUTHORS,
            local_key: "author_id",
            remote_key: "id",
        }],
    };

    #[test]
    fn test_has_field() {
        assert!(BOOKS.has_field("title"));
        assert!(!BOOKS.has_field("isbn"));
    }

    #[test]
    fn test_relation_lookup_and_condition() {
        let relation = BOOKS.relation("author").unwrap();
        assert_eq!(relation.target, &AUTHORS);
        assert!(BOOKS.relation("publisher").is_none());

        let on = relation.on(&BOOKS).to_sql(&SqliteDialect);
        assert_eq!(on, "authors.id = books.author_id");
    }

    #[test]
    fn test_debug_does_not_recurse() {
        let debug = format!("{:?}", BOOKS);
        assert!(debug.contains("books"));
        assert!(debug.contains("author"));
    }
}
