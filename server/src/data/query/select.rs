//! SELECT statement builder
//!
//! `Select` is a plain value: every builder method consumes it and returns a
//! modified copy, so a filtered query can be cloned and reshaped for each
//! aggregate without affecting the original.

use serde_json::Value;

use super::expr::{Expr, RenderContext};
use super::model::{Model, Relation};
use crate::data::error::DataError;
use crate::data::sql::SqlDialect;

/// Rendered SQL with its bind values in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<Value>,
}

#[derive(Debug, Clone)]
enum Source {
    Table(&'static str),
    Subquery { query: Box<Select>, alias: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

#[derive(Debug, Clone)]
struct Join {
    kind: JoinKind,
    table: &'static str,
    on: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
    pub expr: Expr,
    pub descending: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Distinct {
    #[default]
    None,
    All,
    On(Vec<Expr>),
}

#[derive(Debug, Clone)]
pub struct Select {
    source: Source,
    columns: Vec<Expr>,
    joins: Vec<Join>,
    predicates: Vec<Expr>,
    group_by: Vec<Expr>,
    order_by: Vec<OrderTerm>,
    limit: Option<u64>,
    offset: Option<u64>,
    distinct: Distinct,
}

impl Select {
    fn new(source: Source, columns: Vec<Expr>) -> Self {
        Self {
            source,
            columns,
            joins: Vec::new(),
            predicates: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            distinct: Distinct::None,
        }
    }

    /// `SELECT <all model columns> FROM <model table>`
    pub fn from_model(model: &'static Model) -> Self {
        Self::new(Source::Table(model.table), model.columns())
    }

    /// `SELECT * FROM <table>`
    pub fn from_table(table: &'static str) -> Self {
        Self::new(Source::Table(table), Vec::new())
    }

    /// Wrap this query as `SELECT * FROM (<self>) AS <alias>`
    pub fn subquery(self, alias: impl Into<String>) -> Self {
        Self::new(
            Source::Subquery {
                query: Box::new(self),
                alias: alias.into(),
            },
            Vec::new(),
        )
    }

    /// Replace the selected columns, keeping joins and predicates
    pub fn columns(mut self, columns: Vec<Expr>) -> Self {
        self.columns = columns;
        self
    }

    pub fn add_columns(mut self, columns: Vec<Expr>) -> Self {
        self.columns.extend(columns);
        self
    }

    pub fn and_where(mut self, predicate: Expr) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn join(self, table: &'static str, on: Expr) -> Self {
        self.push_join(JoinKind::Inner, table, on)
    }

    pub fn outer_join(self, table: &'static str, on: Expr) -> Self {
        self.push_join(JoinKind::Left, table, on)
    }

    pub fn join_relation(self, owner: &Model, relation: &Relation) -> Self {
        self.join(relation.target.table, relation.on(owner))
    }

    pub fn outer_join_relation(self, owner: &Model, relation: &Relation) -> Self {
        self.outer_join(relation.target.table, relation.on(owner))
    }

    // A table is joined at most once
    fn push_join(mut self, kind: JoinKind, table: &'static str, on: Expr) -> Self {
        if self.has_table(table) {
            return self;
        }
        self.joins.push(Join { kind, table, on });
        self
    }

    pub fn has_table(&self, table: &str) -> bool {
        matches!(self.source, Source::Table(t) if t == table)
            || self.joins.iter().any(|j| j.table == table)
    }

    pub fn group_by(mut self, exprs: Vec<Expr>) -> Self {
        self.group_by.extend(exprs);
        self
    }

    pub fn order_by(mut self, expr: Expr, descending: bool) -> Self {
        self.order_by.push(OrderTerm { expr, descending });
        self
    }

    pub fn clear_order_by(mut self) -> Self {
        self.order_by.clear();
        self
    }

    pub fn ordering(&self) -> &[OrderTerm] {
        &self.order_by
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn pagination(&self) -> (Option<u64>, Option<u64>) {
        (self.offset, self.limit)
    }

    pub fn clear_pagination(mut self) -> Self {
        self.limit = None;
        self.offset = None;
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = Distinct::All;
        self
    }

    /// `SELECT DISTINCT ON (...)`, PostgreSQL only
    pub fn distinct_on(mut self, exprs: Vec<Expr>) -> Self {
        self.distinct = Distinct::On(exprs);
        self
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct != Distinct::None
    }

    /// Render the statement for a dialect
    pub fn build(&self, dialect: &dyn SqlDialect) -> Result<Statement, DataError> {
        let mut ctx = RenderContext::new(dialect);
        let sql = self.render(&mut ctx)?;
        Ok(Statement {
            sql,
            binds: ctx.into_binds(),
        })
    }

    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<String, DataError> {
        let mut sql = String::from("SELECT ");

        match &self.distinct {
            Distinct::None => {}
            Distinct::All => sql.push_str("DISTINCT "),
            Distinct::On(exprs) => {
                if !ctx.dialect.supports_distinct_on() {
                    return Err(DataError::Unsupported {
                        backend: ctx.dialect.name(),
                        feature: "DISTINCT ON",
                    });
                }
                let exprs: Vec<String> = exprs.iter().map(|e| e.render(ctx)).collect();
                sql.push_str(&format!("DISTINCT ON ({}) ", exprs.join(", ")));
            }
        }

        if self.columns.is_empty() {
            sql.push('*');
        } else {
            let columns: Vec<String> = self.columns.iter().map(|c| c.render(ctx)).collect();
            sql.push_str(&columns.join(", "));
        }

        sql.push_str(" FROM ");
        match &self.source {
            Source::Table(table) => sql.push_str(table),
            Source::Subquery { query, alias } => {
                let inner = query.render(ctx)?;
                sql.push_str(&format!("({}) AS {}", inner, alias));
            }
        }

        for join in &self.joins {
            let keyword = match join.kind {
                JoinKind::Inner => "JOIN",
                JoinKind::Left => "LEFT OUTER JOIN",
            };
            let on = join.on.render(ctx);
            sql.push_str(&format!(" {} {} ON {}", keyword, join.table, on));
        }

        if !self.predicates.is_empty() {
            let predicates: Vec<String> = self.predicates.iter().map(|p| p.render(ctx)).collect();
            sql.push_str(" WHERE ");
            sql.push_str(&predicates.join(" AND "));
        }

        if !self.group_by.is_empty() {
            let exprs: Vec<String> = self.group_by.iter().map(|e| e.render(ctx)).collect();
            sql.push_str(" GROUP BY ");
            sql.push_str(&exprs.join(", "));
        }

        if !self.order_by.is_empty() {
            let terms: Vec<String> = self
                .order_by
                .iter()
                .map(|t| {
                    let expr = t.expr.render(ctx);
                    if t.descending {
                        format!("{} DESC", expr)
                    } else {
                        format!("{} ASC", expr)
                    }
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        if let Some(clause) = ctx.dialect.limit_offset(self.limit, self.offset) {
            sql.push(' ');
            sql.push_str(&clause);
        }

        Ok(sql)
    }
}
