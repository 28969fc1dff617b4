//! SQL expression tree
//!
//! Expressions keep user values out of the SQL text: every `Expr::Value` is
//! rendered as a dialect placeholder and collected into the bind list in the
//! order it appears in the statement.

use serde_json::Value;

use crate::data::sql::{DatePart, SqlDialect};

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl BinaryOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `table.name`
    Column { table: String, name: String },
    /// Quoted reference to an output column of the same statement
    Ident(String),
    /// Bound parameter
    Value(Value),
    Raw(String),
    Bool(bool),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    IsNull(Box<Expr>),
    IsNotNull(Box<Expr>),
    IsNotTrue(Box<Expr>),
    InList {
        expr: Box<Expr>,
        values: Vec<Value>,
    },
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Func {
        name: &'static str,
        args: Vec<Expr>,
    },
    CountAll,
    Count {
        expr: Box<Expr>,
        distinct: bool,
    },
    CastText(Box<Expr>),
    DatePart {
        part: DatePart,
        expr: Box<Expr>,
    },
    YearMonth(Box<Expr>),
    ILike {
        expr: Box<Expr>,
        pattern: String,
    },
    JsonArrayAgg(Box<Expr>),
    Case {
        when: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Label {
        expr: Box<Expr>,
        alias: String,
    },
}

impl Expr {
    pub fn column(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Column {
            table: table.into(),
            name: name.into(),
        }
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident(name.into())
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    /// Conjunction; an empty list is always true
    pub fn and(mut exprs: Vec<Expr>) -> Self {
        match exprs.len() {
            0 => Self::Bool(true),
            1 => exprs.remove(0),
            _ => Self::And(exprs),
        }
    }

    /// Disjunction; an empty list is always false
    pub fn or(mut exprs: Vec<Expr>) -> Self {
        match exprs.len() {
            0 => Self::Bool(false),
            1 => exprs.remove(0),
            _ => Self::Or(exprs),
        }
    }

    pub fn count_all() -> Self {
        Self::CountAll
    }

    pub fn min(self) -> Self {
        Self::Func {
            name: "MIN",
            args: vec![self],
        }
    }

    pub fn max(self) -> Self {
        Self::Func {
            name: "MAX",
            args: vec![self],
        }
    }

    pub fn count_distinct(self) -> Self {
        Self::Count {
            expr: Box::new(self),
            distinct: true,
        }
    }

    pub fn count(self) -> Self {
        Self::Count {
            expr: Box::new(self),
            distinct: false,
        }
    }

    /// Compare against a bound value; comparing to JSON null yields `IS NULL`
    pub fn compare(self, op: BinaryOp, value: impl Into<Value>) -> Self {
        let value = value.into();
        match (op, value.is_null()) {
            (BinaryOp::Eq, true) => self.is_null(),
            (BinaryOp::Ne, true) => self.is_not_null(),
            _ => Self::Binary {
                op,
                left: Box::new(self),
                right: Box::new(Self::Value(value)),
            },
        }
    }

    pub fn eq(self, value: impl Into<Value>) -> Self {
        self.compare(BinaryOp::Eq, value)
    }

    pub fn ne(self, value: impl Into<Value>) -> Self {
        self.compare(BinaryOp::Ne, value)
    }

    pub fn lt(self, value: impl Into<Value>) -> Self {
        self.compare(BinaryOp::Lt, value)
    }

    pub fn lte(self, value: impl Into<Value>) -> Self {
        self.compare(BinaryOp::Lte, value)
    }

    pub fn gt(self, value: impl Into<Value>) -> Self {
        self.compare(BinaryOp::Gt, value)
    }

    pub fn gte(self, value: impl Into<Value>) -> Self {
        self.compare(BinaryOp::Gte, value)
    }

    /// Compare two expressions without binding
    pub fn eq_expr(self, other: Expr) -> Self {
        Self::Binary {
            op: BinaryOp::Eq,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn gt_expr(self, other: Expr) -> Self {
        Self::Binary {
            op: BinaryOp::Gt,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn is_null(self) -> Self {
        Self::IsNull(Box::new(self))
    }

    pub fn is_not_null(self) -> Self {
        Self::IsNotNull(Box::new(self))
    }

    /// Three-valued negation: true for false and NULL
    pub fn is_not_true(self) -> Self {
        Self::IsNotTrue(Box::new(self))
    }

    pub fn in_list(self, values: Vec<Value>) -> Self {
        Self::InList {
            expr: Box::new(self),
            values,
        }
    }

    /// Case-insensitive match against an already escaped LIKE pattern
    pub fn ilike(self, pattern: impl Into<String>) -> Self {
        Self::ILike {
            expr: Box::new(self),
            pattern: pattern.into(),
        }
    }

    pub fn cast_text(self) -> Self {
        Self::CastText(Box::new(self))
    }

    pub fn date_part(self, part: DatePart) -> Self {
        Self::DatePart {
            part,
            expr: Box::new(self),
        }
    }

    pub fn year_month(self) -> Self {
        Self::YearMonth(Box::new(self))
    }

    pub fn json_array_agg(self) -> Self {
        Self::JsonArrayAgg(Box::new(self))
    }

    pub fn case(when: Expr, then: Expr, otherwise: Expr) -> Self {
        Self::Case {
            when: Box::new(when),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn label(self, alias: impl Into<String>) -> Self {
        Self::Label {
            expr: Box::new(self),
            alias: alias.into(),
        }
    }

    /// Render as SQL, discarding binds
    pub fn to_sql(&self, dialect: &dyn SqlDialect) -> String {
        let mut ctx = RenderContext::new(dialect);
        self.render(&mut ctx)
    }

    pub(crate) fn render(&self, ctx: &mut RenderContext<'_>) -> String {
        match self {
            Self::Column { table, name } => format!("{}.{}", table, name),
            Self::Ident(name) => ctx.dialect.quote_ident(name),
            Self::Value(value) => ctx.bind(value.clone()),
            Self::Raw(sql) => sql.clone(),
            Self::Bool(value) => ctx.dialect.bool_literal(*value).to_string(),
            Self::Binary { op, left, right } => {
                let left = left.render(ctx);
                let right = right.render(ctx);
                format!("{} {} {}", left, op.as_sql(), right)
            }
            Self::IsNull(expr) => format!("{} IS NULL", expr.render(ctx)),
            Self::IsNotNull(expr) => format!("{} IS NOT NULL", expr.render(ctx)),
            Self::IsNotTrue(expr) => format!("({}) IS NOT TRUE", expr.render(ctx)),
            Self::InList { expr, values } => {
                if values.is_empty() {
                    return "1 = 0".to_string();
                }
                let expr = expr.render(ctx);
                let placeholders: Vec<String> =
                    values.iter().map(|v| ctx.bind(v.clone())).collect();
                format!("{} IN ({})", expr, placeholders.join(", "))
            }
            Self::And(exprs) => render_joined(exprs, " AND ", ctx),
            Self::Or(exprs) => render_joined(exprs, " OR ", ctx),
            Self::Func { name, args } => {
                let args: Vec<String> = args.iter().map(|a| a.render(ctx)).collect();
                format!("{}({})", name, args.join(", "))
            }
            Self::CountAll => "COUNT(*)".to_string(),
            Self::Count { expr, distinct } => {
                let expr = expr.render(ctx);
                if *distinct {
                    format!("COUNT(DISTINCT {})", expr)
                } else {
                    format!("COUNT({})", expr)
                }
            }
            Self::CastText(expr) => {
                let expr = expr.render(ctx);
                ctx.dialect.cast_to_string(&expr)
            }
            Self::DatePart { part, expr } => {
                let expr = expr.render(ctx);
                ctx.dialect.date_part(*part, &expr)
            }
            Self::YearMonth(expr) => {
                let expr = expr.render(ctx);
                ctx.dialect.year_month(&expr)
            }
            Self::ILike { expr, pattern } => {
                let expr = expr.render(ctx);
                let placeholder = ctx.bind(Value::String(pattern.clone()));
                ctx.dialect.ilike(&expr, &placeholder)
            }
            Self::JsonArrayAgg(expr) => {
                let expr = expr.render(ctx);
                ctx.dialect.distinct_json_array(&expr)
            }
            Self::Case {
                when,
                then,
                otherwise,
            } => {
                let when = when.render(ctx);
                let then = then.render(ctx);
                let otherwise = otherwise.render(ctx);
                format!("CASE WHEN {} THEN {} ELSE {} END", when, then, otherwise)
            }
            Self::Label { expr, alias } => {
                let expr = expr.render(ctx);
                format!("{} AS {}", expr, ctx.dialect.quote_ident(alias))
            }
        }
    }
}

fn render_joined(exprs: &[Expr], separator: &str, ctx: &mut RenderContext<'_>) -> String {
    let parts: Vec<String> = exprs.iter().map(|e| e.render(ctx)).collect();
    format!("({})", parts.join(separator))
}

/// Accumulates bind values while a statement is rendered
pub(crate) struct RenderContext<'a> {
    pub(crate) dialect: &'a dyn SqlDialect,
    binds: Vec<Value>,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(dialect: &'a dyn SqlDialect) -> Self {
        Self {
            dialect,
            binds: Vec::new(),
        }
    }

    fn bind(&mut self, value: Value) -> String {
        self.binds.push(value);
        self.dialect.placeholder(self.binds.len())
    }

    pub(crate) fn into_binds(self) -> Vec<Value> {
        self.binds
    }
}
