//! SQL dialect trait for multi-database support
//!
//! This trait defines the interface for generating database-specific SQL syntax.

use serde::{Deserialize, Serialize};

/// Component of a date/time value that can be extracted by the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePart {
    Year,
    Quarter,
    Month,
    Week,
    Day,
    DayOfWeek,
    Hour,
    Minute,
}

impl DatePart {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Quarter => "quarter",
            Self::Month => "month",
            Self::Week => "week",
            Self::Day => "day",
            Self::DayOfWeek => "day_of_week",
            Self::Hour => "hour",
            Self::Minute => "minute",
        }
    }
}

/// SQL dialect trait for generating database-specific SQL
///
/// Different databases have different syntax for:
/// - Parameter placeholders (? vs $1)
/// - Date part extraction
/// - Case-insensitive pattern matching
/// - Aggregating distinct values into one column
/// - Limit/offset clauses
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Generate a parameter placeholder for the given index (1-based)
    ///
    /// - SQLite: Always returns "?"
    /// - PostgreSQL: Returns "$1", "$2", etc.
    fn placeholder(&self, index: usize) -> String;

    /// Quote an identifier (column labels, subquery aliases)
    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// Cast an expression to the dialect's text type
    ///
    /// - SQLite: `CAST(col AS TEXT)`
    /// - PostgreSQL: `CAST(col AS TEXT)`
    fn cast_to_string(&self, col: &str) -> String {
        format!("CAST({} AS TEXT)", col)
    }

    /// Extract a date part as an integer
    ///
    /// - SQLite: `CAST(strftime('%Y', col) AS INTEGER)`
    /// - PostgreSQL: `CAST(EXTRACT(YEAR FROM col) AS INTEGER)`
    fn date_part(&self, part: DatePart, col: &str) -> String;

    /// Format a date as `YYYY-MM` text
    ///
    /// - SQLite: `strftime('%Y-%m', col)`
    /// - PostgreSQL: `to_char(col, 'YYYY-MM')`
    fn year_month(&self, col: &str) -> String;

    /// Case-insensitive LIKE against an escaped pattern placeholder
    ///
    /// - SQLite: `col LIKE ? ESCAPE '\'` (LIKE is case-insensitive for ASCII)
    /// - PostgreSQL: `col ILIKE $1 ESCAPE '\'`
    fn ilike(&self, col: &str, pattern: &str) -> String;

    /// Aggregate the distinct values of an expression into a JSON array (as text)
    ///
    /// NULL inputs may appear in the array; empty input yields `[]` or NULL.
    ///
    /// - SQLite: `json_group_array(DISTINCT col)`
    /// - PostgreSQL: `CAST(json_agg(DISTINCT col) AS TEXT)`
    fn distinct_json_array(&self, col: &str) -> String;

    /// Boolean literal
    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "TRUE" } else { "FALSE" }
    }

    /// Whether `SELECT DISTINCT ON (...)` is supported
    fn supports_distinct_on(&self) -> bool {
        false
    }

    /// Generate LIMIT/OFFSET clause
    ///
    /// Most databases use `LIMIT x OFFSET y`, but syntax may vary.
    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (limit, offset) {
            (None, None) => None,
            (Some(limit), None) => Some(format!("LIMIT {}", limit)),
            (None, Some(offset)) => Some(format!("OFFSET {}", offset)),
            (Some(limit), Some(offset)) => Some(format!("LIMIT {} OFFSET {}", limit, offset)),
        }
    }
}
