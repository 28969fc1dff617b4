//! PostgreSQL SQL dialect implementation

use super::{DatePart, SqlDialect};

/// PostgreSQL SQL dialect
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn date_part(&self, part: DatePart, col: &str) -> String {
        let field = match part {
            DatePart::Year => "YEAR",
            DatePart::Quarter => "QUARTER",
            DatePart::Month => "MONTH",
            DatePart::Week => "WEEK",
            DatePart::Day => "DAY",
            DatePart::DayOfWeek => "DOW",
            DatePart::Hour => "HOUR",
            DatePart::Minute => "MINUTE",
        };
        format!("CAST(EXTRACT({} FROM {}) AS INTEGER)", field, col)
    }

    fn year_month(&self, col: &str) -> String {
        format!("to_char({}, 'YYYY-MM')", col)
    }

    fn ilike(&self, col: &str, pattern: &str) -> String {
        format!("{} ILIKE {} ESCAPE '\\'", col, pattern)
    }

    fn distinct_json_array(&self, col: &str) -> String {
        format!("CAST(json_agg(DISTINCT {}) AS TEXT)", col)
    }

    fn supports_distinct_on(&self) -> bool {
        true
    }
}
