//! SQLite SQL dialect implementation

use super::{DatePart, SqlDialect};

/// SQLite SQL dialect
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn date_part(&self, part: DatePart, col: &str) -> String {
        let format = match part {
            DatePart::Year => "%Y",
            DatePart::Month => "%m",
            DatePart::Week => "%W",
            DatePart::Day => "%d",
            DatePart::DayOfWeek => "%w",
            DatePart::Hour => "%H",
            DatePart::Minute => "%M",
            DatePart::Quarter => {
                // No quarter specifier in strftime, derive it from the month
                return format!(
                    "((CAST(strftime('%m', {}) AS INTEGER) + 2) / 3)",
                    col
                );
            }
        };
        format!("CAST(strftime('{}', {}) AS INTEGER)", format, col)
    }

    fn year_month(&self, col: &str) -> String {
        format!("strftime('%Y-%m', {})", col)
    }

    fn ilike(&self, col: &str, pattern: &str) -> String {
        format!("{} LIKE {} ESCAPE '\\'", col, pattern)
    }

    fn distinct_json_array(&self, col: &str) -> String {
        format!("json_group_array(DISTINCT {})", col)
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        // SQLite stores booleans as integers
        if value { "1" } else { "0" }
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded
        match (limit, offset) {
            (None, None) => None,
            (Some(limit), None) => Some(format!("LIMIT {}", limit)),
            (None, Some(offset)) => Some(format!("LIMIT -1 OFFSET {}", offset)),
            (Some(limit), Some(offset)) => Some(format!("LIMIT {} OFFSET {}", limit, offset)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let dialect = SqliteDialect;
        assert_eq!(dialect.placeholder(1), "?");
        assert_eq!(dialect.placeholder(5), "?");
    }

    #[test]
    fn test_date_part() {
        let dialect = SqliteDialect;
        assert_eq!(
            dialect.date_part(DatePart::Year, "users.birth_date"),
            "CAST(strftime('%Y', users.birth_date) AS INTEGER)"
        );
        assert_eq!(
            dialect.date_part(DatePart::Quarter, "created_at"),
            "((CAST(strftime('%m', created_at) AS INTEGER) + 2) / 3)"
        );
    }

    #[test]
    fn test_ilike() {
        let dialect = SqliteDialect;
        assert_eq!(
            dialect.ilike("CAST(users.email AS TEXT)", "?"),
            "CAST(users.email AS TEXT) LIKE ? ESCAPE '\\'"
        );
    }

    #[test]
    fn test_limit_offset() {
        let dialect = SqliteDialect;
        assert_eq!(dialect.limit_offset(None, None), None);
        assert_eq!(dialect.limit_offset(Some(10), None).unwrap(), "LIMIT 10");
        assert_eq!(
            dialect.limit_offset(None, Some(20)).unwrap(),
            "LIMIT -1 OFFSET 20"
        );
        assert_eq!(
            dialect.limit_offset(Some(10), Some(20)).unwrap(),
            "LIMIT 10 OFFSET 20"
        );
    }
}
