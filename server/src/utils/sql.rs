//! SQL utility functions

/// Escape SQL LIKE metacharacters (%, _, \) in user input
///
/// Use this when building LIKE patterns from user input to prevent
/// unintended pattern matching. Patterns must be rendered with `ESCAPE '\'`.
///
/// # Example
///
/// ```
/// use storefront_server::utils::sql::escape_like_pattern;
///
/// let user_input = "100% match_test";
/// let pattern = format!("%{}%", escape_like_pattern(user_input));
/// assert_eq!(pattern, "%100\\% match\\_test%");
/// ```
pub fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Build a LIKE pattern from a search term
///
/// Terms containing glob wildcards are translated as-is (`*` matches any
/// sequence, `?` a single character) and must match the whole value.
/// Plain terms match anywhere in the value.
///
/// ```
/// use storefront_server::utils::sql::search_pattern;
///
/// assert_eq!(search_pattern("phone"), "%phone%");
/// assert_eq!(search_pattern("ph?ne*"), "ph_ne%");
/// ```
pub fn search_pattern(term: &str) -> String {
    let escaped = escape_like_pattern(term);
    if term.contains('*') || term.contains('?') {
        escaped.replace('*', "%").replace('?', "_")
    } else {
        format!("%{}%", escaped)
    }
}
