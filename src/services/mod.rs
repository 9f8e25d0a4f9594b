pub mod auth_service;
pub mod book_service;
pub mod buyer_service;
pub mod detail_order_service;
pub mod order_service;
pub mod product_service;
pub mod rating_service;
pub mod token_service;
pub mod user_service;
pub mod voucher_service;

/// `%term%`, for ILIKE filters. `%`, `_` and backslash in the term are escaped so
/// they match literally; backslash is the Postgres default LIKE escape.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::contains_pattern;

    #[test]
    fn search_terms_are_wrapped_in_wildcards() {
        assert_eq!(contains_pattern("kopi"), "%kopi%");
    }

    #[test]
    fn like_metacharacters_match_literally() {
        assert_eq!(contains_pattern("50%"), r"%50\%%");
        assert_eq!(contains_pattern("P_01"), r"%P\_01%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }
}
