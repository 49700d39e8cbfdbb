//! SKU shape detection for the exact-match stage.

/// Whether a query looks like an exact product identifier rather than free
/// text.
///
/// SKU-like: a single token of 4..=32 chars, ASCII alphanumerics with `-`
/// or `_` separators, containing at least one digit. False positives are
/// harmless; a miss on the exact stage just falls through to catalog search.
pub fn looks_like_sku(query: &str) -> bool {
    let q = query.trim();
    if q.is_empty() || q.contains(char::is_whitespace) {
        return false;
    }
    if !(4..=32).contains(&q.len()) {
        return false;
    }
    q.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        && q.chars().any(|c| c.is_ascii_digit())
}
