//! Helpers for turning extracted node text into printable lines.

/// Collapse every run of whitespace into a single space and trim both ends.
///
/// ```
/// assert_eq!(ladle_common::text::collapse_whitespace("  a \n\t b  "), "a b");
/// ```
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate `s` to at most `max` bytes on a char boundary, appending `...` when cut.
pub fn snippet(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = s[..end].to_string();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_mixed_whitespace() {
        assert_eq!(collapse_whitespace("\n  Hello\u{a0} \t world \n"), "Hello world");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        assert_eq!(snippet("short", 10), "short");
        assert_eq!(snippet("abcdef", 3), "abc...");
        // 'é' is two bytes; cutting at 2 would split it.
        assert_eq!(snippet("aé", 2), "a...");
    }
}
