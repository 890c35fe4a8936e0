//! Whitespace normalization utilities.
//!
//! Unicode's definition of whitespace is used throughout, so tabs, newlines,
//! carriage returns and non-breaking spaces all count as separators. U+FEFF
//! (byte order mark) is a separator too, as it is for browser clients.

/// Whitespace as browser clients see it: Unicode `White_Space` plus U+FEFF.
pub fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '\u{FEFF}'
}

/// Trims [`is_separator`] characters from both ends.
pub fn trim_separators(text: &str) -> &str {
    text.trim_matches(is_separator)
}

/// Collapses repeated whitespace, trims edges, and normalizes newlines to
/// single spaces.
///
/// # Algorithm
///
/// 1. Split the text on [`is_separator`], dropping empty segments
/// 2. Join the resulting segments with single ASCII spaces
/// 3. The result has no leading or trailing whitespace
///
/// # Examples
///
/// ```rust
/// use canonical::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("  hello   world  "), "hello world");
/// assert_eq!(collapse_whitespace("hello\r\n\tworld"), "hello world");
/// assert_eq!(collapse_whitespace("hello\u{00A0}world"), "hello world");
/// assert_eq!(collapse_whitespace("hello\u{FEFF}world"), "hello world");
/// assert_eq!(collapse_whitespace("   \n\t   "), "");
/// ```
pub fn collapse_whitespace(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    for segment in text.split(is_separator).filter(|s| !s.is_empty()) {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(segment);
    }
    normalized
}
