use unicode_normalization::UnicodeNormalization;

use crate::whitespace::collapse_whitespace;

/// NFKC-normalizes and lowercases `input` while keeping its line structure.
///
/// NFKC folds compatibility characters (fullwidth letters, ligatures,
/// superscripts) onto their plain forms before lowercasing, so
/// `ＩＧＮＯＲＥ` and `ignore` fold to the same text. Line breaks survive so
/// per-line signatures can still see where a line starts.
pub fn fold_question(input: &str) -> String {
    input.nfkc().collect::<String>().to_lowercase()
}

/// Produces the screening form of a question: [`fold_question`] followed by
/// [`collapse_whitespace`].
///
/// ```rust
/// use canonical::normalize_question;
///
/// assert_eq!(
///     normalize_question("  Ｗｈｙ   DOES\nit\thurt?  "),
///     "why does it hurt?"
/// );
/// ```
pub fn normalize_question(input: &str) -> String {
    collapse_whitespace(&fold_question(input))
}
