use serde::Serialize;

use crate::normalize::fold_question;
use crate::patterns::first_signature_match;
use crate::whitespace::{collapse_whitespace, trim_separators};

/// Longest question accepted, in UTF-16 code units (what a browser counts).
pub const MAX_QUESTION_CHARS: usize = 200;

/// The only message a rejected question ever produces.
pub const GENERIC_ERROR: &str = "I couldn't understand that one. Try asking differently?";

/// Outcome of screening a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub safe: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl ValidationResult {
    const fn safe() -> Self {
        Self {
            safe: true,
            error: None,
        }
    }

    const fn rejected() -> Self {
        Self {
            safe: false,
            error: Some(GENERIC_ERROR),
        }
    }
}

/// Length of `input` as counted by the client-facing limit.
pub fn question_length(input: &str) -> usize {
    input.encode_utf16().count()
}

/// Screens a raw question.
///
/// Checks run in order and stop at the first failure:
///
/// 1. longer than [`MAX_QUESTION_CHARS`]
/// 2. empty after trimming
/// 3. any injection signature matches the normalized text
///
/// All three failures return the same [`GENERIC_ERROR`].
pub fn sanitize_question(input: &str) -> ValidationResult {
    if question_length(input) > MAX_QUESTION_CHARS {
        return ValidationResult::rejected();
    }

    if trim_separators(input).is_empty() {
        return ValidationResult::rejected();
    }

    let folded = fold_question(input);
    let normalized = collapse_whitespace(&folded);
    if first_signature_match(&normalized, folded.lines()).is_some() {
        return ValidationResult::rejected();
    }

    ValidationResult::safe()
}
