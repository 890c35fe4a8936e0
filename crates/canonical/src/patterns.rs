//! Prompt-injection signatures.
//!
//! The list is a deny-list and knowingly incomplete: a phrase that slips past
//! it is tolerated, a legitimate emotional question that trips it is a bug.
//! Patterns run against [`normalize_question`](crate::normalize_question)
//! output, so they only need to describe lowercase, single-spaced text.
//! Digit and symbol look-alikes (`0` for `o`, `@` for `a`) are spelled out
//! where they are common.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// One named deny-list entry.
#[derive(Debug)]
pub struct Signature {
    /// Stable identifier, only ever surfaced in server-side diagnostics.
    pub name: &'static str,
    /// When set, the pattern is also tried at the start of every input line.
    pub per_line: bool,
    regex: Regex,
}

impl Signature {
    fn new(name: &'static str, pattern: &str, per_line: bool) -> Self {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .unwrap_or_else(|err| panic!("injection signature `{name}` does not compile: {err}"));
        Self {
            name,
            per_line,
            regex,
        }
    }

    /// Returns true when the signature matches `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Ordered deny-list. Order only matters for which name is reported first.
pub static INJECTION_SIGNATURES: Lazy<Vec<Signature>> = Lazy::new(|| {
    vec![
        Signature::new(
            "ignore_previous",
            r"ign[o0]re (all )?(previous|prior|above|earlier) (instructions?|prompts?)",
            false,
        ),
        Signature::new(
            "disregard_previous",
            r"disregard (previous|prior|system|all) (instructions?|prompts?|checks?)",
            false,
        ),
        Signature::new(
            "elevated_mode",
            r"you are now (in )?(developer|admin|debug|god|root) ?mode",
            false,
        ),
        Signature::new(
            "bypass_safety",
            r"byp[a@]ss (safety|security|content) (checks?|filters?)",
            false,
        ),
        Signature::new(
            "reveal_prompt",
            r"reveal (hidden|system|internal|your|the) (system )?(prompt|data|instructions?)",
            false,
        ),
        Signature::new(
            "roleplay_privileged",
            r"roleplay as (system|admin|developer|root)",
            false,
        ),
        Signature::new(
            "output_prompt",
            r"output your (system )?(prompt|instructions?)",
            false,
        ),
        Signature::new(
            "act_as_privileged",
            r"act as (system|admin|developer|root|god)",
            false,
        ),
        Signature::new(
            "role_prefix",
            r"^(new instructions?|system|admin|developer):",
            true,
        ),
        Signature::new("prompt_injection", r"pr[o0]mpt inject", false),
        Signature::new("jailbreak", r"j[a@]ilbre[a@]k", false),
        Signature::new(
            "forget_instructions",
            r"forget (previous|all|your) (instructions?|rules?|constraints?)",
            false,
        ),
        Signature::new("override_system", r"override (system|safety|security)", false),
        Signature::new(
            "show_training_data",
            r"show (me )?(your|the) (training|original) (data|prompt|instructions?)",
            false,
        ),
    ]
});

/// Returns the first signature matching `normalized`, or one of the
/// `folded_lines` for per-line signatures.
///
/// `normalized` must be the single-line screening form; `folded_lines` are
/// the original lines after NFKC + lowercase.
pub fn first_signature_match<'a, I>(normalized: &str, folded_lines: I) -> Option<&'static Signature>
where
    I: IntoIterator<Item = &'a str>,
{
    if let Some(hit) = INJECTION_SIGNATURES.iter().find(|sig| sig.is_match(normalized)) {
        return Some(hit);
    }

    let lines: Vec<String> = folded_lines
        .into_iter()
        .map(crate::collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect();
    INJECTION_SIGNATURES
        .iter()
        .filter(|sig| sig.per_line)
        .find(|sig| lines.iter().any(|line| sig.is_match(line)))
}
