use std::sync::Arc;
use tracing::{debug, info};

use index::Candidate;

use crate::client::ChatModel;
use crate::error::SelectorError;
use crate::prompt::{build_messages, NO_MATCH_SENTINEL, PROMPT_VERSION};
use crate::types::SelectionOutcome;

/// Sampling and output-handling knobs for [`Selector`].
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorConfig {
    /// Non-zero so repeated identical questions can surface different lyrics.
    pub temperature: f32,
    pub max_tokens: u32,
    /// Demote any pick that is not one of the supplied candidates to `NoMatch`.
    /// Off by default: the model's text is trusted verbatim.
    pub require_candidate_match: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            temperature: 0.6,
            max_tokens: 150,
            require_candidate_match: false,
        }
    }
}

impl SelectorConfig {
    pub fn with_candidate_match(mut self, enabled: bool) -> Self {
        self.require_candidate_match = enabled;
        self
    }
}

/// Chat-model re-ranker over retrieved candidates.
#[derive(Clone)]
pub struct Selector {
    model: Arc<dyn ChatModel>,
    config: SelectorConfig,
}

impl Selector {
    pub fn new(model: Arc<dyn ChatModel>, config: SelectorConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Picks one candidate or `NoMatch`. An empty candidate list is `NoMatch`
    /// without a model call.
    pub async fn select(
        &self,
        question: &str,
        candidates: &[Candidate],
    ) -> Result<SelectionOutcome, SelectorError> {
        if candidates.is_empty() {
            return Ok(SelectionOutcome::NoMatch);
        }

        let messages = build_messages(question, candidates);
        let raw = self
            .model
            .complete(&messages, self.config.temperature, self.config.max_tokens)
            .await?;

        let outcome = interpret(&raw, candidates, self.config.require_candidate_match);
        debug!(
            prompt_version = PROMPT_VERSION,
            candidates = candidates.len(),
            matched = outcome.is_match(),
            "selection complete"
        );
        Ok(outcome)
    }
}

pub(crate) fn interpret(raw: &str, candidates: &[Candidate], contained: bool) -> SelectionOutcome {
    let text = raw.trim();
    if text.is_empty() || text.eq_ignore_ascii_case(NO_MATCH_SENTINEL) {
        return SelectionOutcome::NoMatch;
    }
    if contained {
        let unquoted = strip_quotes(text);
        if !candidates.iter().any(|c| c.text.trim() == unquoted) {
            info!("model pick is not a supplied candidate; serving fallback");
            return SelectionOutcome::NoMatch;
        }
        return SelectionOutcome::Chosen(unquoted.to_string());
    }
    SelectionOutcome::Chosen(text.to_string())
}

fn strip_quotes(text: &str) -> &str {
    text.trim_matches(|c| matches!(c, '"' | '\'' | '\u{201C}' | '\u{201D}'))
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cands() -> Vec<Candidate> {
        vec![
            Candidate::new("Long story short, I survived", 0.81),
            Candidate::new("This is me trying", 0.74),
        ]
    }

    #[test]
    fn sentinel_and_empty_are_no_match() {
        for raw in ["no match", "  No Match \n", "NO MATCH", "", "   "] {
            assert_eq!(interpret(raw, &cands(), false), SelectionOutcome::NoMatch, "{raw:?}");
        }
    }

    #[test]
    fn other_text_is_returned_trimmed_and_verbatim() {
        assert_eq!(
            interpret("  This is me trying\n", &cands(), false),
            SelectionOutcome::Chosen("This is me trying".into())
        );
        assert_eq!(
            interpret("no match, sorry", &cands(), false),
            SelectionOutcome::Chosen("no match, sorry".into())
        );
    }

    #[test]
    fn unlisted_text_trusted_when_containment_off() {
        assert_eq!(
            interpret("Anti-Hero", &cands(), false),
            SelectionOutcome::Chosen("Anti-Hero".into())
        );
    }

    #[test]
    fn containment_demotes_unlisted_picks() {
        assert_eq!(interpret("Anti-Hero", &cands(), true), SelectionOutcome::NoMatch);
        assert_eq!(
            interpret("\"This is me trying\"", &cands(), true),
            SelectionOutcome::Chosen("This is me trying".into())
        );
    }

    #[test]
    fn defaults() {
        let cfg = SelectorConfig::default();
        assert!((cfg.temperature - 0.6).abs() < f32::EPSILON);
        assert_eq!(cfg.max_tokens, 150);
        assert!(!cfg.require_candidate_match);
    }
}
