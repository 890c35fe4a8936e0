//! Versioned prompt table for lyric selection.
//!
//! Tuning the instruction or the worked examples happens here and bumps
//! [`PROMPT_VERSION`]; the engine only calls [`build_messages`].

use index::Candidate;

use crate::types::ChatMessage;

/// Bumped whenever the instruction or any example changes.
pub const PROMPT_VERSION: &str = "select-v1";

/// The exact reply meaning "none of the candidates fit".
pub const NO_MATCH_SENTINEL: &str = "no match";

pub const SYSTEM_INSTRUCTION: &str = "You match a person's question to a Taylor Swift lyric. \
You will be given the question and a numbered list of candidate lyrics. \
Choose the single candidate that best matches the emotional content of the question \
and reply with that lyric exactly as written, with no numbering, quotes or commentary. \
If none of the candidates genuinely fits the feeling behind the question, reply with exactly: no match";

/// One worked exchange prepended to every request.
#[derive(Debug, Clone, Copy)]
pub struct FewShot {
    pub question: &'static str,
    pub candidates: &'static [&'static str],
    pub answer: &'static str,
}

/// Exactly three anchors: an empowerment match, a heartbreak match and a
/// deliberate no-match.
pub const FEW_SHOTS: [FewShot; 3] = [
    FewShot {
        question: "How do I stop caring what everyone thinks of me?",
        candidates: &[
            "I'm the only one of me, baby, that's the fun of me",
            "Shake it off",
            "You are the best thing that's ever been mine",
        ],
        answer: "Shake it off",
    },
    FewShot {
        question: "Why does it still hurt so much months after we broke up?",
        candidates: &[
            "Band-aids don't fix bullet holes",
            "All too well, and I was there",
            "I'm walking on sunshine",
        ],
        answer: "Band-aids don't fix bullet holes",
    },
    FewShot {
        question: "What's the fastest way to fix a flat bike tire?",
        candidates: &[
            "Long story short, I survived",
            "We were both young when I first saw you",
        ],
        answer: NO_MATCH_SENTINEL,
    },
];

fn render_turn<'a>(question: &str, candidates: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = format!("Question: {question}\nCandidates:");
    for (i, text) in candidates.into_iter().enumerate() {
        out.push_str(&format!("\n{}. {text}", i + 1));
    }
    out
}

/// System instruction, three (user, assistant) examples, then the real question.
pub fn build_messages(question: &str, candidates: &[Candidate]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2 + FEW_SHOTS.len() * 2);
    messages.push(ChatMessage::system(SYSTEM_INSTRUCTION));
    for shot in FEW_SHOTS.iter() {
        messages.push(ChatMessage::user(render_turn(
            shot.question,
            shot.candidates.iter().copied(),
        )));
        messages.push(ChatMessage::assistant(shot.answer));
    }
    messages.push(ChatMessage::user(render_turn(
        question,
        candidates.iter().map(|c| c.text.as_str()),
    )));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn message_layout_is_fixed() {
        let msgs = build_messages("Will this feeling ever pass?", &[Candidate::new("This is me trying", 0.8)]);
        assert_eq!(msgs.len(), 8);
        assert_eq!(msgs[0].role, Role::System);
        for pair in msgs[1..7].chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
        }
        assert_eq!(msgs[7].role, Role::User);
        assert_eq!(
            msgs[7].content,
            "Question: Will this feeling ever pass?\nCandidates:\n1. This is me trying"
        );
    }

    #[test]
    fn examples_cover_match_and_no_match() {
        assert_eq!(FEW_SHOTS.len(), 3);
        assert_eq!(FEW_SHOTS[2].answer, NO_MATCH_SENTINEL);
        for shot in &FEW_SHOTS[..2] {
            assert!(shot.candidates.contains(&shot.answer));
        }
    }

    #[test]
    fn instruction_names_the_sentinel() {
        assert!(SYSTEM_INSTRUCTION.ends_with(NO_MATCH_SENTINEL));
    }

    #[test]
    fn candidates_are_numbered_in_order() {
        let msgs = build_messages(
            "q",
            &[Candidate::new("first", 0.9), Candidate::new("second", 0.8)],
        );
        assert!(msgs[7].content.ends_with("1. first\n2. second"));
    }
}
