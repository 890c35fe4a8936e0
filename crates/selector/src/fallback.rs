/// On-brand non-answers served when no lyric fits.
pub const FALLBACK_MESSAGES: [&str; 5] = [
    "Some feelings are still waiting for their song.",
    "Not every question has found its lyric yet.",
    "Even Taylor doesn't have words for everything.",
    "This one's still between the lines.",
    "Sometimes silence says more than lyrics can.",
];

/// Uniform pick from [`FALLBACK_MESSAGES`]. Serving one is a success, not an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackPicker;

impl FallbackPicker {
    pub fn new() -> Self {
        Self
    }

    pub fn pick(&self) -> &'static str {
        FALLBACK_MESSAGES[fastrand::usize(..FALLBACK_MESSAGES.len())]
    }

    /// Same as [`pick`](Self::pick) with a caller-owned generator.
    pub fn pick_with(&self, rng: &mut fastrand::Rng) -> &'static str {
        FALLBACK_MESSAGES[rng.usize(..FALLBACK_MESSAGES.len())]
    }
}
