//! Word scoring policy.

/// Points awarded for owning a word. Losing the word (stolen or returned)
/// takes the same number of points away.
pub trait Scoring: Send + Sync + 'static {
    fn score(&self, word: &str) -> u32;
}

/// One point per letter.
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthScoring;

impl Scoring for LengthScoring {
    fn score(&self, word: &str) -> u32 {
        u32::try_from(word.chars().count()).unwrap_or(u32::MAX)
    }
}
