//! AI-likeness scoring boundary.

use std::fmt;

use crate::text::{char_len, word_count};

/// Opaque "AI rate" percentage, 0 to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AiRate(u8);

impl AiRate {
    pub fn new(percent: u8) -> Self {
        Self(percent.min(100))
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    pub fn band(self) -> RateBand {
        match self.0 {
            p if p < 30 => RateBand::Low,
            p if p < 70 => RateBand::Medium,
            _ => RateBand::High,
        }
    }
}

impl fmt::Display for AiRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateBand {
    Low,
    Medium,
    High,
}

pub trait AiDetector: Send {
    /// Scores `text`. Returns `None` when there is nothing to score.
    fn score(&self, text: &str) -> Option<AiRate>;
}

/// Stand-in detector with a stable, content-derived score.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderDetector;

impl AiDetector for PlaceholderDetector {
    fn score(&self, text: &str) -> Option<AiRate> {
        if text.trim().is_empty() {
            return None;
        }
        let jitter = (word_count(text) * 7) % 20;
        let base = char_len(text) % 80;
        Some(AiRate::new((jitter + base).min(100) as u8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands() {
        assert_eq!(AiRate::new(0).band(), RateBand::Low);
        assert_eq!(AiRate::new(29).band(), RateBand::Low);
        assert_eq!(AiRate::new(30).band(), RateBand::Medium);
        assert_eq!(AiRate::new(69).band(), RateBand::Medium);
        assert_eq!(AiRate::new(70).band(), RateBand::High);
        assert_eq!(AiRate::new(200).percent(), 100);
    }

    #[test]
    fn placeholder_skips_blank_text() {
        assert_eq!(PlaceholderDetector.score("   \n"), None);
    }

    #[test]
    fn placeholder_is_deterministic() {
        let text = "The quick brown fox jumps over the lazy dog.";
        let a = PlaceholderDetector.score(text).unwrap();
        assert_eq!(Some(a), PlaceholderDetector.score(text));
        assert!(a.percent() <= 100);
    }
}
