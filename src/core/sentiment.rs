//! Sentiment extractor: reads the model's self-reported `[[SCORE: x]]` tag
//!
//! The tag is a convention the model is asked to follow, not a guarantee.
//! A missing or malformed tag leaves the reply untouched.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `[[SCORE: <signed number>]]`, keyword case-insensitive, inner spaces allowed
    static ref RE_SCORE_TAG: Regex = Regex::new(
        r"(?i)\[\[\s*score\s*:\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+))\s*\]\]"
    ).unwrap();
}

/// Appended to the system instruction when scoring is enabled
pub const SCORE_INSTRUCTION: &str = "At the very end of every reply, append the user's current \
emotional state as a tag in exactly this form: [[SCORE: x]] where x is a number from -1.0 \
(severe distress) to 1.0 (very positive). Never mention or explain the tag.";

/// Stateless tag parser
#[derive(Debug, Default, Clone, Copy)]
pub struct SentimentExtractor;

impl SentimentExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Split raw model text into (clean text, clamped score).
    ///
    /// With several tags the last one wins and only it is removed.
    pub fn extract(&self, raw: &str) -> (String, Option<f64>) {
        let Some(caps) = RE_SCORE_TAG.captures_iter(raw).last() else {
            return (raw.to_string(), None);
        };
        let (Some(tag), Some(number)) = (caps.get(0), caps.get(1)) else {
            return (raw.to_string(), None);
        };
        let Ok(score) = number.as_str().parse::<f64>() else {
            return (raw.to_string(), None);
        };

        let before = raw[..tag.start()].trim_end();
        let after = raw[tag.end()..].trim_start();
        let clean = match (before.is_empty(), after.is_empty()) {
            (_, true) => before.to_string(),
            (true, false) => after.to_string(),
            (false, false) => format!("{} {}", before, after),
        };

        (clean, Some(score.clamp(-1.0, 1.0)))
    }
}

/// Convenience wrapper around [`SentimentExtractor::extract`]
pub fn extract(raw: &str) -> (String, Option<f64>) {
    SentimentExtractor.extract(raw)
}

// =============================================================================
// TESTS
// =============================================================================
