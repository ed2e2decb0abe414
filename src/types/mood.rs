//! Mood bands and the rolling mood sequence

use colored::Color;
use serde::{Deserialize, Serialize};

use crate::{MOOD_CRISIS_THRESHOLD, MOOD_EXCELLENT_MIN, MOOD_GOOD_MIN, MOOD_LOW_MIN, MOOD_NEUTRAL_MIN};

/// Display band for a mood score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoodBand {
    Excellent,
    Good,
    Neutral,
    Low,
    Stressed,
}

impl MoodBand {
    pub fn from_score(score: f64) -> Self {
        if score >= MOOD_EXCELLENT_MIN {
            MoodBand::Excellent
        } else if score >= MOOD_GOOD_MIN {
            MoodBand::Good
        } else if score >= MOOD_NEUTRAL_MIN {
            MoodBand::Neutral
        } else if score >= MOOD_LOW_MIN {
            MoodBand::Low
        } else {
            MoodBand::Stressed
        }
    }

    /// Terminal color
    pub fn color(&self) -> Color {
        match self {
            MoodBand::Excellent => Color::Green,
            MoodBand::Good => Color::Cyan,
            MoodBand::Neutral => Color::White,
            MoodBand::Low => Color::Yellow,
            MoodBand::Stressed => Color::Red,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            MoodBand::Excellent => "🌟",
            MoodBand::Good => "🙂",
            MoodBand::Neutral => "😐",
            MoodBand::Low => "🌧",
            MoodBand::Stressed => "⛈",
        }
    }
}

impl std::fmt::Display for MoodBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MoodBand::Excellent => "Excellent",
            MoodBand::Good => "Good",
            MoodBand::Neutral => "Neutral",
            MoodBand::Low => "Low",
            MoodBand::Stressed => "Stressed",
        };
        write!(f, "{}", name)
    }
}

/// Rolling mood samples, most recent last.
///
/// Never empty: starts at `[0.0]` and a missing score repeats the last value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodTrack {
    samples: Vec<f64>,
}

impl Default for MoodTrack {
    fn default() -> Self {
        Self::new()
    }
}

impl MoodTrack {
    pub fn new() -> Self {
        Self { samples: vec![0.0] }
    }

    /// Append one sample for a completed exchange; `None` carries forward
    pub fn record(&mut self, score: Option<f64>) -> f64 {
        let value = match score {
            Some(s) => s.clamp(-1.0, 1.0),
            None => self.current(),
        };
        self.samples.push(value);
        value
    }

    pub fn current(&self) -> f64 {
        self.samples.last().copied().unwrap_or(0.0)
    }

    pub fn band(&self) -> MoodBand {
        MoodBand::from_score(self.current())
    }

    pub fn history(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.samples.push(0.0);
    }

    /// One block glyph per sample, -1.0 lowest to 1.0 highest
    pub fn sparkline(&self) -> String {
        const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
        self.samples
            .iter()
            .map(|s| {
                let idx = ((s.clamp(-1.0, 1.0) + 1.0) / 2.0 * 7.0).round() as usize;
                BARS[idx.min(7)]
            })
            .collect()
    }

    /// Snapshot for API responses
    pub fn summary(&self) -> MoodSummary {
        MoodSummary {
            current: self.current(),
            band: self.band(),
            history: self.samples.clone(),
        }
    }
}

/// Whether a self-reported score calls for a crisis card
pub fn is_crisis_score(score: f64) -> bool {
    score <= MOOD_CRISIS_THRESHOLD
}

/// Serializable view of a mood track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodSummary {
    pub current: f64,
    pub band: MoodBand,
    pub history: Vec<f64>,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_band_edges() {
        assert_eq!(MoodBand::from_score(1.0), MoodBand::Excellent);
        assert_eq!(MoodBand::from_score(0.6), MoodBand::Excellent);
        assert_eq!(MoodBand::from_score(0.59), MoodBand::Good);
        assert_eq!(MoodBand::from_score(0.2), MoodBand::Good);
        assert_eq!(MoodBand::from_score(0.19), MoodBand::Neutral);
        assert_eq!(MoodBand::from_score(-0.2), MoodBand::Neutral);
        assert_eq!(MoodBand::from_score(-0.21), MoodBand::Low);
        assert_eq!(MoodBand::from_score(-0.6), MoodBand::Low);
        assert_eq!(MoodBand::from_score(-0.61), MoodBand::Stressed);
        assert_eq!(MoodBand::from_score(-1.0), MoodBand::Stressed);
    }

    #[test]
    fn test_new_track_is_neutral() {
        let track = MoodTrack::new();
        assert_eq!(track.history(), &[0.0]);
        assert_eq!(track.band(), MoodBand::Neutral);
    }

    #[test]
    fn test_missing_score_carries_forward() {
        let mut track = MoodTrack::new();
        track.record(Some(0.4));
        let value = track.record(None);
        assert_eq!(value, 0.4);
        assert_eq!(track.history(), &[0.0, 0.4, 0.4]);
    }

    #[test]
    fn test_record_clamps() {
        let mut track = MoodTrack::new();
        assert_eq!(track.record(Some(3.0)), 1.0);
        assert_eq!(track.record(Some(-3.0)), -1.0);
    }

    #[test]
    fn test_reset() {
        let mut track = MoodTrack::new();
        track.record(Some(-0.5));
        track.record(Some(0.9));
        track.reset();
        assert_eq!(track.history(), &[0.0]);
    }

    #[test]
    fn test_sparkline() {
        let mut track = MoodTrack::new();
        track.record(Some(-1.0));
        track.record(Some(1.0));
        assert_eq!(track.sparkline(), "▅▁█");
    }

    #[test]
    fn test_crisis_score_threshold() {
        assert!(is_crisis_score(-0.9));
        assert!(is_crisis_score(-1.0));
        assert!(!is_crisis_score(-0.89));
    }

    #[test]
    fn test_band_display() {
        assert_eq!(MoodBand::Stressed.to_string(), "Stressed");
        let json = serde_json::to_string(&MoodBand::Good).unwrap();
        assert_eq!(json, "\"GOOD\"");
    }
}
