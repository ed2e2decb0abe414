//! Output structures for a completed exchange

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::types::MoodBand;

/// Outcome of one user submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub timestamp: DateTime<Utc>,
    /// Safety filter tripped on the user text; the model was not called
    pub crisis: bool,
    /// Model's own score crossed the crisis threshold
    pub escalated: bool,
    /// Reply text with any score tag removed
    pub reply: Option<String>,
    /// Clamped score parsed from the reply
    pub score: Option<f64>,
    /// Current mood after this exchange, when scoring is enabled
    pub mood: Option<f64>,
    pub band: Option<MoodBand>,
    /// Turns added to the store by this exchange (user turn included)
    pub turns_appended: usize,
}

impl Exchange {
    /// Keyword-path exchange: user turn plus crisis card
    pub fn crisis() -> Self {
        Self {
            timestamp: Utc::now(),
            crisis: true,
            escalated: false,
            reply: None,
            score: None,
            mood: None,
            band: None,
            turns_appended: 2,
        }
    }

    /// Normal-path exchange
    pub fn reply(reply: String, score: Option<f64>, mood: Option<f64>, escalated: bool) -> Self {
        Self {
            timestamp: Utc::now(),
            crisis: false,
            escalated,
            reply: Some(reply),
            score,
            mood,
            band: mood.map(MoodBand::from_score),
            turns_appended: if escalated { 3 } else { 2 },
        }
    }

    /// Mood status line for the terminal (with colors)
    pub fn to_terminal_string(&self) -> Option<String> {
        let (mood, band) = (self.mood?, self.band?);
        let score = match self.score {
            Some(s) => format!("{:+.2}", s),
            None => "carried".to_string(),
        };
        let line = format!("{} mood={:+.2} ({}) | score={}", band.emoji(), mood, band, score);
        Some(line.color(band.color()).dimmed().to_string())
    }

    /// Mood status line without colors
    pub fn to_parseable_string(&self) -> Option<String> {
        let (mood, band) = (self.mood?, self.band?);
        let score = self
            .score
            .map(|s| format!("{:.2}", s))
            .unwrap_or_else(|| "none".to_string());
        Some(format!(
            "mood={:.2} | band={} | score={} | escalated={}",
            mood, band, score, self.escalated
        ))
    }
}
