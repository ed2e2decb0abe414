//! Transcript renderer: full-history replay and the typing reveal
//!
//! Rendering is a projection of session state and never mutates it.

use std::io::{self, Write};
use std::time::Duration;

use colored::Colorize;

use crate::core::crisis::build_crisis_card;
use crate::types::{Speaker, Turn};
use crate::{TYPING_CHUNK_CHARS, TYPING_DELAY_MS};

/// Cadence of the cosmetic reveal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingEffect {
    pub chunk_chars: usize,
    pub delay: Duration,
}

impl Default for TypingEffect {
    fn default() -> Self {
        Self {
            chunk_chars: TYPING_CHUNK_CHARS,
            delay: Duration::from_millis(TYPING_DELAY_MS),
        }
    }
}

impl TypingEffect {
    /// Whole reply in one write
    pub fn instant() -> Self {
        Self {
            chunk_chars: usize::MAX,
            delay: Duration::ZERO,
        }
    }

    pub fn is_instant(&self) -> bool {
        self.delay.is_zero()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TranscriptRenderer {
    pub color: bool,
    pub typing: TypingEffect,
}

impl Default for TranscriptRenderer {
    fn default() -> Self {
        Self::new(true, TypingEffect::default())
    }
}

impl TranscriptRenderer {
    pub fn new(color: bool, typing: TypingEffect) -> Self {
        Self { color, typing }
    }

    /// Speaker label, colored per speaker
    fn label(&self, speaker: Speaker) -> String {
        let text = match speaker {
            Speaker::User => "You",
            Speaker::Assistant => "MindSpace",
        };
        if !self.color {
            return format!("{}:", text);
        }
        match speaker {
            Speaker::User => format!("{}:", text).bold().to_string(),
            Speaker::Assistant => format!("{}:", text).cyan().bold().to_string(),
        }
    }

    /// Draw one stored turn
    pub fn render_turn(&self, turn: &Turn, out: &mut impl Write) -> io::Result<()> {
        if turn.is_crisis_card {
            writeln!(out, "{}", build_crisis_card().to_terminal_string(self.color))?;
        } else {
            writeln!(out, "{} {}", self.label(turn.speaker), turn.text)?;
        }
        writeln!(out)
    }

    /// Replay the whole transcript in order
    pub fn render_history(&self, turns: &[Turn], out: &mut impl Write) -> io::Result<()> {
        for turn in turns {
            self.render_turn(turn, out)?;
        }
        out.flush()
    }

    /// Shown while the gateway call is in flight
    pub fn thinking(&self, out: &mut impl Write) -> io::Result<()> {
        let text = "Thinking...";
        if self.color {
            write!(out, "{}", text.dimmed())?;
        } else {
            write!(out, "{}", text)?;
        }
        out.flush()
    }

    /// Erase the thinking indicator
    pub fn clear_thinking(&self, out: &mut impl Write) -> io::Result<()> {
        write!(out, "\r{}\r", " ".repeat("Thinking...".len()))?;
        out.flush()
    }

    /// Reveal a fresh assistant reply chunk by chunk
    pub fn stream_reply(&self, text: &str, out: &mut impl Write) -> io::Result<()> {
        write!(out, "{} ", self.label(Speaker::Assistant))?;

        if self.typing.is_instant() {
            write!(out, "{}", text)?;
        } else {
            let chars: Vec<char> = text.chars().collect();
            for chunk in chars.chunks(self.typing.chunk_chars.max(1)) {
                let piece: String = chunk.iter().collect();
                write!(out, "{}", piece)?;
                out.flush()?;
                std::thread::sleep(self.typing.delay);
            }
        }

        writeln!(out)?;
        writeln!(out)?;
        out.flush()
    }
}

// =============================================================================
// TESTS
// =============================================================================
