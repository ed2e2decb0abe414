//! Core types for MindSpace

mod crisis;
mod mood;
mod output;
mod turn;
mod verdict;

pub use crisis::CrisisCard;
pub use mood::{is_crisis_score, MoodBand, MoodSummary, MoodTrack};
pub use output::Exchange;
pub use turn::{ConversationStore, Speaker, Turn};
pub use verdict::{SafetyCategory, SafetyVerdict};
