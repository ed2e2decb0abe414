//! MindSpace: peer-support chat client
//!
//! CLI / API → SafetyFilter → (CrisisCard | ModelGateway → SentimentExtractor) → transcript

pub mod config;
pub mod core;
pub mod error;
pub mod types;

// =============================================================================
// REMOTE MODEL [C]
// =============================================================================

/// Default Generative Language API base
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model id
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Sampling temperature sent with every request
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Fixed request timeout (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// MOOD BANDS [C]
// =============================================================================

/// score >= 0.6
pub const MOOD_EXCELLENT_MIN: f64 = 0.6;

/// 0.2 <= score < 0.6
pub const MOOD_GOOD_MIN: f64 = 0.2;

/// -0.2 <= score < 0.2
pub const MOOD_NEUTRAL_MIN: f64 = -0.2;

/// -0.6 <= score < -0.2, anything lower is Stressed
pub const MOOD_LOW_MIN: f64 = -0.6;

/// Self-reported score at or below this escalates to a crisis card.
/// Deliberately stricter than the keyword path, which trips on any match.
pub const MOOD_CRISIS_THRESHOLD: f64 = -0.9;

// =============================================================================
// TRANSCRIPT [C]
// =============================================================================

/// Characters revealed per typing chunk
pub const TYPING_CHUNK_CHARS: usize = 3;

/// Delay between typing chunks (milliseconds)
pub const TYPING_DELAY_MS: u64 = 5;

/// Opening assistant turn of every session
pub const GREETING: &str = "Hey there. How's life at PolyU treating you?";

/// Separator between exported turns
pub const EXPORT_SEPARATOR: &str = "----------";

/// Stands in for crisis cards in exported transcripts
pub const EXPORT_CRISIS_PLACEHOLDER: &str = "[Crisis support card shown]";

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
