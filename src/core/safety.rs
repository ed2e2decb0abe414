//! Safety filter: keyword scan for self-harm language
//!
//! Plain substring alternations, case-insensitive. No word boundaries,
//! stemming or negation handling: quoting a phrase still trips the filter.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::{SafetyCategory, SafetyVerdict};

lazy_static! {
    // =========================================================================
    // Category 1: Direct self-harm / suicide expressions (English + Chinese)
    // =========================================================================
    static ref RE_SELF_HARM: Regex = Regex::new(
        r"(?i)(自杀|suicide|kill myself|want to die|不想活了|去死|跳楼|割腕)"
    ).unwrap();

    // =========================================================================
    // Category 2: Hopelessness expressions
    // =========================================================================
    static ref RE_HOPELESSNESS: Regex = Regex::new(
        r"(?i)(绝望|hopeless|无路可走)"
    ).unwrap();
}

/// Stateless crisis classifier for user turns
#[derive(Debug, Default, Clone, Copy)]
pub struct SafetyFilter;

impl SafetyFilter {
    pub fn new() -> Self {
        Self
    }

    /// Scan text and report which category matched, self-harm first
    pub fn scan(&self, text: &str) -> SafetyVerdict {
        let checks = [
            (&*RE_SELF_HARM, SafetyCategory::SelfHarm),
            (&*RE_HOPELESSNESS, SafetyCategory::Hopelessness),
        ];

        for (regex, category) in checks {
            if let Some(m) = regex.find(text) {
                return SafetyVerdict::Crisis {
                    category,
                    matched: m.as_str().to_string(),
                };
            }
        }

        SafetyVerdict::Clear
    }

    /// True when any danger phrase occurs in the text
    pub fn is_crisis(&self, text: &str) -> bool {
        RE_SELF_HARM.is_match(text) || RE_HOPELESSNESS.is_match(text)
    }
}

// =============================================================================
// TESTS
// =============================================================================
