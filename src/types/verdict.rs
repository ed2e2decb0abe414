//! Safety filter verdicts

use serde::{Deserialize, Serialize};

/// Which family of danger phrases matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyCategory {
    /// Direct self-harm or suicide expression
    SelfHarm,
    /// Hopelessness expression
    Hopelessness,
}

impl SafetyCategory {
    /// Code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::SelfHarm => "SELF_HARM",
            Self::Hopelessness => "HOPELESSNESS",
        }
    }
}

/// Result of scanning one user turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyVerdict {
    Clear,
    Crisis {
        category: SafetyCategory,
        /// The phrase as it appeared in the input
        matched: String,
    },
}

impl SafetyVerdict {
    pub fn is_crisis(&self) -> bool {
        matches!(self, SafetyVerdict::Crisis { .. })
    }

    pub fn category(&self) -> Option<SafetyCategory> {
        match self {
            SafetyVerdict::Clear => None,
            SafetyVerdict::Crisis { category, .. } => Some(*category),
        }
    }
}

impl std::fmt::Display for SafetyVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SafetyVerdict::Clear => write!(f, "CLEAR"),
            SafetyVerdict::Crisis { category, matched } => {
                write!(f, "CRISIS[{}]: {:?}", category.code(), matched)
            }
        }
    }
}
