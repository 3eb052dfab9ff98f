//! Conversation turn types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
    System,
}

impl Speaker {
    /// Display label used in transcript logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
            Self::System => "System",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether a logged message is still in progress or confirmed complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completeness {
    Partial,
    Complete,
}

impl Completeness {
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Partial)
    }

    /// Marker written into the text transcript
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Partial => "PARTIAL",
            Self::Complete => "COMPLETE",
        }
    }
}

/// One completed utterance within a conversation
///
/// Append-only: once written to the transcript a record is never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub completeness: Completeness,
}

impl TurnRecord {
    /// Create a final (complete) turn record stamped now
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            timestamp: Utc::now(),
            completeness: Completeness::Complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaker_labels() {
        assert_eq!(Speaker::User.label(), "User");
        assert_eq!(Speaker::Assistant.label(), "Assistant");
        assert_eq!(Speaker::System.to_string(), "System");
    }

    #[test]
    fn test_turn_record_is_complete() {
        let turn = TurnRecord::new(Speaker::User, "hello");
        assert_eq!(turn.completeness, Completeness::Complete);
        assert!(!turn.completeness.is_partial());
    }
}
