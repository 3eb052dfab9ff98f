//! Normalized live session events

use maxwell_core::Speaker;

/// One semantic event from the hosted session, after normalization
///
/// Raw wire messages arrive in several shapes; [`crate::normalize`] is the
/// only place that knows about them. Everything downstream matches
/// exhaustively over this enum.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    /// Decoded model audio ready for playback
    AudioChunk(Vec<i16>),
    /// Recognized user speech, not yet confirmed complete
    PartialUserText(String),
    /// Recognized user speech carrying the final flag
    FinalUserText(String),
    /// A fragment of the model's text response
    PartialAssistantText(String),
    /// A model text fragment carrying the final flag
    FinalAssistantText(String),
    /// The given role's turn is complete
    TurnComplete(Speaker),
}

impl LiveEvent {
    /// Short tag used in trace output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AudioChunk(_) => "audio_chunk",
            Self::PartialUserText(_) => "partial_user_text",
            Self::FinalUserText(_) => "final_user_text",
            Self::PartialAssistantText(_) => "partial_assistant_text",
            Self::FinalAssistantText(_) => "final_assistant_text",
            Self::TurnComplete(_) => "turn_complete",
        }
    }
}
