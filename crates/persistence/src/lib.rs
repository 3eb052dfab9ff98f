//! File-backed persistence for conversation transcripts
//!
//! Each conversation produces one human-readable `.txt` transcript and one
//! machine-readable `.json` document, named by a timestamp-derived
//! conversation identifier. Logging is best-effort: write failures are
//! reported to diagnostics and never abort an active conversation.

pub mod logger;
pub mod store;

pub use logger::ConversationLogger;
pub use store::{ConversationDetail, ConversationSummary, LogStats, LogStore};

use thiserror::Error;

/// Persistence error types
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("Invalid conversation id: {0}")]
    InvalidId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Export error: {0}")]
    Export(String),
}
