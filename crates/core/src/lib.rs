//! Core types for the Maxwell voice assistant
//!
//! This crate provides foundational types used across all other crates:
//! - Audio payload helpers (PCM16 encode/decode)
//! - Error types
//! - Conversation turn types

pub mod audio;
pub mod conversation;
pub mod error;

pub use audio::{AudioChunk, DEFAULT_INPUT_SAMPLE_RATE, DEFAULT_OUTPUT_SAMPLE_RATE};
pub use conversation::{Completeness, Speaker, TurnRecord};
pub use error::{Error, Result};
