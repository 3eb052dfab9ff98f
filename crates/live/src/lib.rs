//! Hosted live-API session adapter
//!
//! Bridges one browser call to the hosted conversational voice model:
//! - `client` connects to the hosted live API over websocket
//! - `normalize` collapses the heterogeneous wire shapes into [`LiveEvent`]
//! - `demux` classifies each event and maintains utterance accumulators
//! - `session` runs the per-call queues and cooperative tasks

pub mod accumulator;
pub mod client;
pub mod demux;
pub mod event;
pub mod normalize;
pub mod session;

pub use accumulator::UtteranceAccumulator;
pub use client::{GeminiLiveClient, LiveCallConfig, LiveSink, LiveStream};
pub use demux::{DemuxConfig, EventDemux, SessionUpdate};
pub use event::LiveEvent;
pub use normalize::normalize;
pub use session::CallSession;

use thiserror::Error;

/// Live session errors
#[derive(Error, Debug)]
pub enum LiveError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Missing API key")]
    MissingApiKey,

    #[error("Session closed")]
    Closed,
}
