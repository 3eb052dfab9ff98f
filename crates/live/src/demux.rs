//! Session Event Demultiplexer
//!
//! Classifies each normalized live event and updates session state: audio
//! goes to the playback queue, text accumulates per role, finals are
//! durably logged and appended to the turn history before the accumulator
//! is cleared.

use serde_json::Value;
use tokio::sync::mpsc;

use maxwell_core::{AudioChunk, Speaker, TurnRecord};
use maxwell_persistence::ConversationLogger;

use crate::accumulator::UtteranceAccumulator;
use crate::event::LiveEvent;
use crate::normalize::normalize;

/// Demultiplexer tuning
#[derive(Debug, Clone)]
pub struct DemuxConfig {
    /// Sample rate stamped onto playback chunks
    pub output_sample_rate: u32,
    /// Minimum accumulated user text before a partial is logged
    pub user_partial_threshold: usize,
    /// Assistant text growth (chars) between partial log entries
    pub assistant_partial_delta: usize,
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self {
            output_sample_rate: maxwell_core::DEFAULT_OUTPUT_SAMPLE_RATE,
            user_partial_threshold: 10,
            assistant_partial_delta: 50,
        }
    }
}

/// Transcript update pushed towards the browser client
#[derive(Debug, Clone)]
pub struct SessionUpdate {
    pub speaker: Speaker,
    pub text: String,
    pub is_final: bool,
}

/// Per-session event demultiplexer
///
/// Owned by exactly one call's event-draining task; never shared.
pub struct EventDemux {
    config: DemuxConfig,
    user: UtteranceAccumulator,
    assistant: UtteranceAccumulator,
    history: Vec<TurnRecord>,
    logger: ConversationLogger,
    audio_tx: mpsc::UnboundedSender<AudioChunk>,
    update_tx: Option<mpsc::UnboundedSender<SessionUpdate>>,
    /// Assistant text length at the last partial log entry
    assistant_logged_len: usize,
}

impl EventDemux {
    pub fn new(
        config: DemuxConfig,
        logger: ConversationLogger,
        audio_tx: mpsc::UnboundedSender<AudioChunk>,
    ) -> Self {
        Self {
            config,
            user: UtteranceAccumulator::space_joined(),
            assistant: UtteranceAccumulator::contiguous(),
            history: Vec::new(),
            logger,
            audio_tx,
            update_tx: None,
            assistant_logged_len: 0,
        }
    }

    /// Forward transcript updates to the given channel
    pub fn with_updates(mut self, tx: mpsc::UnboundedSender<SessionUpdate>) -> Self {
        self.update_tx = Some(tx);
        self
    }

    /// Turn history accumulated so far
    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }

    /// Current user accumulator contents (empty after a final)
    pub fn pending_user_text(&self) -> &str {
        self.user.as_str()
    }

    /// Current assistant accumulator contents (empty after a final)
    pub fn pending_assistant_text(&self) -> &str {
        self.assistant.as_str()
    }

    /// Conversation identifier of the underlying log
    pub fn conversation_id(&self) -> Option<&str> {
        self.logger.conversation_id()
    }

    /// Normalize one raw server message and handle every resulting event
    pub fn handle_raw(&mut self, raw: &Value) {
        for event in normalize(raw) {
            self.handle(event);
        }
    }

    /// Handle one normalized event
    pub fn handle(&mut self, event: LiveEvent) {
        tracing::trace!(kind = event.kind(), "Handling live event");

        match event {
            LiveEvent::AudioChunk(pcm) => {
                let chunk = AudioChunk::new(self.config.output_sample_rate, pcm);
                // Receiver gone means playback stopped; nothing to do.
                let _ = self.audio_tx.send(chunk);
            }

            LiveEvent::PartialUserText(text) => {
                self.user.push(&text);
                if self.user.len() > self.config.user_partial_threshold {
                    let current = self.user.as_str().to_string();
                    self.logger.log_message(Speaker::User, &current, None, true);
                    self.push_update(Speaker::User, current, false);
                }
            }

            LiveEvent::FinalUserText(text) => {
                self.user.push(&text);
                self.flush(Speaker::User);
            }

            LiveEvent::PartialAssistantText(text) => {
                self.assistant.push(&text);
                if self.assistant.len() >= self.assistant_logged_len + self.config.assistant_partial_delta
                {
                    let current = self.assistant.as_str().to_string();
                    self.logger
                        .log_message(Speaker::Assistant, &current, None, true);
                    self.assistant_logged_len = self.assistant.len();
                    self.push_update(Speaker::Assistant, current, false);
                }
            }

            LiveEvent::FinalAssistantText(text) => {
                self.assistant.push(&text);
                self.flush(Speaker::Assistant);
            }

            LiveEvent::TurnComplete(speaker) => {
                // Repeated turn-complete signals on an empty accumulator
                // are no-ops.
                self.flush(speaker);
            }
        }
    }

    /// Record a system message in the conversation log
    pub fn system_message(&mut self, message: &str) {
        self.logger.log_system_message(message);
    }

    /// Flush one role's accumulator as a final message
    ///
    /// The final is durably logged before the accumulator is cleared.
    fn flush(&mut self, speaker: Speaker) {
        let text = match speaker {
            Speaker::User => self.user.as_str().to_string(),
            Speaker::Assistant => self.assistant.as_str().to_string(),
            Speaker::System => return,
        };
        if text.is_empty() {
            return;
        }

        self.logger.log_message(speaker, &text, None, false);
        self.history.push(TurnRecord::new(speaker, text.clone()));

        match speaker {
            Speaker::User => {
                self.user.take();
            }
            Speaker::Assistant => {
                self.assistant.take();
                self.assistant_logged_len = 0;
            }
            Speaker::System => {}
        }

        self.push_update(speaker, text, true);
    }

    /// Log any in-flight accumulators as partial entries (shutdown path)
    pub fn flush_partials(&mut self) {
        if !self.user.is_empty() {
            let text = self.user.take();
            self.logger.log_message(Speaker::User, &text, None, true);
        }
        if !self.assistant.is_empty() {
            let text = self.assistant.take();
            self.logger.log_message(Speaker::Assistant, &text, None, true);
            self.assistant_logged_len = 0;
        }
    }

    /// Flush in-flight partials, close the log and return the turn history
    pub fn finish(mut self) -> Vec<TurnRecord> {
        self.flush_partials();
        self.logger.end();
        self.history
    }

    fn push_update(&mut self, speaker: Speaker, text: String, is_final: bool) {
        if let Some(tx) = &self.update_tx {
            let _ = tx.send(SessionUpdate {
                speaker,
                text,
                is_final,
            });
        }
    }
}
