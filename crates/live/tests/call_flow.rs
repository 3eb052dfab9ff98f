//! End-to-end call flow over a scripted live session
//!
//! Drives a full conversation through the real demultiplexer and logger:
//! scripted server messages in all three wire shapes on one side, the
//! transcript files on disk on the other.

use std::fs;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::Mutex;

use maxwell_core::{audio, Speaker};
use maxwell_live::{
    CallSession, DemuxConfig, EventDemux, LiveError, LiveSink, LiveStream,
};
use maxwell_persistence::{ConversationLogger, LogStore};

struct NullSink {
    closed: Arc<Mutex<bool>>,
}

#[async_trait]
impl LiveSink for NullSink {
    async fn send_audio(&mut self, _pcm: &[i16]) -> Result<(), LiveError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), LiveError> {
        *self.closed.lock().await = true;
        Ok(())
    }
}

struct ScriptedStream {
    script: Vec<Value>,
    fail_at_end: bool,
}

#[async_trait]
impl LiveStream for ScriptedStream {
    async fn next_event(&mut self) -> Result<Option<Value>, LiveError> {
        if self.script.is_empty() {
            if self.fail_at_end {
                return Err(LiveError::Transport("connection reset".to_string()));
            }
            return Ok(None);
        }
        Ok(Some(self.script.remove(0)))
    }
}

fn spawn_call(dir: &TempDir, script: Vec<Value>, fail_at_end: bool) -> (CallSession, String) {
    let logger = ConversationLogger::start(dir.path(), dir.path().join("fallback"));
    let conversation_id = logger.conversation_id().unwrap().to_string();

    let (audio_tx, audio_rx, update_tx, update_rx) = CallSession::channels();
    let demux = EventDemux::new(DemuxConfig::default(), logger, audio_tx).with_updates(update_tx);

    let sink = NullSink {
        closed: Arc::new(Mutex::new(false)),
    };
    let stream = ScriptedStream { script, fail_at_end };

    let session = CallSession::spawn(sink, stream, demux, audio_rx, update_rx);
    (session, conversation_id)
}

#[tokio::test]
async fn test_full_conversation_is_logged_across_wire_shapes() {
    let dir = TempDir::new().unwrap();
    let pcm = vec![42i16; 480];

    // One conversation arriving over all three wire shapes.
    let script = vec![
        // Typed shape: audio plus user speech.
        json!({ "data": audio::encode_audio(&pcm) }),
        json!({ "recognized_speech": "I would like to hear" }),
        json!({ "recognized_speech": "more about pricing", "is_final": true }),
        // Nested snake_case shape: assistant reply.
        json!({ "server_content": {
            "model_turn": { "parts": [ { "text": "Happy to walk you through it." } ] }
        }}),
        json!({ "server_content": { "turn_complete": true } }),
        // Raw camelCase mapping: a second user turn.
        json!({ "serverContent": { "inputTranscription": { "text": "sounds good" } } }),
        json!({ "serverContent": { "activityEnd": true } }),
    ];

    let (mut session, conversation_id) = spawn_call(&dir, script, false);

    let mut audio_rx = session.take_audio_output().unwrap();
    let chunk = audio_rx.recv().await.unwrap();
    assert_eq!(chunk.samples, pcm);
    assert_eq!(chunk.duration_ms(), 20);

    // The stream ends by itself; drain the final updates before shutdown.
    let mut updates = session.take_updates().unwrap();
    let mut finals = Vec::new();
    while let Some(update) = updates.recv().await {
        if update.is_final {
            finals.push((update.speaker, update.text));
        }
    }

    let history = session.shutdown().await;

    assert_eq!(history.len(), 3);
    assert_eq!(history[0].speaker, Speaker::User);
    assert_eq!(history[0].text, "I would like to hear more about pricing");
    assert_eq!(history[1].speaker, Speaker::Assistant);
    assert_eq!(history[1].text, "Happy to walk you through it.");
    assert_eq!(history[2].speaker, Speaker::User);
    assert_eq!(history[2].text, "sounds good");
    assert_eq!(finals.len(), 3);

    // Text transcript carries every final, no audio entries.
    let text = fs::read_to_string(dir.path().join(format!("{}.txt", conversation_id))).unwrap();
    assert!(text.contains("User [COMPLETE]: I would like to hear more about pricing"));
    assert!(text.contains("Assistant [COMPLETE]: Happy to walk you through it."));
    assert!(text.contains("Conversation ended:"));
    assert!(!text.contains("audio"));

    // JSON log counters match the durable history.
    let data: Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join(format!("{}.json", conversation_id))).unwrap(),
    )
    .unwrap();
    assert_eq!(data["message_count"], 3);
    assert_eq!(data["user_message_count"], 2);
    assert_eq!(data["assistant_message_count"], 1);

    // The finished conversation shows up in the store with duration stats.
    let store = LogStore::new(dir.path());
    let stats = store.stats();
    assert_eq!(stats.total_conversations, 1);
    assert_eq!(stats.total_messages, 3);
}

#[tokio::test]
async fn test_upstream_error_logs_system_message_and_ends() {
    let dir = TempDir::new().unwrap();
    let script = vec![json!({ "recognized_speech": "hello there", "is_final": true })];

    let (session, conversation_id) = spawn_call(&dir, script, true);

    // The transport error terminates the drain task on its own.
    let history = session.shutdown().await;
    assert_eq!(history.len(), 1);

    let text = fs::read_to_string(dir.path().join(format!("{}.txt", conversation_id))).unwrap();
    assert!(text.contains("System [COMPLETE]: Error: Transport error: connection reset"));
    assert!(text.contains("Conversation ended:"));
}
