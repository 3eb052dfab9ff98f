//! Conversation Logger
//!
//! Durable, append-only record of one conversation: a text transcript for
//! humans and a JSON document for machines, plus running message counters.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use maxwell_core::Speaker;

/// Timestamp format used for individual transcript lines (with millis)
const LINE_TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Timestamp format used in headers and trailers
const HEADER_TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Active logger state; absent when logging is disabled
struct LoggerState {
    conversation_id: String,
    text_path: PathBuf,
    json_path: PathBuf,
    started_at: DateTime<Utc>,
    message_count: usize,
    user_message_count: usize,
    assistant_message_count: usize,
}

/// Logs conversations between the user and the assistant
///
/// All operations are best-effort. If neither the configured log directory
/// nor the fallback can be made writable, the logger is disabled for its
/// lifetime and every call becomes a no-op.
pub struct ConversationLogger {
    state: Option<LoggerState>,
}

impl ConversationLogger {
    /// Start a new conversation log in `log_dir`, falling back to
    /// `fallback_dir` if the primary directory cannot be used.
    pub fn start(log_dir: impl AsRef<Path>, fallback_dir: impl AsRef<Path>) -> Self {
        let dir = match resolve_log_dir(log_dir.as_ref(), fallback_dir.as_ref()) {
            Some(dir) => dir,
            None => {
                tracing::error!("Cannot create any conversation log directory, logging disabled");
                return Self { state: None };
            }
        };

        let started_at = Utc::now();
        let conversation_id = format!("conversation_{}", started_at.format("%Y%m%d_%H%M%S"));
        let text_path = dir.join(format!("{}.txt", conversation_id));
        let json_path = dir.join(format!("{}.json", conversation_id));

        let header = format!(
            "Conversation ID: {}\nStarted: {}\nLog Directory: {}\n{}\n\n",
            conversation_id,
            started_at.format(HEADER_TS_FORMAT),
            dir.display(),
            "-".repeat(60),
        );
        if let Err(e) = fs::write(&text_path, header) {
            tracing::warn!("Failed to initialize transcript {}: {}", text_path.display(), e);
        }

        let skeleton = json!({
            "conversation_id": conversation_id,
            "started": started_at.format(HEADER_TS_FORMAT).to_string(),
            "messages": [],
        });
        if let Err(e) = write_json(&json_path, &skeleton) {
            tracing::warn!("Failed to initialize JSON log {}: {}", json_path.display(), e);
        }

        tracing::info!(conversation_id = %conversation_id, "Started new conversation log");

        Self {
            state: Some(LoggerState {
                conversation_id,
                text_path,
                json_path,
                started_at,
                message_count: 0,
                user_message_count: 0,
                assistant_message_count: 0,
            }),
        }
    }

    /// Create a disabled logger that discards everything
    pub fn disabled() -> Self {
        Self { state: None }
    }

    /// Whether this logger actually writes anywhere
    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }

    /// Conversation identifier, if logging is active
    pub fn conversation_id(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.conversation_id.as_str())
    }

    /// Total non-partial messages logged so far
    pub fn message_count(&self) -> usize {
        self.state.as_ref().map(|s| s.message_count).unwrap_or(0)
    }

    /// Log a message from either side of the conversation
    ///
    /// Partial messages are written to both logs but do not advance the
    /// message counters.
    pub fn log_message(
        &mut self,
        speaker: Speaker,
        message: &str,
        timestamp: Option<DateTime<Utc>>,
        partial: bool,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        if !partial {
            state.message_count += 1;
            match speaker {
                Speaker::User => state.user_message_count += 1,
                Speaker::Assistant => state.assistant_message_count += 1,
                Speaker::System => {}
            }
        }

        let timestamp = timestamp.unwrap_or_else(Utc::now);
        let ts = timestamp.format(LINE_TS_FORMAT);
        let marker = if partial { "PARTIAL" } else { "COMPLETE" };

        let line = format!("[{}] {} [{}]: {}\n\n", ts, speaker.label(), marker, message);
        if let Err(e) = append_text(&state.text_path, &line) {
            tracing::warn!("Failed to write transcript line: {}", e);
        }

        let mut entry = json!({
            "timestamp": ts.to_string(),
            "speaker": speaker.label(),
            "message": message,
            "is_partial": partial,
            "length": message.len(),
        });
        if !partial {
            entry["message_number"] = json!(state.message_count);
        }

        if let Err(e) = update_json_log(state, entry, &ts.to_string()) {
            tracing::warn!("Failed to update JSON log: {}", e);
        }
    }

    /// Log an arbitrary JSON payload, coercing it to a string representation
    pub fn log_payload(&mut self, speaker: Speaker, payload: &Value, partial: bool) {
        let text = match payload {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        self.log_message(speaker, &text, None, partial);
    }

    /// Log a system message or event
    pub fn log_system_message(&mut self, message: &str) {
        self.log_message(Speaker::System, message, None, false);
    }

    /// Log the system prompt used for this conversation
    pub fn log_system_prompt(&mut self, system_prompt: &str) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        let block = format!(
            "SYSTEM PROMPT:\n{}\n{}\n{}\n\n",
            "-".repeat(60),
            system_prompt,
            "-".repeat(60),
        );
        if let Err(e) = append_text(&state.text_path, &block) {
            tracing::warn!("Failed to log system prompt: {}", e);
        }

        match read_json(&state.json_path) {
            Ok(mut data) => {
                data["system_prompt"] = json!(system_prompt);
                if let Err(e) = write_json(&state.json_path, &data) {
                    tracing::warn!("Failed to store system prompt in JSON log: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to read JSON log for system prompt: {}", e),
        }
    }

    /// Mark the end of the conversation: append the trailer with the
    /// elapsed duration and finalize the JSON counters.
    pub fn end(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };

        let ended_at = Utc::now();
        let elapsed = (ended_at - state.started_at).num_seconds().max(0);
        let duration = format_duration(elapsed as u64);

        let trailer = format!(
            "\n{}\nConversation ended: {}\nDuration: {}\nTotal messages: {}\nUser messages: {}\nAssistant messages: {}\n",
            "-".repeat(60),
            ended_at.format(HEADER_TS_FORMAT),
            duration,
            state.message_count,
            state.user_message_count,
            state.assistant_message_count,
        );
        if let Err(e) = append_text(&state.text_path, &trailer) {
            tracing::warn!("Failed to write transcript trailer: {}", e);
        }

        match read_json(&state.json_path) {
            Ok(mut data) => {
                data["ended"] = json!(ended_at.format(HEADER_TS_FORMAT).to_string());
                data["duration"] = json!(duration);
                data["message_count"] = json!(state.message_count);
                data["user_message_count"] = json!(state.user_message_count);
                data["assistant_message_count"] = json!(state.assistant_message_count);
                if let Err(e) = write_json(&state.json_path, &data) {
                    tracing::warn!("Failed to finalize JSON log: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to read JSON log for finalization: {}", e),
        }

        tracing::info!(
            conversation_id = %state.conversation_id,
            duration = %duration,
            messages = state.message_count,
            "Ended conversation"
        );
    }
}

/// Resolve a writable log directory, trying the fallback on failure
fn resolve_log_dir(primary: &Path, fallback: &Path) -> Option<PathBuf> {
    for dir in [primary, fallback] {
        if ensure_writable(dir) {
            if dir == fallback && primary != fallback {
                tracing::warn!("Using fallback log directory: {}", dir.display());
            }
            return Some(dir.to_path_buf());
        }
    }
    None
}

/// Create a directory and verify it accepts writes
fn ensure_writable(dir: &Path) -> bool {
    if let Err(e) = fs::create_dir_all(dir) {
        tracing::warn!("Cannot create log directory {}: {}", dir.display(), e);
        return false;
    }

    let probe = dir.join(".test_write");
    match fs::write(&probe, "test") {
        Ok(()) => {
            let _ = fs::remove_file(&probe);
            true
        }
        Err(e) => {
            tracing::warn!("Log directory {} is not writable: {}", dir.display(), e);
            false
        }
    }
}

fn append_text(path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(content.as_bytes())
}

fn read_json(path: &Path) -> Result<Value, crate::PersistenceError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_json(path: &Path, data: &Value) -> Result<(), crate::PersistenceError> {
    let content = serde_json::to_string_pretty(data)?;
    fs::write(path, content)?;
    Ok(())
}

/// Append one message entry and rewrite the running counters
fn update_json_log(
    state: &LoggerState,
    entry: Value,
    timestamp: &str,
) -> Result<(), crate::PersistenceError> {
    let mut data = read_json(&state.json_path).unwrap_or_else(|_| {
        json!({
            "conversation_id": state.conversation_id,
            "messages": [],
        })
    });

    if !data["messages"].is_array() {
        data["messages"] = json!([]);
    }
    if let Some(messages) = data["messages"].as_array_mut() {
        messages.push(entry);
    }

    let total_text: usize = data["messages"]
        .as_array()
        .map(|msgs| {
            msgs.iter()
                .map(|m| m["message"].as_str().map(str::len).unwrap_or(0))
                .sum()
        })
        .unwrap_or(0);

    data["message_count"] = json!(state.message_count);
    data["user_message_count"] = json!(state.user_message_count);
    data["assistant_message_count"] = json!(state.assistant_message_count);
    data["last_updated"] = json!(timestamp);
    data["total_text_logged"] = json!(total_text);

    write_json(&state.json_path, &data)
}

/// Format an elapsed duration as H:MM:SS
fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}:{:02}", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn logger_in(dir: &TempDir) -> ConversationLogger {
        ConversationLogger::start(dir.path(), dir.path().join("fallback"))
    }

    #[test]
    fn test_start_creates_both_files() {
        let dir = TempDir::new().unwrap();
        let logger = logger_in(&dir);

        let id = logger.conversation_id().unwrap().to_string();
        assert!(id.starts_with("conversation_"));
        assert!(dir.path().join(format!("{}.txt", id)).exists());
        assert!(dir.path().join(format!("{}.json", id)).exists());
    }

    #[test]
    fn test_log_message_updates_counters() {
        let dir = TempDir::new().unwrap();
        let mut logger = logger_in(&dir);
        let id = logger.conversation_id().unwrap().to_string();

        logger.log_message(Speaker::User, "hello there", None, false);
        logger.log_message(Speaker::Assistant, "hi, this is Maxwell", None, false);
        logger.log_message(Speaker::User, "partial...", None, true);

        let json_path = dir.path().join(format!("{}.json", id));
        let data: Value = serde_json::from_str(&fs::read_to_string(json_path).unwrap()).unwrap();

        assert_eq!(data["message_count"], 2);
        assert_eq!(data["user_message_count"], 1);
        assert_eq!(data["assistant_message_count"], 1);
        assert_eq!(data["messages"].as_array().unwrap().len(), 3);
        assert_eq!(data["messages"][2]["is_partial"], true);

        let text = fs::read_to_string(dir.path().join(format!("{}.txt", id))).unwrap();
        assert!(text.contains("User [COMPLETE]: hello there"));
        assert!(text.contains("User [PARTIAL]: partial..."));
    }

    #[test]
    fn test_log_payload_coerces_non_strings() {
        let dir = TempDir::new().unwrap();
        let mut logger = logger_in(&dir);
        let id = logger.conversation_id().unwrap().to_string();

        logger.log_payload(Speaker::Assistant, &json!({"tool": "take_note", "ok": true}), false);
        logger.log_payload(Speaker::User, &json!(42), false);
        logger.log_payload(Speaker::User, &json!("plain string"), false);

        let text = fs::read_to_string(dir.path().join(format!("{}.txt", id))).unwrap();
        assert!(text.contains(r#"{"ok":true,"tool":"take_note"}"#));
        assert!(text.contains("User [COMPLETE]: 42"));
        assert!(text.contains("User [COMPLETE]: plain string"));
    }

    #[test]
    fn test_end_writes_trailer_and_duration() {
        let dir = TempDir::new().unwrap();
        let mut logger = logger_in(&dir);
        let id = logger.conversation_id().unwrap().to_string();

        logger.log_message(Speaker::User, "hello", None, false);
        logger.end();

        let text = fs::read_to_string(dir.path().join(format!("{}.txt", id))).unwrap();
        assert!(text.contains("Conversation ended:"));
        assert!(text.contains("Duration: 0:00:0"));
        assert!(text.contains("Total messages: 1"));

        let data: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(format!("{}.json", id))).unwrap())
                .unwrap();
        assert!(data["ended"].is_string());
        assert_eq!(data["message_count"], 1);
    }

    #[test]
    fn test_fallback_directory_is_used() {
        let dir = TempDir::new().unwrap();
        // A file where the primary directory should be forces the fallback.
        let blocked = dir.path().join("blocked");
        fs::write(&blocked, "not a directory").unwrap();

        let fallback = dir.path().join("logs");
        let logger = ConversationLogger::start(&blocked, &fallback);

        assert!(logger.is_enabled());
        let id = logger.conversation_id().unwrap();
        assert!(fallback.join(format!("{}.txt", id)).exists());
    }

    #[test]
    fn test_disabled_logger_is_silent() {
        let mut logger = ConversationLogger::disabled();
        assert!(!logger.is_enabled());
        assert!(logger.conversation_id().is_none());

        // None of these should panic or create files.
        logger.log_message(Speaker::User, "hello", None, false);
        logger.log_system_prompt("prompt");
        logger.end();
        assert_eq!(logger.message_count(), 0);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00:00");
        assert_eq!(format_duration(75), "0:01:15");
        assert_eq!(format_duration(3725), "1:02:05");
    }
}
