//! Log Store
//!
//! Read-side access to stored conversation logs: listing, retrieval,
//! deletion, ZIP export and aggregate statistics. Malformed or partially
//! written log files are tolerated by substituting defaults.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::PersistenceError;

/// Timestamp format stored in log headers
const HEADER_TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Summary of one stored conversation
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub id: String,
    pub started: String,
    pub last_modified: String,
    pub size_kb: f64,
    pub filename: String,
}

/// Per-conversation detail row used in statistics
#[derive(Debug, Clone, Serialize)]
pub struct ConversationDetail {
    pub id: String,
    pub date: String,
    pub messages: u64,
    pub user_messages: u64,
    pub assistant_messages: u64,
}

/// Aggregate statistics across all stored conversations
#[derive(Debug, Clone, Serialize, Default)]
pub struct LogStats {
    pub total_conversations: usize,
    pub total_messages: u64,
    pub total_user_messages: u64,
    pub total_assistant_messages: u64,
    pub avg_messages_per_conversation: f64,
    pub avg_duration_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_duration_formatted: Option<String>,
    pub conversations_by_date: BTreeMap<String, usize>,
    pub conversation_details: Vec<ConversationDetail>,
}

/// Read-side store over a conversation log directory
#[derive(Debug, Clone)]
pub struct LogStore {
    log_dir: PathBuf,
}

impl LogStore {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }

    /// List all stored conversations, most recently modified first
    pub fn list(&self) -> Vec<ConversationSummary> {
        let mut conversations = Vec::new();

        for path in self.files_with_extension("txt") {
            match summarize(&path) {
                Ok(summary) => conversations.push(summary),
                Err(e) => tracing::warn!("Error reading log file {}: {}", path.display(), e),
            }
        }

        conversations.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        conversations
    }

    /// Fetch the full text transcript of one conversation
    pub fn fetch(&self, id: &str) -> Result<String, PersistenceError> {
        let path = self.text_path(id)?;
        if !path.exists() {
            return Err(PersistenceError::NotFound(id.to_string()));
        }
        Ok(fs::read_to_string(path)?)
    }

    /// Delete a conversation's text and JSON logs
    ///
    /// Returns NotFound, deleting nothing, when neither file exists.
    pub fn delete(&self, id: &str) -> Result<(), PersistenceError> {
        let txt = self.text_path(id)?;
        let json = self.json_path(id)?;

        if !txt.exists() && !json.exists() {
            return Err(PersistenceError::NotFound(id.to_string()));
        }

        if txt.exists() {
            fs::remove_file(&txt)?;
        }
        if json.exists() {
            fs::remove_file(&json)?;
        }

        tracing::info!(conversation_id = %id, "Deleted conversation logs");
        Ok(())
    }

    /// Bundle every stored log into an in-memory ZIP archive
    ///
    /// Returns the suggested download filename and the archive bytes.
    pub fn export_zip(&self) -> Result<(String, Vec<u8>), PersistenceError> {
        let mut files: Vec<PathBuf> = self.files_with_extension("txt");
        files.extend(self.files_with_extension("json"));

        if files.is_empty() {
            return Err(PersistenceError::NotFound(
                "No conversation logs found".to_string(),
            ));
        }

        let cursor = std::io::Cursor::new(Vec::new());
        let mut writer = ZipWriter::new(cursor);
        let options = SimpleFileOptions::default();

        for path in files {
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            let content = fs::read(&path)?;
            writer
                .start_file(name, options)
                .map_err(|e| PersistenceError::Export(e.to_string()))?;
            writer.write_all(&content)?;
        }

        let cursor = writer
            .finish()
            .map_err(|e| PersistenceError::Export(e.to_string()))?;

        let filename = format!(
            "conversation_logs_{}.zip",
            Utc::now().format("%Y%m%d_%H%M%S")
        );
        Ok((filename, cursor.into_inner()))
    }

    /// Compute aggregate statistics across all stored JSON logs
    pub fn stats(&self) -> LogStats {
        let mut stats = LogStats::default();
        let json_files = self.files_with_extension("json");
        stats.total_conversations = json_files.len();

        let mut total_duration_seconds = 0i64;
        let mut conversations_with_duration = 0usize;

        for path in json_files {
            let data: Value = match fs::read_to_string(&path)
                .map_err(PersistenceError::from)
                .and_then(|c| serde_json::from_str(&c).map_err(PersistenceError::from))
            {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!("Error processing {}: {}", path.display(), e);
                    continue;
                }
            };

            let messages = data["message_count"].as_u64().unwrap_or(0);
            let user_messages = data["user_message_count"].as_u64().unwrap_or(0);
            let assistant_messages = data["assistant_message_count"].as_u64().unwrap_or(0);

            stats.total_messages += messages;
            stats.total_user_messages += user_messages;
            stats.total_assistant_messages += assistant_messages;

            let started = data["started"].as_str();
            let date = started
                .and_then(|s| s.split_whitespace().next())
                .unwrap_or("Unknown")
                .to_string();
            *stats.conversations_by_date.entry(date.clone()).or_insert(0) += 1;

            if let (Some(start), Some(end)) = (
                started.and_then(parse_header_timestamp),
                data["ended"].as_str().and_then(parse_header_timestamp),
            ) {
                total_duration_seconds += (end - start).num_seconds().max(0);
                conversations_with_duration += 1;
            }

            let id = data["conversation_id"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| {
                    path.file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("Unknown")
                        .to_string()
                });

            stats.conversation_details.push(ConversationDetail {
                id,
                date,
                messages,
                user_messages,
                assistant_messages,
            });
        }

        if stats.total_conversations > 0 {
            stats.avg_messages_per_conversation =
                stats.total_messages as f64 / stats.total_conversations as f64;
        }

        if conversations_with_duration > 0 {
            stats.avg_duration_seconds =
                total_duration_seconds as f64 / conversations_with_duration as f64;
            let secs = stats.avg_duration_seconds as u64;
            stats.avg_duration_formatted = Some(format!(
                "{}:{:02}:{:02}",
                secs / 3600,
                (secs % 3600) / 60,
                secs % 60
            ));
        }

        stats
            .conversation_details
            .sort_by(|a, b| b.date.cmp(&a.date));

        stats
    }

    fn files_with_extension(&self, ext: &str) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(&self.log_dir) else {
            return Vec::new();
        };

        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(ext))
            .collect();
        files.sort();
        files
    }

    fn text_path(&self, id: &str) -> Result<PathBuf, PersistenceError> {
        validate_id(id)?;
        Ok(self.log_dir.join(format!("{}.txt", id)))
    }

    fn json_path(&self, id: &str) -> Result<PathBuf, PersistenceError> {
        validate_id(id)?;
        Ok(self.log_dir.join(format!("{}.json", id)))
    }
}

/// Reject identifiers that could escape the log directory
fn validate_id(id: &str) -> Result<(), PersistenceError> {
    if id.is_empty()
        || id.contains('/')
        || id.contains('\\')
        || id.contains("..")
    {
        return Err(PersistenceError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Build a summary from one transcript's header and file metadata
fn summarize(path: &Path) -> Result<ConversationSummary, PersistenceError> {
    let content = fs::read_to_string(path)?;
    let started = content
        .lines()
        .take(3)
        .find_map(|line| line.strip_prefix("Started:"))
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let metadata = fs::metadata(path)?;
    let size_kb = (metadata.len() as f64 / 1024.0 * 100.0).round() / 100.0;
    let last_modified: DateTime<Utc> = metadata
        .modified()
        .map(DateTime::from)
        .unwrap_or_else(|_| Utc::now());

    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Unknown")
        .to_string();
    let filename = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("Unknown")
        .to_string();

    Ok(ConversationSummary {
        id,
        started,
        last_modified: last_modified.format(HEADER_TS_FORMAT).to_string(),
        size_kb,
        filename,
    })
}

fn parse_header_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, HEADER_TS_FORMAT).ok()
}
