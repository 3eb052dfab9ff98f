//! Application State
//!
//! Shared state across all handlers. Session-scoped call state lives in the
//! sessions themselves; this struct only carries configuration and the
//! shared facilities.

use std::sync::Arc;
use std::time::Duration;

use maxwell_config::{RunMode, Settings};
use maxwell_persistence::LogStore;
use maxwell_tools::ToolRegistry;

use crate::session::SessionManager;
use crate::ServerError;

/// Fallback call duration cap applied in phone mode
const DEFAULT_PHONE_TIME_LIMIT: Duration = Duration::from_secs(90);

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<Settings>,
    /// Session manager
    pub sessions: Arc<SessionManager>,
    /// Tool registry
    pub tools: Arc<ToolRegistry>,
    /// Conversation log store
    pub logs: Arc<LogStore>,
    /// Optional per-call duration cap
    pub call_time_limit: Option<Duration>,
}

impl AppState {
    /// Create application state for the given run mode
    pub fn new(config: Settings, mode: RunMode) -> Result<Self, ServerError> {
        let tools = maxwell_tools::create_default_registry(
            config.logging.work_dir.clone(),
            config.mail.clone(),
        )
        .map_err(|e| ServerError::Internal(format!("Failed to initialize tools: {}", e)))?;

        let call_time_limit = match mode {
            RunMode::Phone => Some(
                config
                    .server
                    .call_time_limit_seconds
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_PHONE_TIME_LIMIT),
            ),
            _ => config.server.call_time_limit_seconds.map(Duration::from_secs),
        };

        Ok(Self {
            sessions: Arc::new(SessionManager::new(config.server.max_sessions)),
            tools: Arc::new(tools),
            logs: Arc::new(LogStore::new(config.logging.log_dir.clone())),
            call_time_limit,
            config: Arc::new(config),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings(dir: &TempDir) -> Settings {
        let mut settings = Settings::default();
        settings.logging.work_dir = dir.path().join("agent_data").display().to_string();
        settings.logging.log_dir = dir.path().join("conversation_logs").display().to_string();
        settings
    }

    #[test]
    fn test_state_creation() {
        let dir = TempDir::new().unwrap();
        let state = AppState::new(settings(&dir), RunMode::Server).unwrap();

        assert_eq!(state.sessions.count(), 0);
        assert!(state.call_time_limit.is_none());
    }

    #[test]
    fn test_phone_mode_applies_time_limit() {
        let dir = TempDir::new().unwrap();
        let state = AppState::new(settings(&dir), RunMode::Phone).unwrap();

        assert_eq!(state.call_time_limit, Some(Duration::from_secs(90)));
    }
}
