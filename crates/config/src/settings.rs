//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Application run mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Interactive browser UI
    Ui,
    /// Telephony bridge (applies the call duration cap)
    Phone,
    /// Headless API server
    Server,
    /// Interactive terminal log browser
    Logs,
}

impl Default for RunMode {
    fn default() -> Self {
        Self::Ui
    }
}

impl std::str::FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ui" => Ok(Self::Ui),
            "phone" => Ok(Self::Phone),
            "server" => Ok(Self::Server),
            "logs" => Ok(Self::Logs),
            other => Err(format!("Unknown run mode: {}", other)),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Hosted live-API configuration
    #[serde(default)]
    pub live: LiveConfig,

    /// Outbound mail relay configuration
    #[serde(default)]
    pub mail: MailConfig,

    /// Conversation log / agent data locations
    #[serde(default)]
    pub logging: LogConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.live.output_sample_rate == 0 {
            return Err(ConfigError::InvalidValue {
                field: "live.output_sample_rate".to_string(),
                message: "Output sample rate must be non-zero".to_string(),
            });
        }

        if self.live.output_frame_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "live.output_frame_size".to_string(),
                message: "Output frame size must be non-zero".to_string(),
            });
        }

        if self.server.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_sessions".to_string(),
                message: "At least one concurrent session is required".to_string(),
            });
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum concurrent call sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Optional per-call duration cap in seconds (enforced in phone mode)
    #[serde(default)]
    pub call_time_limit_seconds: Option<u64>,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    7860
}
fn default_max_sessions() -> usize {
    100
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_sessions: default_max_sessions(),
            call_time_limit_seconds: None,
            cors_enabled: default_true(),
        }
    }
}

/// Hosted live-API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    /// WebSocket endpoint of the hosted live API
    #[serde(default = "default_live_endpoint")]
    pub endpoint: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// API key; falls back to the GEMINI_API_KEY environment variable
    #[serde(default)]
    pub api_key: Option<String>,

    /// Prebuilt voice name
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Microphone sample rate sent upstream
    #[serde(default = "default_input_sample_rate")]
    pub input_sample_rate: u32,

    /// Model audio sample rate received downstream
    #[serde(default = "default_output_sample_rate")]
    pub output_sample_rate: u32,

    /// Playback frame size in samples
    #[serde(default = "default_output_frame_size")]
    pub output_frame_size: usize,
}

fn default_live_endpoint() -> String {
    "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1alpha.GenerativeService.BidiGenerateContent".to_string()
}
fn default_model() -> String {
    "models/gemini-2.0-flash-exp".to_string()
}
fn default_voice() -> String {
    "Puck".to_string()
}
fn default_input_sample_rate() -> u32 {
    16_000
}
fn default_output_sample_rate() -> u32 {
    24_000
}
fn default_output_frame_size() -> usize {
    480
}

impl LiveConfig {
    /// Resolve the API key from settings or the process environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()))
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            endpoint: default_live_endpoint(),
            model: default_model(),
            api_key: None,
            voice: default_voice(),
            input_sample_rate: default_input_sample_rate(),
            output_sample_rate: default_output_sample_rate(),
            output_frame_size: default_output_frame_size(),
        }
    }
}

/// Outbound mail relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// SMTP relay host
    #[serde(default = "default_smtp_server")]
    pub smtp_server: String,

    /// SMTP relay port (STARTTLS)
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// Sender address; empty disables sending
    #[serde(default)]
    pub sender_email: String,

    /// Display name used in the From header
    #[serde(default = "default_sender_name")]
    pub sender_name: String,

    /// Relay password; empty disables sending
    #[serde(default)]
    pub password: String,
}

fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}
fn default_smtp_port() -> u16 {
    587
}
fn default_sender_name() -> String {
    "Maxwell - Critical Future".to_string()
}

impl MailConfig {
    /// Whether the relay is configured well enough to attempt a send
    pub fn is_configured(&self) -> bool {
        !self.sender_email.is_empty() && !self.password.is_empty()
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_server: default_smtp_server(),
            smtp_port: default_smtp_port(),
            sender_email: String::new(),
            sender_name: default_sender_name(),
            password: String::new(),
        }
    }
}

/// Conversation log / agent data locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Directory for conversation transcripts
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Fallback directory used when log_dir cannot be created
    #[serde(default = "default_fallback_dir")]
    pub fallback_dir: String,

    /// Working directory for agent tool data (notes, tasks, proposals...)
    #[serde(default = "default_work_dir")]
    pub work_dir: String,
}

fn default_log_dir() -> String {
    "conversation_logs".to_string()
}
fn default_fallback_dir() -> String {
    "logs".to_string()
}
fn default_work_dir() -> String {
    "agent_data".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            fallback_dir: default_fallback_dir(),
            work_dir: default_work_dir(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (MAXWELL_ prefix, `__` separator)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("MAXWELL")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 7860);
        assert_eq!(settings.live.output_sample_rate, 24_000);
        assert_eq!(settings.live.output_frame_size, 480);
        assert_eq!(settings.logging.log_dir, "conversation_logs");
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings::default();
        settings.live.output_sample_rate = 0;
        assert!(settings.validate().is_err());

        settings.live.output_sample_rate = 24_000;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_mail_config_incomplete_by_default() {
        let mail = MailConfig::default();
        assert!(!mail.is_configured());
        assert_eq!(mail.smtp_port, 587);
    }

    #[test]
    fn test_run_mode_parse() {
        assert_eq!("ui".parse::<RunMode>().unwrap(), RunMode::Ui);
        assert_eq!("PHONE".parse::<RunMode>().unwrap(), RunMode::Phone);
        assert!("desktop".parse::<RunMode>().is_err());
    }
}
