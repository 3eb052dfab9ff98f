//! Hosted live-API websocket client
//!
//! Thin adapter over the hosted bidirectional streaming endpoint: a setup
//! message configures model, voice and system instruction; microphone audio
//! goes up as base64 PCM16 chunks; response events come down as JSON
//! messages that are handed to the normalizer untouched.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use maxwell_config::{LiveConfig, DEFAULT_SYSTEM_PROMPT};
use maxwell_core::audio::encode_audio;

use crate::LiveError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Per-call connection parameters
#[derive(Debug, Clone)]
pub struct LiveCallConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub voice: String,
    pub system_prompt: String,
    pub input_sample_rate: u32,
}

impl LiveCallConfig {
    /// Build call parameters from settings plus per-call overrides
    pub fn from_settings(
        live: &LiveConfig,
        api_key: Option<String>,
        voice: Option<String>,
        system_prompt: Option<String>,
    ) -> Result<Self, LiveError> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .or_else(|| live.resolve_api_key())
            .ok_or(LiveError::MissingApiKey)?;

        Ok(Self {
            endpoint: live.endpoint.clone(),
            api_key,
            model: live.model.clone(),
            voice: voice.filter(|v| !v.is_empty()).unwrap_or_else(|| live.voice.clone()),
            system_prompt: system_prompt
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            input_sample_rate: live.input_sample_rate,
        })
    }
}

/// Outbound half of a live session
#[async_trait]
pub trait LiveSink: Send {
    /// Forward one microphone frame upstream
    async fn send_audio(&mut self, pcm: &[i16]) -> Result<(), LiveError>;

    /// Close the upstream connection
    async fn close(&mut self) -> Result<(), LiveError>;
}

/// Inbound half of a live session
#[async_trait]
pub trait LiveStream: Send {
    /// Next raw server message; None when the stream ends
    async fn next_event(&mut self) -> Result<Option<Value>, LiveError>;
}

/// Connected client for the hosted live API
pub struct GeminiLiveClient;

impl GeminiLiveClient {
    /// Connect and complete the setup handshake
    pub async fn connect(
        config: &LiveCallConfig,
    ) -> Result<(GeminiLiveSink, GeminiLiveStream), LiveError> {
        let url = format!("{}?key={}", config.endpoint, config.api_key);

        let (ws, _response) = connect_async(url)
            .await
            .map_err(|e| LiveError::Connection(e.to_string()))?;

        let (mut sink, mut stream) = ws.split();

        let setup = json!({
            "setup": {
                "model": config.model,
                "generationConfig": {
                    "responseModalities": ["AUDIO"],
                    "speechConfig": {
                        "voiceConfig": {
                            "prebuiltVoiceConfig": { "voiceName": config.voice }
                        }
                    }
                },
                "systemInstruction": {
                    "parts": [ { "text": config.system_prompt } ]
                }
            }
        });
        sink.send(Message::Text(setup.to_string()))
            .await
            .map_err(|e| LiveError::Transport(e.to_string()))?;

        // The first server message acknowledges the setup.
        match next_json(&mut stream).await? {
            Some(ack) => {
                if ack.get("setupComplete").is_none() && ack.get("setup_complete").is_none() {
                    tracing::debug!("Unexpected first server message: {}", ack);
                }
            }
            None => return Err(LiveError::Closed),
        }

        tracing::info!(model = %config.model, voice = %config.voice, "Connected to live API");

        Ok((
            GeminiLiveSink {
                sink,
                input_sample_rate: config.input_sample_rate,
            },
            GeminiLiveStream { stream },
        ))
    }
}

/// Outbound websocket half
pub struct GeminiLiveSink {
    sink: SplitSink<WsStream, Message>,
    input_sample_rate: u32,
}

#[async_trait]
impl LiveSink for GeminiLiveSink {
    async fn send_audio(&mut self, pcm: &[i16]) -> Result<(), LiveError> {
        let message = json!({
            "realtimeInput": {
                "mediaChunks": [ {
                    "mimeType": format!("audio/pcm;rate={}", self.input_sample_rate),
                    "data": encode_audio(pcm),
                } ]
            }
        });

        self.sink
            .send(Message::Text(message.to_string()))
            .await
            .map_err(|e| LiveError::Transport(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), LiveError> {
        self.sink
            .send(Message::Close(None))
            .await
            .map_err(|e| LiveError::Transport(e.to_string()))
    }
}

/// Inbound websocket half
pub struct GeminiLiveStream {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl LiveStream for GeminiLiveStream {
    async fn next_event(&mut self) -> Result<Option<Value>, LiveError> {
        next_json(&mut self.stream).await
    }
}

/// Read websocket messages until one parses as JSON or the stream ends
async fn next_json(stream: &mut SplitStream<WsStream>) -> Result<Option<Value>, LiveError> {
    while let Some(message) = stream.next().await {
        let message = message.map_err(|e| LiveError::Transport(e.to_string()))?;

        let payload = match message {
            Message::Text(text) => text.into_bytes(),
            Message::Binary(bytes) => bytes,
            Message::Close(_) => return Ok(None),
            // Control frames carry no events.
            _ => continue,
        };

        match serde_json::from_slice::<Value>(&payload) {
            Ok(value) => return Ok(Some(value)),
            Err(e) => {
                tracing::warn!("Skipping non-JSON server message: {}", e);
                continue;
            }
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_config_requires_api_key() {
        let live = LiveConfig::default();
        std::env::remove_var("GEMINI_API_KEY");
        let result = LiveCallConfig::from_settings(&live, None, None, None);
        assert!(matches!(result, Err(LiveError::MissingApiKey)));
    }

    #[test]
    fn test_call_config_overrides() {
        let live = LiveConfig::default();
        let config = LiveCallConfig::from_settings(
            &live,
            Some("key-123".into()),
            Some("Kore".into()),
            Some("Custom prompt".into()),
        )
        .unwrap();

        assert_eq!(config.api_key, "key-123");
        assert_eq!(config.voice, "Kore");
        assert_eq!(config.system_prompt, "Custom prompt");
        assert_eq!(config.input_sample_rate, 16_000);
    }

    #[test]
    fn test_call_config_defaults_from_settings() {
        let live = LiveConfig::default();
        let config =
            LiveCallConfig::from_settings(&live, Some("key".into()), Some(String::new()), None)
                .unwrap();

        assert_eq!(config.voice, "Puck");
        assert!(config.system_prompt.contains("Maxwell"));
    }
}
