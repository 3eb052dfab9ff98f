//! WebSocket Handler
//!
//! Bridges one browser audio socket to a hosted live session: microphone
//! frames go into the call's frame queue, model audio and transcript
//! updates come back as JSON messages.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use maxwell_core::{audio, Speaker};
use maxwell_live::{
    CallSession, DemuxConfig, EventDemux, GeminiLiveClient, LiveCallConfig, SessionUpdate,
};
use maxwell_persistence::ConversationLogger;

use crate::session::Session;
use crate::state::AppState;

/// WebSocket message types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Microphone audio (base64 PCM16)
    Audio { data: String },
    /// Transcript update
    Transcript {
        speaker: String,
        text: String,
        is_final: bool,
    },
    /// Model audio for playback (base64 PCM16)
    ResponseAudio { data: String, sample_rate: u32 },
    /// Status update
    Status { state: String },
    /// Error
    Error { message: String },
    /// Ping/Pong
    Ping,
    Pong,
    /// Session info
    SessionInfo {
        session_id: String,
        conversation_id: Option<String>,
    },
    /// End session
    EndSession,
}

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// Handle WebSocket upgrade for one call
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, axum::http::StatusCode> {
    let session = state
        .sessions
        .get(&session_id)
        .ok_or(axum::http::StatusCode::NOT_FOUND)?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, session, state)))
}

/// Handle one WebSocket connection
async fn handle_socket(socket: WebSocket, session: Arc<Session>, state: AppState) {
    let (sender, mut receiver) = socket.split();
    let sender: WsSender = Arc::new(Mutex::new(sender));

    let options = session.options();
    let live_config = match LiveCallConfig::from_settings(
        &state.config.live,
        options.api_key,
        options.voice,
        options.system_prompt,
    ) {
        Ok(config) => config,
        Err(e) => {
            send_message(&sender, &WsMessage::Error { message: e.to_string() }).await;
            return;
        }
    };

    // The conversation log starts before the upstream connection so that a
    // connection failure still leaves a record.
    let mut logger = ConversationLogger::start(
        &state.config.logging.log_dir,
        &state.config.logging.fallback_dir,
    );
    logger.log_system_prompt(&live_config.system_prompt);
    let conversation_id = logger.conversation_id().map(String::from);

    let (live_sink, live_stream) = match GeminiLiveClient::connect(&live_config).await {
        Ok(halves) => halves,
        Err(e) => {
            tracing::error!("Live connection failed: {}", e);
            logger.log_system_message(&format!("Error: {}", e));
            logger.end();
            send_message(&sender, &WsMessage::Error { message: e.to_string() }).await;
            return;
        }
    };

    send_message(
        &sender,
        &WsMessage::SessionInfo {
            session_id: session.id.clone(),
            conversation_id,
        },
    )
    .await;
    send_message(&sender, &WsMessage::Status { state: "connected".to_string() }).await;

    let demux_config = DemuxConfig {
        output_sample_rate: state.config.live.output_sample_rate,
        ..DemuxConfig::default()
    };
    let (audio_tx, audio_rx, update_tx, update_rx) = CallSession::channels();
    let demux = EventDemux::new(demux_config, logger, audio_tx).with_updates(update_tx);

    let mut call = CallSession::spawn(live_sink, live_stream, demux, audio_rx, update_rx);

    // Playback task: model audio chunks out to the browser.
    let output_sample_rate = state.config.live.output_sample_rate;
    let playback_sender = sender.clone();
    let mut playback_rx = call.take_audio_output().unwrap_or_else(|| {
        let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
        rx
    });
    let playback_task = tokio::spawn(async move {
        while let Some(chunk) = playback_rx.recv().await {
            let msg = WsMessage::ResponseAudio {
                data: audio::encode_audio(&chunk.samples),
                sample_rate: output_sample_rate,
            };
            if !send_message(&playback_sender, &msg).await {
                break;
            }
        }
    });

    // Transcript task: partial/final updates out to the browser.
    let update_sender = sender.clone();
    let mut updates = call.take_updates().unwrap_or_else(|| {
        let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
        rx
    });
    let update_task = tokio::spawn(async move {
        while let Some(SessionUpdate {
            speaker,
            text,
            is_final,
        }) = updates.recv().await
        {
            let msg = WsMessage::Transcript {
                speaker: match speaker {
                    Speaker::User => "user".to_string(),
                    Speaker::Assistant => "assistant".to_string(),
                    Speaker::System => "system".to_string(),
                },
                text,
                is_final,
            };
            if !send_message(&update_sender, &msg).await {
                break;
            }
        }
    });

    // Optional platform-level call duration cap.
    let deadline = async {
        match state.call_time_limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    // Main receive loop: browser messages into the call session.
    loop {
        tokio::select! {
            _ = &mut deadline => {
                tracing::info!(session_id = %session.id, "Call duration cap reached");
                send_message(&sender, &WsMessage::Status { state: "time_limit_reached".to_string() }).await;
                break;
            }
            message = receiver.next() => {
                let Some(message) = message else { break };
                match message {
                    Ok(Message::Text(text)) => {
                        session.touch();
                        match serde_json::from_str::<WsMessage>(&text) {
                            Ok(WsMessage::Audio { data }) => match audio::decode_audio(&data) {
                                Ok(pcm) => {
                                    if !call.send_frame(pcm) {
                                        break;
                                    }
                                }
                                Err(e) => tracing::warn!("Failed to decode audio frame: {}", e),
                            },
                            Ok(WsMessage::Ping) => {
                                send_message(&sender, &WsMessage::Pong).await;
                            }
                            Ok(WsMessage::EndSession) => {
                                session.close();
                                break;
                            }
                            Ok(_) => {}
                            Err(e) => tracing::warn!("Unparseable client message: {}", e),
                        }
                    }
                    Ok(Message::Binary(data)) => {
                        session.touch();
                        if !call.send_frame(audio::pcm16_from_bytes(&data)) {
                            break;
                        }
                    }
                    Ok(Message::Ping(data)) => {
                        let mut s = sender.lock().await;
                        let _ = s.send(Message::Pong(data)).await;
                    }
                    Ok(Message::Close(_)) => break,
                    Err(e) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    // Shutdown flushes in-flight accumulators and closes the log.
    let history = call.shutdown().await;
    playback_task.abort();
    update_task.abort();
    state.sessions.remove(&session.id);

    tracing::info!(
        session_id = %session.id,
        turns = history.len(),
        "WebSocket closed"
    );
}

/// Serialize and send one message; false when the socket is gone
async fn send_message(sender: &WsSender, message: &WsMessage) -> bool {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!("Failed to serialize message: {}", e);
            return false;
        }
    };

    let mut s = sender.lock().await;
    s.send(Message::Text(json)).await.is_ok()
}
