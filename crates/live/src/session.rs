//! Call session
//!
//! One instance per active call. Three cooperative tasks share nothing but
//! channels: the forward task drains the microphone frame queue into the
//! live sink, the drain task demultiplexes server events, and the caller
//! drains the playback queue. Shutdown is a cooperative flag; on shutdown
//! any in-flight accumulators are flushed as partial log entries before the
//! conversation log is closed.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use maxwell_core::{AudioChunk, TurnRecord};

use crate::client::{LiveSink, LiveStream};
use crate::demux::{EventDemux, SessionUpdate};

/// Handle to one running call session
pub struct CallSession {
    frame_tx: mpsc::UnboundedSender<Vec<i16>>,
    audio_rx: Option<mpsc::UnboundedReceiver<AudioChunk>>,
    update_rx: Option<mpsc::UnboundedReceiver<SessionUpdate>>,
    shutdown_tx: watch::Sender<bool>,
    forward_task: JoinHandle<()>,
    drain_task: JoinHandle<Vec<TurnRecord>>,
}

impl CallSession {
    /// Spawn the forwarding and draining tasks for one call
    ///
    /// The demultiplexer must have been created with the audio sender whose
    /// receiver is passed back here; see [`CallSession::channels`].
    pub fn spawn<S, R>(
        mut sink: S,
        mut stream: R,
        demux: EventDemux,
        audio_rx: mpsc::UnboundedReceiver<AudioChunk>,
        update_rx: mpsc::UnboundedReceiver<SessionUpdate>,
    ) -> Self
    where
        S: LiveSink + 'static,
        R: LiveStream + 'static,
    {
        let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<Vec<i16>>();
        let (shutdown_tx, mut forward_shutdown) = watch::channel(false);
        let mut drain_shutdown = shutdown_tx.subscribe();

        let forward_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = forward_shutdown.changed() => break,
                    frame = frame_rx.recv() => {
                        match frame {
                            Some(pcm) => {
                                if let Err(e) = sink.send_audio(&pcm).await {
                                    tracing::warn!("Failed to forward audio frame: {}", e);
                                    break;
                                }
                            }
                            None => break,
                        }
                    }
                }
            }
            let _ = sink.close().await;
        });

        let drain_task = tokio::spawn(async move {
            let mut demux = demux;
            loop {
                tokio::select! {
                    _ = drain_shutdown.changed() => break,
                    event = stream.next_event() => {
                        match event {
                            Ok(Some(raw)) => demux.handle_raw(&raw),
                            Ok(None) => {
                                tracing::info!("Live event stream ended");
                                break;
                            }
                            Err(e) => {
                                // Upstream failures terminate the handler;
                                // they are not retried.
                                tracing::error!("Live session error: {}", e);
                                demux.system_message(&format!("Error: {}", e));
                                break;
                            }
                        }
                    }
                }
            }
            demux.finish()
        });

        Self {
            frame_tx,
            audio_rx: Some(audio_rx),
            update_rx: Some(update_rx),
            shutdown_tx,
            forward_task,
            drain_task,
        }
    }

    /// Create the playback/update channel pairs for a session
    pub fn channels() -> (
        mpsc::UnboundedSender<AudioChunk>,
        mpsc::UnboundedReceiver<AudioChunk>,
        mpsc::UnboundedSender<SessionUpdate>,
        mpsc::UnboundedReceiver<SessionUpdate>,
    ) {
        let (audio_tx, audio_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (audio_tx, audio_rx, update_tx, update_rx)
    }

    /// Enqueue one inbound microphone frame
    ///
    /// Returns false once the session is shutting down.
    pub fn send_frame(&self, pcm: Vec<i16>) -> bool {
        self.frame_tx.send(pcm).is_ok()
    }

    /// Take the playback queue receiver (once)
    pub fn take_audio_output(&mut self) -> Option<mpsc::UnboundedReceiver<AudioChunk>> {
        self.audio_rx.take()
    }

    /// Take the transcript update receiver (once)
    pub fn take_updates(&mut self) -> Option<mpsc::UnboundedReceiver<SessionUpdate>> {
        self.update_rx.take()
    }

    /// Signal shutdown and wait for both tasks, returning the turn history
    pub async fn shutdown(self) -> Vec<TurnRecord> {
        let _ = self.shutdown_tx.send(true);

        if let Err(e) = self.forward_task.await {
            tracing::warn!("Forward task ended abnormally: {}", e);
        }

        match self.drain_task.await {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!("Drain task ended abnormally: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demux::DemuxConfig;
    use crate::LiveError;
    use async_trait::async_trait;
    use maxwell_core::Speaker;
    use maxwell_persistence::ConversationLogger;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::Mutex;

    /// Sink that records every forwarded frame
    struct RecordingSink {
        frames: Arc<Mutex<Vec<Vec<i16>>>>,
        closed: Arc<Mutex<bool>>,
    }

    #[async_trait]
    impl LiveSink for RecordingSink {
        async fn send_audio(&mut self, pcm: &[i16]) -> Result<(), LiveError> {
            self.frames.lock().await.push(pcm.to_vec());
            Ok(())
        }

        async fn close(&mut self) -> Result<(), LiveError> {
            *self.closed.lock().await = true;
            Ok(())
        }
    }

    /// Stream that replays a fixed script, then pends until shutdown
    struct ScriptedStream {
        script: Vec<Value>,
    }

    #[async_trait]
    impl LiveStream for ScriptedStream {
        async fn next_event(&mut self) -> Result<Option<Value>, LiveError> {
            if self.script.is_empty() {
                // Keep the session open like a quiet live connection.
                std::future::pending::<()>().await;
                unreachable!()
            }
            Ok(Some(self.script.remove(0)))
        }
    }

    fn scripted_session(
        dir: &TempDir,
        script: Vec<Value>,
    ) -> (CallSession, Arc<Mutex<Vec<Vec<i16>>>>, Arc<Mutex<bool>>) {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(Mutex::new(false));
        let sink = RecordingSink {
            frames: frames.clone(),
            closed: closed.clone(),
        };
        let stream = ScriptedStream { script };

        let logger = ConversationLogger::start(dir.path(), dir.path().join("fallback"));
        let (audio_tx, audio_rx, update_tx, update_rx) = CallSession::channels();
        let demux = EventDemux::new(DemuxConfig::default(), logger, audio_tx).with_updates(update_tx);

        let session = CallSession::spawn(sink, stream, demux, audio_rx, update_rx);
        (session, frames, closed)
    }

    #[tokio::test]
    async fn test_frames_are_forwarded_to_sink() {
        let dir = TempDir::new().unwrap();
        let (session, frames, closed) = scripted_session(&dir, vec![]);

        assert!(session.send_frame(vec![1, 2, 3]));
        assert!(session.send_frame(vec![4, 5]));

        // Give the forward task a chance to drain the queue.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let history = session.shutdown().await;
        assert!(history.is_empty());
        assert_eq!(*frames.lock().await, vec![vec![1, 2, 3], vec![4, 5]]);
        assert!(*closed.lock().await);
    }

    #[tokio::test]
    async fn test_scripted_events_flow_to_history_and_audio() {
        let dir = TempDir::new().unwrap();
        let pcm = vec![9i16; 8];
        let script = vec![
            json!({ "data": maxwell_core::audio::encode_audio(&pcm) }),
            json!({ "recognized_speech": "hello" }),
            json!({ "recognized_speech": "world", "is_final": true }),
        ];
        let (mut session, _frames, _closed) = scripted_session(&dir, script);

        let mut audio_rx = session.take_audio_output().unwrap();
        let chunk = audio_rx.recv().await.unwrap();
        assert_eq!(chunk.samples, pcm);

        let mut update_rx = session.take_updates().unwrap();
        let update = update_rx.recv().await.unwrap();
        assert_eq!(update.speaker, Speaker::User);
        assert_eq!(update.text, "hello world");
        assert!(update.is_final);

        let history = session.shutdown().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].text, "hello world");
    }

    #[tokio::test]
    async fn test_shutdown_flushes_pending_partial() {
        let dir = TempDir::new().unwrap();
        let script = vec![json!({ "serverContent": {
            "modelTurn": { "parts": [ { "text": "I was in the middle of" } ] }
        }})];
        let (mut session, _frames, _closed) = scripted_session(&dir, script);

        // Wait for the event to be processed before shutting down.
        let mut update_rx = session.take_updates().unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let history = session.shutdown().await;
        // Partial flush goes to the log, not the durable turn history.
        assert!(history.is_empty());
        assert!(update_rx.try_recv().is_err());

        let txt = std::fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .map(|e| e.path())
            .find(|p| p.extension().and_then(|e| e.to_str()) == Some("txt"))
            .unwrap();
        let content = std::fs::read_to_string(txt).unwrap();
        assert!(content.contains("Assistant [PARTIAL]: I was in the middle of"));
    }
}
