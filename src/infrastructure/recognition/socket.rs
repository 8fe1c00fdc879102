//! Unix-socket recognizer bridge
//!
//! Connects the recognizer port to an external recognition process over a
//! unix domain socket. Control verbs are written as single lines;
//! recognition events come back as one JSON object per line:
//!
//! ```text
//! -> start sv
//! <- {"event":"interim","text":"hel"}
//! <- {"event":"final","text":"hello"}
//! <- {"event":"end"}
//! <- {"event":"error","code":"no-speech"}
//! ```
//!
//! Every event is stamped with the generation of the run it belongs to.
//! Exactly one `Ended` is delivered per run, synthesized on EOF if the
//! peer never sent one, so the session can always wind down.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::UnixStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::application::ports::{
    RecognizerError, RecognizerEvent, RecognizerSignal, SpeechRecognizer,
};
use crate::domain::session::RecognizerErrorKind;

/// A permission rejection faster than this never showed the user a
/// prompt: the microphone was blocked, not denied
const BLOCKED_THRESHOLD_MS: u128 = 100;

/// Socket path resolver
#[derive(Debug, Clone)]
pub struct RecognizerSocketPath {
    path: PathBuf,
}

impl RecognizerSocketPath {
    /// Create socket path, preferring XDG_RUNTIME_DIR
    pub fn new() -> Self {
        let path = std::env::var("XDG_RUNTIME_DIR")
            .map(|dir| PathBuf::from(dir).join("dictator-recognizer.sock"))
            .unwrap_or_else(|_| std::env::temp_dir().join("dictator-recognizer.sock"));
        Self { path }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl Default for RecognizerSocketPath {
    fn default() -> Self {
        Self::new()
    }
}

/// One recognition event line from the peer
#[derive(Debug, Deserialize)]
struct EventLine {
    event: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    code: String,
}

struct Run {
    writer: OwnedWriteHalf,
    reader: JoinHandle<()>,
}

/// Recognizer adapter speaking the line protocol over a unix socket
pub struct SocketRecognizer {
    socket_path: RecognizerSocketPath,
    events: mpsc::UnboundedSender<RecognizerSignal>,
    run: Mutex<Option<Run>>,
}

impl SocketRecognizer {
    pub fn new(
        socket_path: RecognizerSocketPath,
        events: mpsc::UnboundedSender<RecognizerSignal>,
    ) -> Self {
        Self {
            socket_path,
            events,
            run: Mutex::new(None),
        }
    }

    fn map_code(code: &str, started_at: Instant) -> RecognizerErrorKind {
        match code {
            "no-speech" => RecognizerErrorKind::NoSpeech,
            "audio-capture" => RecognizerErrorKind::AudioCapture,
            "not-allowed" => {
                if started_at.elapsed().as_millis() < BLOCKED_THRESHOLD_MS {
                    RecognizerErrorKind::Blocked
                } else {
                    RecognizerErrorKind::Denied
                }
            }
            "network" => RecognizerErrorKind::Network,
            "aborted" => RecognizerErrorKind::Aborted,
            other => RecognizerErrorKind::Other(other.to_string()),
        }
    }

    fn map_event(line: EventLine, started_at: Instant) -> Option<RecognizerEvent> {
        match line.event.as_str() {
            "interim" => Some(RecognizerEvent::Interim { text: line.text }),
            "final" => Some(RecognizerEvent::Final { text: line.text }),
            "end" => Some(RecognizerEvent::Ended),
            "error" => Some(RecognizerEvent::Failed {
                kind: Self::map_code(&line.code, started_at),
            }),
            _ => None,
        }
    }

    async fn write_line(writer: &mut OwnedWriteHalf, line: &str) -> io::Result<()> {
        writer.write_all(format!("{}\n", line).as_bytes()).await?;
        writer.flush().await
    }
}

#[async_trait]
impl SpeechRecognizer for SocketRecognizer {
    async fn start(&self, language: &str, generation: u64) -> Result<(), RecognizerError> {
        let mut run = self.run.lock().await;
        if let Some(existing) = run.as_ref() {
            if !existing.reader.is_finished() {
                return Err(RecognizerError::StartFailed(
                    "recognition already running".to_string(),
                ));
            }
        }
        *run = None;

        let stream = UnixStream::connect(self.socket_path.path())
            .await
            .map_err(|e| RecognizerError::ConnectionFailed(e.to_string()))?;
        let (read_half, mut writer) = stream.into_split();

        Self::write_line(&mut writer, &format!("start {}", language))
            .await
            .map_err(|e| RecognizerError::StartFailed(e.to_string()))?;

        let started_at = Instant::now();
        let tx = self.events.clone();
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(read_half).lines();
            let mut ended = false;
            while let Ok(Some(line)) = lines.next_line().await {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                // Malformed lines are skipped, not fatal
                let Ok(event_line) = serde_json::from_str::<EventLine>(line) else {
                    continue;
                };
                let Some(event) = Self::map_event(event_line, started_at) else {
                    continue;
                };
                let is_end = matches!(event, RecognizerEvent::Ended);
                let _ = tx.send(RecognizerSignal { generation, event });
                if is_end {
                    ended = true;
                    break;
                }
            }
            if !ended {
                let _ = tx.send(RecognizerSignal {
                    generation,
                    event: RecognizerEvent::Ended,
                });
            }
        });

        *run = Some(Run { writer, reader });
        Ok(())
    }

    async fn stop(&self) -> Result<(), RecognizerError> {
        let mut run = self.run.lock().await;
        let Some(active) = run.as_mut() else {
            return Err(RecognizerError::NotRunning);
        };
        Self::write_line(&mut active.writer, "stop")
            .await
            .map_err(|e| RecognizerError::ConnectionFailed(e.to_string()))
    }

    async fn abort(&self) -> Result<(), RecognizerError> {
        let mut run = self.run.lock().await;
        let Some(mut active) = run.take() else {
            return Err(RecognizerError::NotRunning);
        };
        // Best-effort goodbye; the run is torn down either way
        let _ = Self::write_line(&mut active.writer, "abort").await;
        active.reader.abort();
        Ok(())
    }
}
