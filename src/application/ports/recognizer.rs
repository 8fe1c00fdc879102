//! Speech recognizer port

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::session::RecognizerErrorKind;

/// Recognizer control errors
#[derive(Debug, Clone, Error)]
pub enum RecognizerError {
    #[error("Failed to start recognizer: {0}")]
    StartFailed(String),

    #[error("Recognizer is not running")]
    NotRunning,

    #[error("Recognizer connection failed: {0}")]
    ConnectionFailed(String),
}

/// One event from a recognition run
#[derive(Debug, Clone)]
pub enum RecognizerEvent {
    /// Provisional transcript; display only
    Interim { text: String },
    /// Stable transcript for one utterance
    Final { text: String },
    /// The run finished (after stop, abort, or on its own)
    Ended,
    /// The run failed; an `Ended` follows
    Failed { kind: RecognizerErrorKind },
}

/// A recognizer event stamped with the generation of the run that
/// produced it, so stale events from a cancelled or superseded run can
/// be told apart from live ones.
#[derive(Debug, Clone)]
pub struct RecognizerSignal {
    pub generation: u64,
    pub event: RecognizerEvent,
}

/// Port for a continuous speech recognizer.
///
/// Adapters deliver `RecognizerSignal`s through a channel handed to them
/// at construction, stamped with the generation passed to `start`.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Begin a continuous recognition run tagged with `generation`
    async fn start(&self, language: &str, generation: u64) -> Result<(), RecognizerError>;

    /// Ask the run to finish and deliver any pending final result
    async fn stop(&self) -> Result<(), RecognizerError>;

    /// Tear the run down without waiting for pending results
    async fn abort(&self) -> Result<(), RecognizerError>;
}
