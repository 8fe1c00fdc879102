//! Utterance recorder port

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::AudioClip;

/// Recording errors
#[derive(Debug, Clone, Error)]
pub enum RecordingError {
    #[error("Failed to start recording: {0}")]
    StartFailed(String),

    #[error("Recording failed: {0}")]
    RecordingFailed(String),

    #[error("No recording in progress")]
    NotRecording,

    #[error("No audio device available")]
    NoAudioDevice,
}

/// Port for capturing one utterance's audio span.
///
/// `start` begins capture, `stop` ends it and yields the captured clip,
/// `cancel` ends it and discards the buffer. Stopping an already-stopped
/// recorder is an error the caller must tolerate: a failed stop never
/// blocks a session state transition.
#[async_trait]
pub trait UtteranceRecorder: Send + Sync {
    /// Begin capturing a new span
    async fn start(&self) -> Result<(), RecordingError>;

    /// End the span and return the captured audio
    async fn stop(&self) -> Result<AudioClip, RecordingError>;

    /// End the span and discard the captured audio
    async fn cancel(&self) -> Result<(), RecordingError>;

    /// Check if currently recording
    fn is_recording(&self) -> bool;

    /// Get elapsed recording time in milliseconds
    fn elapsed_ms(&self) -> u64;
}
