//! Persistence endpoint ports

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::abbrev::Abbrev;
use crate::domain::audio::AudioClip;
use crate::domain::session::{SegmentId, SessionId};

/// Persistence errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Server returned {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Failed to parse server response: {0}")]
    ParseError(String),
}

/// One audio artifact save
#[derive(Debug, Clone)]
pub struct AudioSave {
    pub session_id: SessionId,
    pub segment_id: SegmentId,
    pub clip: AudioClip,
    pub overwrite: bool,
    /// Wall-clock bounds of the captured span
    pub start_time: String,
    pub end_time: String,
    /// Bounds in milliseconds relative to session start
    pub time_code_start: u64,
    pub time_code_end: u64,
}

/// One text artifact save (recognizer output or user edit)
#[derive(Debug, Clone)]
pub struct TextSave {
    pub session_id: SessionId,
    pub segment_id: SegmentId,
    pub text: String,
    pub overwrite: bool,
}

/// A stored text artifact fetched back from the server
#[derive(Debug, Clone)]
pub struct StoredText {
    pub text: String,
    pub message: String,
}

/// A stored audio artifact fetched back from the server
#[derive(Debug, Clone)]
pub struct StoredAudio {
    pub data: Vec<u8>,
    pub file_type: String,
    pub message: String,
}

/// Port for the dictation server's artifact endpoints.
///
/// Each save declares via `overwrite` whether it targets an artifact the
/// server has acknowledged before for that segment id. Recognizer text
/// and user-edited text are distinct artifacts stored under the same id.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Upload a segment's audio; returns the server's message
    async fn save_audio(&self, save: AudioSave) -> Result<String, StoreError>;

    /// Upload a segment's recognizer transcript
    async fn save_recognized_text(&self, save: TextSave) -> Result<String, StoreError>;

    /// Upload a segment's user-edited transcript
    async fn save_edited_text(&self, save: TextSave) -> Result<String, StoreError>;

    /// Fetch a segment's edited transcript
    async fn fetch_edited_text(
        &self,
        session: &SessionId,
        basename: &str,
    ) -> Result<StoredText, StoreError>;

    /// Fetch a segment's recognizer transcript
    async fn fetch_recognized_text(
        &self,
        session: &SessionId,
        basename: &str,
    ) -> Result<StoredText, StoreError>;

    /// Fetch a segment's audio
    async fn fetch_audio(
        &self,
        session: &SessionId,
        file_name: &str,
    ) -> Result<StoredAudio, StoreError>;

    /// List the distinct artifact basenames of a session
    async fn list_basenames(&self, session: &SessionId) -> Result<Vec<String>, StoreError>;

    /// List the artifact files of a session
    async fn list_files(&self, session: &SessionId) -> Result<Vec<String>, StoreError>;
}

/// Port for the abbreviation endpoints
#[async_trait]
pub trait AbbrevStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Abbrev>, StoreError>;

    async fn add(&self, abbrev: &str, expansion: &str) -> Result<(), StoreError>;

    async fn delete(&self, abbrev: &str) -> Result<(), StoreError>;
}
