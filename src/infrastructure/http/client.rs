//! Dictation server HTTP adapter
//!
//! Implements the artifact and abbreviation ports against the dictation
//! server's JSON endpoints. Audio travels base64-encoded; the
//! `file_extension` field carries the clip's MIME string and the server
//! strips the `audio/` prefix.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    AbbrevStore, ArtifactStore, AudioSave, StoreError, StoredAudio, StoredText, TextSave,
};
use crate::domain::abbrev::Abbrev;
use crate::domain::session::SessionId;

// Request types

#[derive(Debug, Serialize)]
struct SaveTextRequest<'a> {
    session_id: &'a str,
    file_name: &'a str,
    data: &'a str,
    over_write: bool,
}

#[derive(Debug, Serialize)]
struct SaveAudioRequest<'a> {
    session_id: &'a str,
    file_name: &'a str,
    data: String,
    file_extension: &'a str,
    over_write: bool,
    start_time: &'a str,
    end_time: &'a str,
    time_code_start: u64,
    time_code_end: u64,
}

// Response types

#[derive(Debug, Deserialize)]
struct SaveResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct TextResponse {
    #[serde(default)]
    text: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct AudioResponse {
    #[serde(default)]
    data: String,
    #[serde(default)]
    file_type: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    result: Vec<String>,
    #[serde(default)]
    error: String,
}

/// HTTP client for the dictation server
pub struct DictationClient {
    base_url: String,
    client: reqwest::Client,
}

impl DictationClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Read a response body, mapping non-success statuses to the body's
    /// error text (or the status line when the body is empty)
    async fn read_body(response: reqwest::Response) -> Result<String, StoreError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::RequestFailed(e.to_string()))?;
        if !status.is_success() {
            let trimmed = body.trim();
            let message = if trimmed.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request rejected")
                    .to_string()
            } else {
                trimmed.to_string()
            };
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }

    fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, StoreError> {
        serde_json::from_str(body).map_err(|e| StoreError::ParseError(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, StoreError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| StoreError::RequestFailed(e.to_string()))?;
        let body = Self::read_body(response).await?;
        Self::parse_json(&body)
    }

    async fn post_save<B: Serialize>(&self, path: &str, body: &B) -> Result<String, StoreError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| StoreError::RequestFailed(e.to_string()))?;
        let body = Self::read_body(response).await?;
        let parsed: SaveResponse = Self::parse_json(&body)?;
        Ok(parsed.message)
    }

    async fn get_listing(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let listing: ListResponse = self.get_json(path).await?;
        if !listing.error.is_empty() {
            return Err(StoreError::Rejected {
                status: 200,
                message: listing.error,
            });
        }
        Ok(listing.result)
    }

    async fn get_text(&self, path: &str) -> Result<StoredText, StoreError> {
        let parsed: TextResponse = self.get_json(path).await?;
        Ok(StoredText {
            text: parsed.text,
            message: parsed.message,
        })
    }

    /// List all sessions known to the server
    pub async fn list_sessions(&self) -> Result<Vec<String>, StoreError> {
        self.get_json("/admin/list/sessions").await
    }

    /// Fetch the server's route listing, one route per line
    pub async fn api_doc(&self) -> Result<String, StoreError> {
        let response = self
            .client
            .get(self.url("/doc/"))
            .send()
            .await
            .map_err(|e| StoreError::RequestFailed(e.to_string()))?;
        Self::read_body(response).await
    }
}

#[async_trait]
impl ArtifactStore for DictationClient {
    async fn save_audio(&self, save: AudioSave) -> Result<String, StoreError> {
        let request = SaveAudioRequest {
            session_id: save.session_id.as_str(),
            file_name: save.segment_id.as_str(),
            data: save.clip.to_base64(),
            file_extension: save.clip.mime_type().as_str(),
            over_write: save.overwrite,
            start_time: &save.start_time,
            end_time: &save.end_time,
            time_code_start: save.time_code_start,
            time_code_end: save.time_code_end,
        };
        self.post_save("/save_audio", &request).await
    }

    async fn save_recognized_text(&self, save: TextSave) -> Result<String, StoreError> {
        let request = SaveTextRequest {
            session_id: save.session_id.as_str(),
            file_name: save.segment_id.as_str(),
            data: &save.text,
            over_write: save.overwrite,
        };
        self.post_save("/save_recogniser_text", &request).await
    }

    async fn save_edited_text(&self, save: TextSave) -> Result<String, StoreError> {
        let request = SaveTextRequest {
            session_id: save.session_id.as_str(),
            file_name: save.segment_id.as_str(),
            data: &save.text,
            over_write: save.overwrite,
        };
        self.post_save("/save_edited_text", &request).await
    }

    async fn fetch_edited_text(
        &self,
        session: &SessionId,
        basename: &str,
    ) -> Result<StoredText, StoreError> {
        self.get_text(&format!(
            "/get_edited_text/{}/{}",
            session.as_str(),
            basename
        ))
        .await
    }

    async fn fetch_recognized_text(
        &self,
        session: &SessionId,
        basename: &str,
    ) -> Result<StoredText, StoreError> {
        self.get_text(&format!(
            "/get_recogniser_text/{}/{}",
            session.as_str(),
            basename
        ))
        .await
    }

    async fn fetch_audio(
        &self,
        session: &SessionId,
        file_name: &str,
    ) -> Result<StoredAudio, StoreError> {
        let parsed: AudioResponse = self
            .get_json(&format!("/get_audio/{}/{}", session.as_str(), file_name))
            .await?;
        let data = if parsed.data.is_empty() {
            Vec::new()
        } else {
            use base64::Engine;
            base64::engine::general_purpose::STANDARD
                .decode(parsed.data.as_bytes())
                .map_err(|e| StoreError::ParseError(e.to_string()))?
        };
        Ok(StoredAudio {
            data,
            file_type: parsed.file_type,
            message: parsed.message,
        })
    }

    async fn list_basenames(&self, session: &SessionId) -> Result<Vec<String>, StoreError> {
        self.get_listing(&format!("/admin/list/basenames/{}", session.as_str()))
            .await
    }

    async fn list_files(&self, session: &SessionId) -> Result<Vec<String>, StoreError> {
        self.get_listing(&format!("/admin/list/files/{}", session.as_str()))
            .await
    }
}

#[async_trait]
impl AbbrevStore for DictationClient {
    async fn list(&self) -> Result<Vec<Abbrev>, StoreError> {
        self.get_json("/abbrev/list").await
    }

    async fn add(&self, abbrev: &str, expansion: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .get(self.url(&format!("/abbrev/add/{}/{}", abbrev, expansion)))
            .send()
            .await
            .map_err(|e| StoreError::RequestFailed(e.to_string()))?;
        Self::read_body(response).await?;
        Ok(())
    }

    async fn delete(&self, abbrev: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .get(self.url(&format!("/abbrev/delete/{}", abbrev)))
            .send()
            .await
            .map_err(|e| StoreError::RequestFailed(e.to_string()))?;
        Self::read_body(response).await?;
        Ok(())
    }
}
