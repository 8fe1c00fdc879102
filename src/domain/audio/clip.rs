//! Audio clip value object

use std::fmt;

/// Supported audio MIME types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioMimeType {
    Flac,
    Ogg,
    Wav,
    Webm,
    Mp3,
}

impl AudioMimeType {
    /// Get the MIME type string (sent as `file_extension` on the wire;
    /// the server strips the `audio/` prefix)
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Flac => "audio/flac",
            Self::Ogg => "audio/ogg",
            Self::Wav => "audio/wav",
            Self::Webm => "audio/webm",
            Self::Mp3 => "audio/mp3",
        }
    }

    /// Get the file extension
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Flac => "flac",
            Self::Ogg => "ogg",
            Self::Wav => "wav",
            Self::Webm => "webm",
            Self::Mp3 => "mp3",
        }
    }
}

impl fmt::Display for AudioMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for AudioMimeType {
    fn default() -> Self {
        Self::Flac
    }
}

/// One recorded utterance span, ready for upload.
/// Raw audio bytes plus their MIME type.
#[derive(Debug, Clone)]
pub struct AudioClip {
    data: Vec<u8>,
    mime_type: AudioMimeType,
}

impl AudioClip {
    pub fn new(data: Vec<u8>, mime_type: AudioMimeType) -> Self {
        Self { data, mime_type }
    }

    pub fn from_bytes(data: &[u8], mime_type: AudioMimeType) -> Self {
        Self {
            data: data.to_vec(),
            mime_type,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn mime_type(&self) -> AudioMimeType {
        self.mime_type
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }

    /// Encode the audio data as base64 for the wire
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_type_as_str() {
        assert_eq!(AudioMimeType::Flac.as_str(), "audio/flac");
        assert_eq!(AudioMimeType::Webm.as_str(), "audio/webm");
        assert_eq!(AudioMimeType::Wav.as_str(), "audio/wav");
    }

    #[test]
    fn mime_type_extension() {
        assert_eq!(AudioMimeType::Flac.extension(), "flac");
        assert_eq!(AudioMimeType::Ogg.extension(), "ogg");
        assert_eq!(AudioMimeType::Webm.extension(), "webm");
    }

    #[test]
    fn default_mime_type_is_flac() {
        assert_eq!(AudioMimeType::default(), AudioMimeType::Flac);
    }

    #[test]
    fn clip_size() {
        let clip = AudioClip::new(vec![0u8; 1024], AudioMimeType::Flac);
        assert_eq!(clip.size_bytes(), 1024);
    }

    #[test]
    fn human_readable_size_bytes() {
        let clip = AudioClip::new(vec![0u8; 500], AudioMimeType::Flac);
        assert_eq!(clip.human_readable_size(), "500 B");
    }

    #[test]
    fn human_readable_size_kb() {
        let clip = AudioClip::new(vec![0u8; 2048], AudioMimeType::Flac);
        assert_eq!(clip.human_readable_size(), "2.0 KB");
    }

    #[test]
    fn to_base64_round_trips() {
        let clip = AudioClip::new(vec![1, 2, 3, 4], AudioMimeType::Flac);
        let b64 = clip.to_base64();
        use base64::Engine;
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&b64)
            .unwrap();
        assert_eq!(decoded, vec![1, 2, 3, 4]);
    }

    #[test]
    fn from_bytes() {
        let clip = AudioClip::from_bytes(&[9, 8, 7], AudioMimeType::Webm);
        assert_eq!(clip.data(), &[9, 8, 7]);
        assert_eq!(clip.mime_type(), AudioMimeType::Webm);
    }
}
