//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces: the
//! dictation server HTTP client, the cpal microphone recorder, the
//! recognizer socket bridge, and the XDG config store.

pub mod config;
pub mod http;
pub mod recognition;
pub mod recording;

// Re-export adapters
pub use config::XdgConfigStore;
pub use http::DictationClient;
#[cfg(unix)]
pub use recognition::{RecognizerSocketPath, SocketRecognizer};
pub use recording::CpalRecorder;
