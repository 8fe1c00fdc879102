//! Recognition infrastructure module
//!
//! The recognizer itself is an external capability; this module only
//! adapts its event stream onto the recognizer port.

#[cfg(unix)]
mod socket;

#[cfg(unix)]
pub use socket::{RecognizerSocketPath, SocketRecognizer};
