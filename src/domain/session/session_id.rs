//! Session id value object

use std::fmt;
use std::str::FromStr;

use crate::domain::error::SessionIdError;

/// Validated dictation session identifier.
/// Non-empty after trimming; used as the server-side directory name for
/// every artifact saved during the session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether a raw field value would parse into a valid session id.
    /// Drives the enablement of the record control.
    pub fn is_valid(value: &str) -> bool {
        !value.trim().is_empty()
    }
}

impl FromStr for SessionId {
    type Err = SessionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(SessionIdError {
                input: s.to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
