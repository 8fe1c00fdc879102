//! Application configuration value object

use serde::{Deserialize, Serialize};

/// Default dictation server base URL
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:7654";

/// Default recognition language
pub const DEFAULT_LANGUAGE: &str = "sv";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server_url: Option<String>,
    pub session: Option<String>,
    pub language: Option<String>,
    pub auto_restart: Option<bool>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            server_url: Some(DEFAULT_SERVER_URL.to_string()),
            session: None,
            language: Some(DEFAULT_LANGUAGE.to_string()),
            auto_restart: Some(false),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            server_url: other.server_url.or(self.server_url),
            session: other.session.or(self.session),
            language: other.language.or(self.language),
            auto_restart: other.auto_restart.or(self.auto_restart),
        }
    }

    /// Get the server URL, or the default if not set
    pub fn server_url_or_default(&self) -> &str {
        self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    /// Get the recognition language, or the default if not set
    pub fn language_or_default(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    /// Get the auto-restart setting, or false if not set
    pub fn auto_restart_or_default(&self) -> bool {
        self.auto_restart.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert_eq!(config.server_url, Some(DEFAULT_SERVER_URL.to_string()));
        assert!(config.session.is_none());
        assert_eq!(config.language, Some("sv".to_string()));
        assert_eq!(config.auto_restart, Some(false));
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.server_url.is_none());
        assert!(config.session.is_none());
        assert!(config.language.is_none());
        assert!(config.auto_restart.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            server_url: Some("http://base:1".to_string()),
            session: Some("base-session".to_string()),
            language: Some("sv".to_string()),
            ..Default::default()
        };

        let other = AppConfig {
            server_url: Some("http://other:2".to_string()),
            session: None, // Should not override
            language: Some("en-US".to_string()),
            ..Default::default()
        };

        let merged = base.merge(other);

        assert_eq!(merged.server_url, Some("http://other:2".to_string()));
        assert_eq!(merged.session, Some("base-session".to_string())); // Kept from base
        assert_eq!(merged.language, Some("en-US".to_string()));
    }

    #[test]
    fn merge_preserves_base_when_other_is_none() {
        let base = AppConfig {
            session: Some("sess1".to_string()),
            auto_restart: Some(true),
            ..Default::default()
        };

        let merged = base.merge(AppConfig::empty());

        assert_eq!(merged.session, Some("sess1".to_string()));
        assert_eq!(merged.auto_restart, Some(true));
    }

    #[test]
    fn accessors_fall_back_to_defaults() {
        let config = AppConfig::empty();
        assert_eq!(config.server_url_or_default(), DEFAULT_SERVER_URL);
        assert_eq!(config.language_or_default(), "sv");
        assert!(!config.auto_restart_or_default());
    }

    #[test]
    fn accessors_use_configured_values() {
        let config = AppConfig {
            server_url: Some("http://example:9000".to_string()),
            language: Some("en-GB".to_string()),
            auto_restart: Some(true),
            ..Default::default()
        };
        assert_eq!(config.server_url_or_default(), "http://example:9000");
        assert_eq!(config.language_or_default(), "en-GB");
        assert!(config.auto_restart_or_default());
    }
}
