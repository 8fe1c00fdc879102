//! Configuration port interface

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Port for configuration storage.
///
/// Loading never fails on a missing file: it yields an empty config so
/// defaults and CLI flags can fill the gaps.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the stored configuration (empty when no file exists)
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Persist the configuration
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    /// The configuration file path
    fn path(&self) -> PathBuf;

    /// Whether a configuration file exists
    fn exists(&self) -> bool;

    /// Create the configuration file with defaults.
    /// Fails if one already exists.
    async fn init(&self) -> Result<(), ConfigError>;
}
