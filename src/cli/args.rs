//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Dictator - continuous dictation sessions against a dictation server
#[derive(Parser, Debug)]
#[command(name = "dictator")]
#[command(version)]
#[command(about = "Continuous dictation client with utterance capture and server sync")]
#[command(long_about = None)]
pub struct Cli {
    /// Dictation session id (the server-side directory name)
    #[arg(short = 's', long, value_name = "ID", env = "DICTATOR_SESSION")]
    pub session: Option<String>,

    /// Dictation server base URL
    #[arg(long, value_name = "URL", env = "DICTATOR_SERVER")]
    pub server: Option<String>,

    /// Recognition language code (e.g. sv, en-US)
    #[arg(short = 'l', long, value_name = "LANG")]
    pub language: Option<String>,

    /// Restart recognition automatically when a run ends on its own
    #[arg(short = 'r', long)]
    pub auto_restart: bool,

    /// Reload previously saved utterances for the session before starting
    #[arg(long, requires = "session")]
    pub load_from_server: bool,

    /// Recognizer bridge socket path
    #[arg(long, value_name = "PATH")]
    pub recognizer_socket: Option<PathBuf>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage server-side abbreviations
    Abbrev {
        #[command(subcommand)]
        action: AbbrevAction,
    },
    /// Inspect sessions stored on the server
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
    /// Fetch saved artifacts from the server
    Pull {
        #[command(subcommand)]
        action: PullAction,
    },
    /// Print the server's API route listing
    Doc,
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Abbreviation actions
#[derive(Subcommand, Debug)]
pub enum AbbrevAction {
    /// List all abbreviations
    List,
    /// Add an abbreviation
    Add {
        /// Short token
        abbrev: String,
        /// Expansion text
        expansion: String,
    },
    /// Delete an abbreviation
    Delete {
        /// Short token
        abbrev: String,
    },
}

/// Session listing actions
#[derive(Subcommand, Debug)]
pub enum SessionsAction {
    /// List all sessions
    List,
    /// List the artifact files of a session
    Files {
        /// Session id
        session: String,
    },
    /// List the distinct artifact basenames of a session
    Basenames {
        /// Session id
        session: String,
    },
}

/// Artifact fetch actions
#[derive(Subcommand, Debug)]
pub enum PullAction {
    /// Fetch a saved transcript
    Text {
        /// Session id
        session: String,
        /// Artifact basename
        file: String,
        /// Fetch the recognizer transcript instead of the edited one
        #[arg(long)]
        recognized: bool,
    },
    /// Fetch saved audio
    Audio {
        /// Session id
        session: String,
        /// Artifact file name
        file: String,
        /// Output path (defaults to the file name plus its extension)
        #[arg(short = 'o', long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

/// Parsed dictation options
#[derive(Debug, Clone)]
pub struct DictateOptions {
    pub server_url: String,
    pub session: Option<String>,
    pub language: String,
    pub auto_restart: bool,
    pub load_from_server: bool,
    pub recognizer_socket: Option<PathBuf>,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &["server_url", "session", "language", "auto_restart"];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
