//! Dictator - continuous dictation session client
//!
//! This crate coordinates a continuous speech recognizer and an
//! utterance recorder so each bounded span of speech is captured as a
//! paired (audio, transcript) segment, saved exactly once to a dictation
//! server, and rotated into a fresh segment on every utterance boundary.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: the session state machine, segment lifecycle, transcript
//!   editor, abbreviation expansion, value objects, and errors
//! - **Application**: use cases and port interfaces (traits)
//! - **Infrastructure**: adapter implementations (dictation server HTTP
//!   client, cpal recorder, recognizer socket bridge, XDG config store)
//! - **CLI**: command-line interface and the interactive dictation loop

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
