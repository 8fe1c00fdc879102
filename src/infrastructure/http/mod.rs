//! Dictation server HTTP adapter

mod client;

pub use client::DictationClient;
