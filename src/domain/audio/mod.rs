//! Audio domain module

mod clip;

pub use clip::{AudioClip, AudioMimeType};
