//! Recording infrastructure module
//!
//! Cross-platform microphone capture using cpal, encoded to FLAC for
//! upload.

mod cpal_recorder;
mod flac_encoder;

pub use cpal_recorder::CpalRecorder;
pub use flac_encoder::{encode_to_flac, TARGET_SAMPLE_RATE};
