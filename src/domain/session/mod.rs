//! Session domain module

mod editor;
mod machine;
mod segment;
mod session_id;

pub use editor::TranscriptEditor;
pub use machine::{
    AudioFlush, Command, Controls, MessageLevel, RecognizerErrorKind, SessionEvent,
    SessionMachine, SessionState,
};
pub use segment::{OpenSegment, SegmentId, SegmentLog, SegmentRecord};
pub use session_id::SessionId;
