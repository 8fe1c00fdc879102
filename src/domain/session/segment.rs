//! Segment lifecycle types
//!
//! A segment is one bounded span of speech: the audio captured between two
//! utterance boundaries plus the transcript the recognizer produced for it.
//! Both artifacts are stored on the server under the segment id.

use std::collections::HashSet;
use std::fmt;

use uuid::Uuid;

use super::session_id::SessionId;

/// Opaque unique token identifying one segment.
/// Allocated when a recording span opens; never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentId(String);

impl SegmentId {
    /// Allocate a fresh id
    pub fn generate() -> Self {
        Self(format!("utt_{}", Uuid::new_v4().simple()))
    }

    /// Rebuild an id from a server-side file basename (session restore)
    pub fn from_basename(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the id as a string slice (the server-side file basename)
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The currently open segment: recorder running, transcript pending.
/// The session id is captured at open time so saves issued for this
/// segment are unaffected by later edits to the session field.
#[derive(Debug, Clone)]
pub struct OpenSegment {
    pub id: SegmentId,
    pub session: SessionId,
    /// Milliseconds since session start when the recorder began
    pub opened_at_ms: u64,
    /// Final transcript from the recognizer, set at most once
    pub recognized: Option<String>,
}

impl OpenSegment {
    /// Open a new segment with a freshly allocated id
    pub fn open(session: SessionId, opened_at_ms: u64) -> Self {
        Self {
            id: SegmentId::generate(),
            session,
            opened_at_ms,
            recognized: None,
        }
    }
}

/// A closed segment retained for re-display and overwrite lookups
#[derive(Debug, Clone)]
pub struct SegmentRecord {
    pub id: SegmentId,
    pub session: SessionId,
    pub text: String,
    pub time_code_start: u64,
    pub time_code_end: u64,
}

/// Ordered history of saved segments.
///
/// Membership drives the `over_write` flag: a save for an id already in
/// the log targets an artifact the server has acknowledged before.
#[derive(Debug, Default)]
pub struct SegmentLog {
    records: Vec<SegmentRecord>,
    ids: HashSet<SegmentId>,
}

impl SegmentLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &SegmentId) -> bool {
        self.ids.contains(id)
    }

    pub fn push(&mut self, record: SegmentRecord) {
        self.ids.insert(record.id.clone());
        self.records.push(record);
    }

    /// Update the display text of a recorded segment (late final result or
    /// a flushed user edit)
    pub fn update_text(&mut self, id: &SegmentId, text: &str) {
        if let Some(record) = self.records.iter_mut().find(|r| &r.id == id) {
            record.text = text.to_string();
        }
    }

    pub fn session_of(&self, id: &SegmentId) -> Option<SessionId> {
        self.records
            .iter()
            .find(|r| &r.id == id)
            .map(|r| r.session.clone())
    }

    pub fn records(&self) -> &[SegmentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
