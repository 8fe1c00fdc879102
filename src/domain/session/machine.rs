//! Recording/recognition session state machine
//!
//! The machine is a pure transition core: `dispatch` takes one event and
//! returns the commands the effect runner must execute. All segment and
//! control state lives here; nothing here performs I/O or reads clocks.
//!
//! State machine:
//!   IDLE -> RECORDING (start, gated on a valid session id)
//!   RECORDING -> RECORDING (final result: rotate into a fresh segment)
//!   RECORDING -> STOPPING (send)
//!   RECORDING -> IDLE (cancel)
//!   STOPPING -> IDLE (recognizer run ends)
//!   RECORDING|STOPPING -> ERROR (recognizer/recorder failure)
//!   ERROR -> IDLE (dismiss)
//!
//! Events sourced from the recognizer carry the generation of the capture
//! run that produced them; events from a cancelled or superseded run are
//! dropped so they cannot mutate state for a newer segment.

use super::editor::TranscriptEditor;
use super::segment::{OpenSegment, SegmentId, SegmentLog, SegmentRecord};
use super::session_id::SessionId;

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    Stopping,
    Error,
}

impl SessionState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recognizer failure kinds surfaced to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerErrorKind {
    NoSpeech,
    AudioCapture,
    /// Permission rejected before the user saw a prompt
    Blocked,
    /// Permission rejected by the user
    Denied,
    Network,
    /// Expected after a user cancel
    Aborted,
    Other(String),
}

impl RecognizerErrorKind {
    /// User-facing message for the message area
    pub fn message(&self) -> String {
        match self {
            Self::NoSpeech => "No speech input".to_string(),
            Self::AudioCapture => "Microphone failure".to_string(),
            Self::Blocked => "Audio blocked".to_string(),
            Self::Denied => "Audio denied".to_string(),
            Self::Network => "Network error".to_string(),
            Self::Aborted => "Recording aborted".to_string(),
            Self::Other(code) => format!("Recognizer reported '{}'", code),
        }
    }
}

/// Message severity for the user-visible message area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Error,
}

/// Audio flush directive. Everything a save needs is captured by value
/// here, so a late network response can never read a newer segment's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFlush {
    pub segment_id: SegmentId,
    pub session_id: SessionId,
    pub overwrite: bool,
    pub time_code_start: u64,
    pub time_code_end: u64,
}

/// Effects the runner executes on behalf of the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartRecognizer { language: String, generation: u64 },
    StopRecognizer,
    AbortRecognizer,
    StartRecorder,
    /// Stop the recorder; `None` discards the captured audio
    StopRecorder { flush: Option<AudioFlush> },
    SaveRecognizedText {
        segment_id: SegmentId,
        session_id: SessionId,
        text: String,
        overwrite: bool,
    },
    SaveEditedText {
        segment_id: SegmentId,
        session_id: SessionId,
        text: String,
        overwrite: bool,
    },
    ShowInterim { text: String },
    ShowFinal { segment_id: SegmentId, text: String },
    Notify { level: MessageLevel, text: String },
}

/// Enablement of the recording controls, derived from machine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub start: bool,
    pub send: bool,
    pub cancel: bool,
    pub save: bool,
}

/// Inputs to the state machine.
///
/// Time-relevant events carry `now_ms`, milliseconds since session start,
/// supplied by the effect runner so the core stays clock-free.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    SessionIdEdited { value: String },
    LanguageChanged { language: String },
    AutoRestartChanged { enabled: bool },
    StartPressed { now_ms: u64 },
    SendPressed { now_ms: u64 },
    CancelPressed,
    ErrorDismissed,
    TranscriptEdited { text: String },
    SaveEditPressed,
    Interim { generation: u64, text: String },
    Final { generation: u64, text: String, now_ms: u64 },
    RecognizerEnded { generation: u64, now_ms: u64 },
    RecognizerFailed { generation: u64, kind: RecognizerErrorKind },
    /// A capability we just told to start could not (recorder or
    /// recognizer). Raised synchronously by the effect runner, so it is
    /// always current and carries no generation.
    CaptureFailed { message: String },
}

/// The session state machine
#[derive(Debug)]
pub struct SessionMachine {
    state: SessionState,
    session_field: String,
    language: String,
    auto_restart: bool,
    generation: u64,
    current: Option<OpenSegment>,
    editor: TranscriptEditor,
    log: SegmentLog,
}

impl SessionMachine {
    pub fn new(language: impl Into<String>, auto_restart: bool) -> Self {
        Self {
            state: SessionState::Idle,
            session_field: String::new(),
            language: language.into(),
            auto_restart,
            generation: 0,
            current: None,
            editor: TranscriptEditor::new(),
            log: SegmentLog::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn controls(&self) -> Controls {
        Controls {
            start: self.state == SessionState::Idle && SessionId::is_valid(&self.session_field),
            send: self.state == SessionState::Recording,
            cancel: self.state == SessionState::Recording,
            save: self.editor.dirty(),
        }
    }

    pub fn editor(&self) -> &TranscriptEditor {
        &self.editor
    }

    pub fn log(&self) -> &SegmentLog {
        &self.log
    }

    pub fn open_segment_id(&self) -> Option<&SegmentId> {
        self.current.as_ref().map(|seg| &seg.id)
    }

    /// Seed a segment restored from the server. Its artifacts already
    /// exist there, so later saves for it are overwrites. The editor is
    /// bound to it, so after a bulk reload the edit field holds the last
    /// restored utterance.
    pub fn seed_restored(&mut self, id: SegmentId, session: SessionId, text: String) {
        self.editor.bind(id.clone(), text.clone());
        self.log.push(SegmentRecord {
            id,
            session,
            text,
            time_code_start: 0,
            time_code_end: 0,
        });
    }

    /// Apply one event and return the commands it produces
    pub fn dispatch(&mut self, event: SessionEvent) -> Vec<Command> {
        match event {
            SessionEvent::SessionIdEdited { value } => {
                self.session_field = value;
                Vec::new()
            }
            SessionEvent::LanguageChanged { language } => {
                // Sticky: read at the next recognizer start
                self.language = language;
                Vec::new()
            }
            SessionEvent::AutoRestartChanged { enabled } => {
                self.auto_restart = enabled;
                Vec::new()
            }
            SessionEvent::StartPressed { now_ms } => self.on_start(now_ms),
            SessionEvent::SendPressed { now_ms } => self.on_send(now_ms),
            SessionEvent::CancelPressed => self.on_cancel(),
            SessionEvent::ErrorDismissed => self.on_dismiss(),
            SessionEvent::TranscriptEdited { text } => {
                self.editor.edit(text);
                Vec::new()
            }
            SessionEvent::SaveEditPressed => self.on_save_edit(),
            SessionEvent::Interim { generation, text } => self.on_interim(generation, text),
            SessionEvent::Final {
                generation,
                text,
                now_ms,
            } => self.on_final(generation, text, now_ms),
            SessionEvent::RecognizerEnded { generation, now_ms } => {
                self.on_recognizer_ended(generation, now_ms)
            }
            SessionEvent::RecognizerFailed { generation, kind } => {
                self.on_recognizer_failed(generation, kind)
            }
            SessionEvent::CaptureFailed { message } => self.on_capture_failed(message),
        }
    }

    fn stale(&self, generation: u64) -> bool {
        generation != self.generation
    }

    fn on_start(&mut self, now_ms: u64) -> Vec<Command> {
        if self.state != SessionState::Idle {
            return Vec::new();
        }
        let session = match self.session_field.parse::<SessionId>() {
            Ok(session) => session,
            Err(_) => {
                return vec![Command::Notify {
                    level: MessageLevel::Error,
                    text: "cannot record with empty session id".to_string(),
                }]
            }
        };

        let mut commands = Vec::new();
        self.flush_pending_edit(&mut commands);
        self.begin_capture(session, now_ms, &mut commands);
        self.state = SessionState::Recording;
        commands
    }

    /// Flush an unsaved user edit for the previously bound segment.
    /// Must run before a new segment id is allocated so no text is lost
    /// silently across a restart.
    fn flush_pending_edit(&mut self, commands: &mut Vec<Command>) {
        if !self.editor.dirty() {
            return;
        }
        let Some(id) = self.editor.segment().cloned() else {
            return;
        };
        let Some(session) = self.log.session_of(&id) else {
            return;
        };
        let overwrite = self.log.contains(&id);
        let text = self.editor.text().to_string();
        self.log.update_text(&id, &text);
        self.editor.mark_saved();
        commands.push(Command::SaveEditedText {
            segment_id: id,
            session_id: session,
            text,
            overwrite,
        });
    }

    fn begin_capture(&mut self, session: SessionId, now_ms: u64, commands: &mut Vec<Command>) {
        self.generation += 1;
        self.current = Some(OpenSegment::open(session, now_ms));
        self.editor.clear();
        commands.push(Command::ShowInterim {
            text: String::new(),
        });
        commands.push(Command::StartRecognizer {
            language: self.language.clone(),
            generation: self.generation,
        });
        commands.push(Command::StartRecorder);
        commands.push(Command::Notify {
            level: MessageLevel::Info,
            text: "Recording started".to_string(),
        });
    }

    fn on_send(&mut self, now_ms: u64) -> Vec<Command> {
        // A second stop request for the same segment is a no-op
        if self.state != SessionState::Recording {
            return Vec::new();
        }
        let Some(seg) = self.current.take() else {
            return Vec::new();
        };

        let overwrite = self.log.contains(&seg.id);
        let mut commands = vec![Command::StopRecognizer];
        if let Some(text) = seg.recognized.clone() {
            commands.push(Command::SaveRecognizedText {
                segment_id: seg.id.clone(),
                session_id: seg.session.clone(),
                text,
                overwrite,
            });
        }
        commands.push(Command::StopRecorder {
            flush: Some(AudioFlush {
                segment_id: seg.id.clone(),
                session_id: seg.session.clone(),
                overwrite,
                time_code_start: seg.opened_at_ms,
                time_code_end: now_ms,
            }),
        });

        self.editor
            .bind(seg.id.clone(), seg.recognized.clone().unwrap_or_default());
        self.log.push(SegmentRecord {
            id: seg.id,
            session: seg.session,
            text: seg.recognized.unwrap_or_default(),
            time_code_start: seg.opened_at_ms,
            time_code_end: now_ms,
        });
        self.state = SessionState::Stopping;
        commands
    }

    fn on_cancel(&mut self) -> Vec<Command> {
        if self.state != SessionState::Recording {
            return Vec::new();
        }
        // Discard the open segment; bump the generation so late events
        // from the aborted run cannot touch a newer segment
        self.current = None;
        self.generation += 1;
        self.state = SessionState::Idle;
        vec![
            Command::AbortRecognizer,
            Command::StopRecorder { flush: None },
            Command::ShowInterim {
                text: String::new(),
            },
            Command::Notify {
                level: MessageLevel::Info,
                text: "Recording cancelled".to_string(),
            },
        ]
    }

    fn on_dismiss(&mut self) -> Vec<Command> {
        if self.state == SessionState::Error {
            self.state = SessionState::Idle;
        }
        Vec::new()
    }

    fn on_save_edit(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();
        self.flush_pending_edit(&mut commands);
        commands
    }

    fn on_interim(&mut self, generation: u64, text: String) -> Vec<Command> {
        if self.stale(generation) || self.state != SessionState::Recording {
            return Vec::new();
        }
        vec![Command::ShowInterim { text }]
    }

    fn on_final(&mut self, generation: u64, text: String, now_ms: u64) -> Vec<Command> {
        if self.stale(generation) {
            return Vec::new();
        }
        match self.state {
            SessionState::Recording => match self.current.take() {
                Some(seg) => self.rotate(seg, text, now_ms),
                // Rotation already closed the span this result belongs to
                None => self.attach_late_final(text),
            },
            SessionState::Stopping => self.attach_late_final(text),
            _ => Vec::new(),
        }
    }

    /// Utterance boundary while still recording: close and flush the
    /// current segment, then immediately open a fresh one and resume.
    fn rotate(&mut self, seg: OpenSegment, text: String, now_ms: u64) -> Vec<Command> {
        // Flag computed before the id is recorded, so the text and audio
        // artifacts of a fresh segment both go out as first-time creates
        let overwrite = self.log.contains(&seg.id);

        let mut commands = vec![
            Command::ShowFinal {
                segment_id: seg.id.clone(),
                text: text.clone(),
            },
            Command::SaveRecognizedText {
                segment_id: seg.id.clone(),
                session_id: seg.session.clone(),
                text: text.clone(),
                overwrite,
            },
            Command::StopRecorder {
                flush: Some(AudioFlush {
                    segment_id: seg.id.clone(),
                    session_id: seg.session.clone(),
                    overwrite,
                    time_code_start: seg.opened_at_ms,
                    time_code_end: now_ms,
                }),
            },
        ];

        self.editor.bind(seg.id.clone(), text.clone());
        let session = seg.session.clone();
        self.log.push(SegmentRecord {
            id: seg.id,
            session: session.clone(),
            text,
            time_code_start: seg.opened_at_ms,
            time_code_end: now_ms,
        });

        // The recognizer keeps running across the rotation
        self.current = Some(OpenSegment::open(session, now_ms));
        commands.push(Command::StartRecorder);
        commands
    }

    /// A final result with no open recorder span attaches to the segment
    /// bound to the editor at dispatch time, never to an id captured
    /// earlier.
    fn attach_late_final(&mut self, text: String) -> Vec<Command> {
        let Some(id) = self.editor.segment().cloned() else {
            return Vec::new();
        };
        let Some(session) = self.log.session_of(&id) else {
            return Vec::new();
        };
        let overwrite = self.log.contains(&id);
        self.editor.fill(text.clone());
        self.log.update_text(&id, &text);
        vec![
            Command::ShowFinal {
                segment_id: id.clone(),
                text: text.clone(),
            },
            Command::SaveRecognizedText {
                segment_id: id,
                session_id: session,
                text,
                overwrite,
            },
        ]
    }

    fn on_recognizer_ended(&mut self, generation: u64, now_ms: u64) -> Vec<Command> {
        if self.stale(generation) {
            return Vec::new();
        }
        match self.state {
            SessionState::Stopping => {
                self.state = SessionState::Idle;
                Vec::new()
            }
            SessionState::Recording => {
                // Natural end of the run. No final arrived for the open
                // segment (a final would have rotated it), so its audio
                // is discarded.
                self.current = None;
                let mut commands = vec![Command::StopRecorder { flush: None }];
                if self.auto_restart && SessionId::is_valid(&self.session_field) {
                    let session = match self.session_field.parse::<SessionId>() {
                        Ok(session) => session,
                        Err(_) => {
                            self.state = SessionState::Idle;
                            return commands;
                        }
                    };
                    self.flush_pending_edit(&mut commands);
                    self.begin_capture(session, now_ms, &mut commands);
                } else {
                    self.state = SessionState::Idle;
                }
                commands
            }
            _ => Vec::new(),
        }
    }

    fn on_recognizer_failed(&mut self, generation: u64, kind: RecognizerErrorKind) -> Vec<Command> {
        if self.stale(generation) {
            // Expected tail of a cancelled run
            return Vec::new();
        }
        match kind {
            RecognizerErrorKind::Aborted => {
                // Aborted without a user cancel: wind down quietly
                self.current = None;
                self.generation += 1;
                self.state = SessionState::Idle;
                vec![
                    Command::StopRecorder { flush: None },
                    Command::Notify {
                        level: MessageLevel::Info,
                        text: kind.message(),
                    },
                ]
            }
            RecognizerErrorKind::Other(_) => {
                // Unknown code: report it and let the run's end event
                // wind the session down
                vec![Command::Notify {
                    level: MessageLevel::Info,
                    text: kind.message(),
                }]
            }
            _ => match self.state {
                SessionState::Recording | SessionState::Stopping => {
                    // No partial audio is persisted on error
                    self.current = None;
                    self.generation += 1;
                    self.state = SessionState::Error;
                    vec![
                        Command::StopRecorder { flush: None },
                        Command::AbortRecognizer,
                        Command::Notify {
                            level: MessageLevel::Error,
                            text: kind.message(),
                        },
                    ]
                }
                _ => vec![Command::Notify {
                    level: MessageLevel::Error,
                    text: kind.message(),
                }],
            },
        }
    }

    fn on_capture_failed(&mut self, message: String) -> Vec<Command> {
        match self.state {
            SessionState::Recording | SessionState::Stopping => {
                self.current = None;
                self.generation += 1;
                self.state = SessionState::Error;
                vec![
                    Command::StopRecorder { flush: None },
                    Command::AbortRecognizer,
                    Command::Notify {
                        level: MessageLevel::Error,
                        text: message,
                    },
                ]
            }
            _ => vec![Command::Notify {
                level: MessageLevel::Error,
                text: message,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> SessionMachine {
        let mut m = SessionMachine::new("sv", false);
        m.dispatch(SessionEvent::SessionIdEdited {
            value: "sess1".to_string(),
        });
        m
    }

    fn started() -> (SessionMachine, u64) {
        let mut m = machine();
        let commands = m.dispatch(SessionEvent::StartPressed { now_ms: 0 });
        let generation = commands
            .iter()
            .find_map(|c| match c {
                Command::StartRecognizer { generation, .. } => Some(*generation),
                _ => None,
            })
            .expect("start must launch the recognizer");
        (m, generation)
    }

    fn audio_flushes(commands: &[Command]) -> Vec<&AudioFlush> {
        commands
            .iter()
            .filter_map(|c| match c {
                Command::StopRecorder { flush: Some(f) } => Some(f),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn new_machine_is_idle() {
        let m = SessionMachine::new("sv", false);
        assert_eq!(m.state(), SessionState::Idle);
        assert!(m.open_segment_id().is_none());
    }

    #[test]
    fn start_rejected_without_session_id() {
        let mut m = SessionMachine::new("sv", false);
        let commands = m.dispatch(SessionEvent::StartPressed { now_ms: 0 });
        assert_eq!(m.state(), SessionState::Idle);
        assert!(commands
            .iter()
            .all(|c| matches!(c, Command::Notify { .. })));
        assert!(!m.controls().start);
    }

    #[test]
    fn start_rejected_with_whitespace_session_id() {
        let mut m = SessionMachine::new("sv", false);
        m.dispatch(SessionEvent::SessionIdEdited {
            value: "   ".to_string(),
        });
        m.dispatch(SessionEvent::StartPressed { now_ms: 0 });
        assert_eq!(m.state(), SessionState::Idle);
        assert!(!m.controls().start);
    }

    #[test]
    fn start_control_enables_with_session_id() {
        let mut m = SessionMachine::new("sv", false);
        assert!(!m.controls().start);
        m.dispatch(SessionEvent::SessionIdEdited {
            value: "s".to_string(),
        });
        assert!(m.controls().start);
    }

    #[test]
    fn start_opens_segment_and_launches_capture() {
        let (m, _) = started();
        assert_eq!(m.state(), SessionState::Recording);
        assert!(m.open_segment_id().is_some());
        let controls = m.controls();
        assert!(!controls.start);
        assert!(controls.send);
        assert!(controls.cancel);
    }

    #[test]
    fn start_from_recording_is_noop() {
        let (mut m, _) = started();
        let commands = m.dispatch(SessionEvent::StartPressed { now_ms: 10 });
        assert!(commands.is_empty());
    }

    #[test]
    fn interim_updates_live_display_only() {
        let (mut m, generation) = started();
        let before = m.open_segment_id().cloned();
        let commands = m.dispatch(SessionEvent::Interim {
            generation,
            text: "hel".to_string(),
        });
        assert_eq!(
            commands,
            vec![Command::ShowInterim {
                text: "hel".to_string()
            }]
        );
        assert_eq!(m.open_segment_id().cloned(), before);
        assert!(m.log().is_empty());
    }

    #[test]
    fn stale_interim_is_dropped() {
        let (mut m, generation) = started();
        let commands = m.dispatch(SessionEvent::Interim {
            generation: generation + 1,
            text: "zzz".to_string(),
        });
        assert!(commands.is_empty());
    }

    #[test]
    fn final_rotates_into_fresh_segment() {
        let (mut m, generation) = started();
        let first_id = m.open_segment_id().cloned().unwrap();

        let commands = m.dispatch(SessionEvent::Final {
            generation,
            text: "hello world".to_string(),
            now_ms: 1500,
        });

        // Still recording, but under a new id
        assert_eq!(m.state(), SessionState::Recording);
        let second_id = m.open_segment_id().cloned().unwrap();
        assert_ne!(first_id, second_id);

        // Text and audio both saved for the old id, first-time create
        let flushes = audio_flushes(&commands);
        assert_eq!(flushes.len(), 1);
        assert_eq!(flushes[0].segment_id, first_id);
        assert!(!flushes[0].overwrite);
        assert_eq!(flushes[0].time_code_start, 0);
        assert_eq!(flushes[0].time_code_end, 1500);

        assert!(commands.iter().any(|c| matches!(
            c,
            Command::SaveRecognizedText { segment_id, overwrite: false, .. }
            if *segment_id == first_id
        )));

        // Recorder restarts, recognizer is left running
        assert!(commands.iter().any(|c| matches!(c, Command::StartRecorder)));
        assert!(!commands
            .iter()
            .any(|c| matches!(c, Command::StartRecognizer { .. })));
        assert_eq!(m.log().len(), 1);
    }

    #[test]
    fn consecutive_finals_allocate_distinct_ids() {
        let (mut m, generation) = started();
        let mut flushed = Vec::new();
        for i in 1..=3u64 {
            let commands = m.dispatch(SessionEvent::Final {
                generation,
                text: format!("utterance {}", i),
                now_ms: i * 1000,
            });
            for flush in audio_flushes(&commands) {
                flushed.push(flush.segment_id.clone());
                assert!(!flush.overwrite);
            }
        }
        assert_eq!(flushed.len(), 3);
        assert_ne!(flushed[0], flushed[1]);
        assert_ne!(flushed[1], flushed[2]);
        assert_ne!(flushed[0], flushed[2]);
        assert_eq!(m.log().len(), 3);
    }

    #[test]
    fn send_flushes_audio_and_stops() {
        let (mut m, _) = started();
        let id = m.open_segment_id().cloned().unwrap();
        let commands = m.dispatch(SessionEvent::SendPressed { now_ms: 2000 });

        assert_eq!(m.state(), SessionState::Stopping);
        assert!(commands
            .iter()
            .any(|c| matches!(c, Command::StopRecognizer)));
        let flushes = audio_flushes(&commands);
        assert_eq!(flushes.len(), 1);
        assert_eq!(flushes[0].segment_id, id);
        assert!(!flushes[0].overwrite);
    }

    #[test]
    fn second_send_is_noop() {
        let (mut m, _) = started();
        m.dispatch(SessionEvent::SendPressed { now_ms: 2000 });
        let commands = m.dispatch(SessionEvent::SendPressed { now_ms: 2100 });
        assert!(commands.is_empty());
    }

    #[test]
    fn recognizer_end_completes_send() {
        let (mut m, generation) = started();
        m.dispatch(SessionEvent::SendPressed { now_ms: 2000 });
        m.dispatch(SessionEvent::RecognizerEnded {
            generation,
            now_ms: 2100,
        });
        assert_eq!(m.state(), SessionState::Idle);
        assert!(m.controls().start);
    }

    #[test]
    fn late_final_after_send_attaches_to_closed_segment() {
        let (mut m, generation) = started();
        let id = m.open_segment_id().cloned().unwrap();
        m.dispatch(SessionEvent::SendPressed { now_ms: 2000 });

        let commands = m.dispatch(SessionEvent::Final {
            generation,
            text: "better late".to_string(),
            now_ms: 2050,
        });

        assert!(commands.iter().any(|c| matches!(
            c,
            Command::SaveRecognizedText { segment_id, overwrite: true, .. }
            if *segment_id == id
        )));
        // No new recording span was opened
        assert!(m.open_segment_id().is_none());
        assert_eq!(m.log().records()[0].text, "better late");
    }

    #[test]
    fn cancel_discards_audio() {
        let (mut m, _) = started();
        let commands = m.dispatch(SessionEvent::CancelPressed);

        assert_eq!(m.state(), SessionState::Idle);
        assert!(commands
            .iter()
            .any(|c| matches!(c, Command::AbortRecognizer)));
        assert!(commands
            .iter()
            .any(|c| matches!(c, Command::StopRecorder { flush: None })));
        assert!(audio_flushes(&commands).is_empty());
        assert!(m.log().is_empty());
    }

    #[test]
    fn events_from_cancelled_run_are_dropped() {
        let (mut m, generation) = started();
        m.dispatch(SessionEvent::CancelPressed);

        assert!(m
            .dispatch(SessionEvent::Final {
                generation,
                text: "ghost".to_string(),
                now_ms: 3000,
            })
            .is_empty());
        assert!(m
            .dispatch(SessionEvent::RecognizerFailed {
                generation,
                kind: RecognizerErrorKind::Aborted,
            })
            .is_empty());
        assert!(m
            .dispatch(SessionEvent::RecognizerEnded {
                generation,
                now_ms: 3000,
            })
            .is_empty());
        assert!(m.log().is_empty());
    }

    #[test]
    fn cancel_from_stopping_is_noop() {
        let (mut m, _) = started();
        m.dispatch(SessionEvent::SendPressed { now_ms: 1000 });
        let commands = m.dispatch(SessionEvent::CancelPressed);
        assert!(commands.is_empty());
        assert_eq!(m.state(), SessionState::Stopping);
    }

    #[test]
    fn recognizer_error_discards_audio_and_enters_error() {
        let (mut m, generation) = started();
        let commands = m.dispatch(SessionEvent::RecognizerFailed {
            generation,
            kind: RecognizerErrorKind::AudioCapture,
        });

        assert_eq!(m.state(), SessionState::Error);
        assert!(commands
            .iter()
            .any(|c| matches!(c, Command::StopRecorder { flush: None })));
        assert!(commands.iter().any(|c| matches!(
            c,
            Command::Notify {
                level: MessageLevel::Error,
                ..
            }
        )));
        let controls = m.controls();
        assert!(!controls.start);
        assert!(!controls.send);
        assert!(!controls.cancel);
    }

    #[test]
    fn dismiss_recovers_from_error() {
        let (mut m, generation) = started();
        m.dispatch(SessionEvent::RecognizerFailed {
            generation,
            kind: RecognizerErrorKind::Network,
        });
        m.dispatch(SessionEvent::ErrorDismissed);
        assert_eq!(m.state(), SessionState::Idle);
        assert!(m.controls().start);
    }

    #[test]
    fn capture_failure_enters_error() {
        let (mut m, _) = started();
        let commands = m.dispatch(SessionEvent::CaptureFailed {
            message: "no microphone".to_string(),
        });
        assert_eq!(m.state(), SessionState::Error);
        assert!(commands
            .iter()
            .any(|c| matches!(c, Command::AbortRecognizer)));
    }

    #[test]
    fn natural_end_without_auto_restart_goes_idle() {
        let (mut m, generation) = started();
        let commands = m.dispatch(SessionEvent::RecognizerEnded {
            generation,
            now_ms: 5000,
        });
        assert_eq!(m.state(), SessionState::Idle);
        assert!(commands
            .iter()
            .any(|c| matches!(c, Command::StopRecorder { flush: None })));
        assert!(!commands
            .iter()
            .any(|c| matches!(c, Command::StartRecognizer { .. })));
    }

    #[test]
    fn natural_end_with_auto_restart_resumes() {
        let mut m = SessionMachine::new("sv", true);
        m.dispatch(SessionEvent::SessionIdEdited {
            value: "sess1".to_string(),
        });
        let commands = m.dispatch(SessionEvent::StartPressed { now_ms: 0 });
        let generation = commands
            .iter()
            .find_map(|c| match c {
                Command::StartRecognizer { generation, .. } => Some(*generation),
                _ => None,
            })
            .unwrap();
        let first_id = m.open_segment_id().cloned().unwrap();

        let commands = m.dispatch(SessionEvent::RecognizerEnded {
            generation,
            now_ms: 5000,
        });

        assert_eq!(m.state(), SessionState::Recording);
        let restarted = commands
            .iter()
            .find_map(|c| match c {
                Command::StartRecognizer { generation, .. } => Some(*generation),
                _ => None,
            })
            .expect("auto-restart relaunches the recognizer");
        assert_eq!(restarted, generation + 1);
        assert_ne!(m.open_segment_id().cloned().unwrap(), first_id);
    }

    #[test]
    fn auto_restart_does_not_fire_after_send() {
        let mut m = SessionMachine::new("sv", true);
        m.dispatch(SessionEvent::SessionIdEdited {
            value: "sess1".to_string(),
        });
        let commands = m.dispatch(SessionEvent::StartPressed { now_ms: 0 });
        let generation = commands
            .iter()
            .find_map(|c| match c {
                Command::StartRecognizer { generation, .. } => Some(*generation),
                _ => None,
            })
            .unwrap();

        m.dispatch(SessionEvent::SendPressed { now_ms: 1000 });
        let commands = m.dispatch(SessionEvent::RecognizerEnded {
            generation,
            now_ms: 1100,
        });

        assert_eq!(m.state(), SessionState::Idle);
        assert!(commands.is_empty());
    }

    #[test]
    fn dirty_edit_is_flushed_before_new_segment() {
        let (mut m, generation) = started();
        let first_id = m.open_segment_id().cloned().unwrap();

        // Close the first segment, edit its transcript, then restart
        m.dispatch(SessionEvent::SendPressed { now_ms: 1000 });
        m.dispatch(SessionEvent::RecognizerEnded {
            generation,
            now_ms: 1100,
        });
        m.dispatch(SessionEvent::TranscriptEdited {
            text: "fixed transcript".to_string(),
        });
        assert!(m.controls().save);

        let commands = m.dispatch(SessionEvent::StartPressed { now_ms: 2000 });

        let edit_pos = commands
            .iter()
            .position(|c| {
                matches!(
                    c,
                    Command::SaveEditedText { segment_id, overwrite: true, text, .. }
                    if *segment_id == first_id && text == "fixed transcript"
                )
            })
            .expect("edit must be flushed");
        let capture_pos = commands
            .iter()
            .position(|c| matches!(c, Command::StartRecognizer { .. }))
            .unwrap();
        assert!(edit_pos < capture_pos);
        assert_ne!(m.open_segment_id().cloned().unwrap(), first_id);
    }

    #[test]
    fn save_edit_issues_single_overwrite_save() {
        let (mut m, generation) = started();
        let id = m.open_segment_id().cloned().unwrap();
        m.dispatch(SessionEvent::SendPressed { now_ms: 1000 });
        m.dispatch(SessionEvent::RecognizerEnded {
            generation,
            now_ms: 1100,
        });

        m.dispatch(SessionEvent::TranscriptEdited {
            text: "edited".to_string(),
        });
        let commands = m.dispatch(SessionEvent::SaveEditPressed);
        assert_eq!(commands.len(), 1);
        assert!(matches!(
            &commands[0],
            Command::SaveEditedText { segment_id, overwrite: true, .. }
            if *segment_id == id
        ));

        // Saved: the control disables and a repeat press does nothing
        assert!(!m.controls().save);
        assert!(m.dispatch(SessionEvent::SaveEditPressed).is_empty());

        // It re-enables only when the text differs from the saved edit
        m.dispatch(SessionEvent::TranscriptEdited {
            text: "edited".to_string(),
        });
        assert!(!m.controls().save);
        m.dispatch(SessionEvent::TranscriptEdited {
            text: "edited again".to_string(),
        });
        assert!(m.controls().save);
    }

    #[test]
    fn restored_segments_are_overwritten_on_resave() {
        let mut m = machine();
        let restored = SegmentId::from_basename("utt_restored");
        m.seed_restored(
            restored.clone(),
            "sess1".parse().unwrap(),
            "old text".to_string(),
        );

        // The editor holds the restored utterance; editing and saving it
        // targets an artifact the server already has
        m.dispatch(SessionEvent::TranscriptEdited {
            text: "new text".to_string(),
        });
        let commands = m.dispatch(SessionEvent::SaveEditPressed);
        assert!(matches!(
            &commands[0],
            Command::SaveEditedText { segment_id, overwrite: true, .. }
            if *segment_id == restored
        ));

        // Recording against the same log: fresh segments stay creates
        let commands = m.dispatch(SessionEvent::StartPressed { now_ms: 0 });
        let generation = commands
            .iter()
            .find_map(|c| match c {
                Command::StartRecognizer { generation, .. } => Some(*generation),
                _ => None,
            })
            .unwrap();
        let commands = m.dispatch(SessionEvent::Final {
            generation,
            text: "fresh".to_string(),
            now_ms: 500,
        });
        assert!(audio_flushes(&commands).iter().all(|f| !f.overwrite));
    }

    #[test]
    fn language_change_applies_on_next_start() {
        let (mut m, generation) = started();
        m.dispatch(SessionEvent::LanguageChanged {
            language: "en-US".to_string(),
        });
        m.dispatch(SessionEvent::SendPressed { now_ms: 1000 });
        m.dispatch(SessionEvent::RecognizerEnded {
            generation,
            now_ms: 1100,
        });

        let commands = m.dispatch(SessionEvent::StartPressed { now_ms: 2000 });
        assert!(commands.iter().any(|c| matches!(
            c,
            Command::StartRecognizer { language, .. } if language == "en-US"
        )));
    }

    #[test]
    fn state_display() {
        assert_eq!(SessionState::Idle.to_string(), "idle");
        assert_eq!(SessionState::Recording.to_string(), "recording");
        assert_eq!(SessionState::Stopping.to_string(), "stopping");
        assert_eq!(SessionState::Error.to_string(), "error");
    }
}
