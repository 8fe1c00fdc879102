//! Dictation session controller
//!
//! The effect runner around [`SessionMachine`]: user intents and
//! recognizer signals become machine events, and the returned commands
//! are executed against the recorder, the recognizer and the artifact
//! store. Artifact saves are fire-and-forget: each runs in its own task,
//! reports its outcome to the message callback, and is never retried; the
//! in-memory segment log is not rolled back on failure.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::sync::Mutex;

use crate::application::ports::{
    ArtifactStore, AudioSave, RecognizerEvent, RecognizerSignal, SpeechRecognizer, TextSave,
    UtteranceRecorder,
};
use crate::domain::audio::AudioClip;
use crate::domain::session::{
    AudioFlush, Command, Controls, MessageLevel, SegmentId, SessionEvent, SessionId,
    SessionMachine, SessionState,
};

/// Presentation callbacks - the controller's only view of the UI
#[derive(Default)]
pub struct SessionCallbacks {
    /// Live/interim transcript changed (empty string clears it)
    pub on_interim: Option<Box<dyn Fn(&str) + Send + Sync>>,
    /// A final transcript was attached to a segment
    pub on_final: Option<Box<dyn Fn(&SegmentId, &str) + Send + Sync>>,
    /// A line for the user-visible message area
    pub on_message: Option<Box<dyn Fn(MessageLevel, &str) + Send + Sync>>,
    /// Control enablement changed
    pub on_controls: Option<Box<dyn Fn(Controls) + Send + Sync>>,
}

impl SessionCallbacks {
    fn interim(&self, text: &str) {
        if let Some(cb) = &self.on_interim {
            cb(text);
        }
    }

    fn final_text(&self, segment: &SegmentId, text: &str) {
        if let Some(cb) = &self.on_final {
            cb(segment, text);
        }
    }

    fn message(&self, level: MessageLevel, text: &str) {
        if let Some(cb) = &self.on_message {
            cb(level, text);
        }
    }

    fn controls(&self, controls: Controls) {
        if let Some(cb) = &self.on_controls {
            cb(controls);
        }
    }
}

/// Coordinates the recorder, the recognizer and the artifact store around
/// the session state machine.
pub struct SessionController<R, G, S>
where
    R: UtteranceRecorder,
    G: SpeechRecognizer,
    S: ArtifactStore + 'static,
{
    recorder: R,
    recognizer: G,
    store: Arc<S>,
    machine: Mutex<SessionMachine>,
    callbacks: Arc<SessionCallbacks>,
    /// Session epoch: time codes are milliseconds from here
    epoch: Instant,
    /// Wall-clock session start, for the human-readable save timestamps
    started_at: DateTime<Utc>,
}

impl<R, G, S> SessionController<R, G, S>
where
    R: UtteranceRecorder,
    G: SpeechRecognizer,
    S: ArtifactStore + 'static,
{
    pub fn new(
        recorder: R,
        recognizer: G,
        store: Arc<S>,
        machine: SessionMachine,
        callbacks: SessionCallbacks,
    ) -> Self {
        Self {
            recorder,
            recognizer,
            store,
            machine: Mutex::new(machine),
            callbacks: Arc::new(callbacks),
            epoch: Instant::now(),
            started_at: Utc::now(),
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn wall_time(&self, time_code_ms: u64) -> String {
        (self.started_at + chrono::Duration::milliseconds(time_code_ms as i64))
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub async fn state(&self) -> SessionState {
        self.machine.lock().await.state()
    }

    pub async fn controls(&self) -> Controls {
        self.machine.lock().await.controls()
    }

    pub async fn saved_count(&self) -> usize {
        self.machine.lock().await.log().len()
    }

    pub async fn transcript(&self) -> String {
        self.machine.lock().await.editor().text().to_string()
    }

    /// Seed a segment restored from the server
    pub async fn seed_restored(&self, id: SegmentId, session: SessionId, text: String) {
        self.machine.lock().await.seed_restored(id, session, text);
    }

    pub async fn set_session_id(&self, value: &str) {
        self.dispatch(SessionEvent::SessionIdEdited {
            value: value.to_string(),
        })
        .await;
    }

    pub async fn set_language(&self, language: &str) {
        self.dispatch(SessionEvent::LanguageChanged {
            language: language.to_string(),
        })
        .await;
    }

    pub async fn set_auto_restart(&self, enabled: bool) {
        self.dispatch(SessionEvent::AutoRestartChanged { enabled })
            .await;
    }

    pub async fn start(&self) {
        self.dispatch(SessionEvent::StartPressed {
            now_ms: self.now_ms(),
        })
        .await;
    }

    pub async fn send(&self) {
        self.dispatch(SessionEvent::SendPressed {
            now_ms: self.now_ms(),
        })
        .await;
    }

    pub async fn cancel(&self) {
        self.dispatch(SessionEvent::CancelPressed).await;
    }

    pub async fn dismiss_error(&self) {
        self.dispatch(SessionEvent::ErrorDismissed).await;
    }

    pub async fn edit_transcript(&self, text: &str) {
        self.dispatch(SessionEvent::TranscriptEdited {
            text: text.to_string(),
        })
        .await;
    }

    pub async fn save_edit(&self) {
        self.dispatch(SessionEvent::SaveEditPressed).await;
    }

    /// Feed one recognizer signal into the machine
    pub async fn handle_signal(&self, signal: RecognizerSignal) {
        let generation = signal.generation;
        let event = match signal.event {
            RecognizerEvent::Interim { text } => SessionEvent::Interim { generation, text },
            RecognizerEvent::Final { text } => SessionEvent::Final {
                generation,
                text,
                now_ms: self.now_ms(),
            },
            RecognizerEvent::Ended => SessionEvent::RecognizerEnded {
                generation,
                now_ms: self.now_ms(),
            },
            RecognizerEvent::Failed { kind } => {
                SessionEvent::RecognizerFailed { generation, kind }
            }
        };
        self.dispatch(event).await;
    }

    async fn dispatch(&self, event: SessionEvent) {
        let mut pending = vec![event];
        while let Some(event) = pending.pop() {
            let commands = {
                let mut machine = self.machine.lock().await;
                machine.dispatch(event)
            };
            let follow_ups = self.execute(commands).await;
            pending.extend(follow_ups);
        }
        let controls = self.machine.lock().await.controls();
        self.callbacks.controls(controls);
    }

    /// Execute a command list. Capability failures that must feed back
    /// into the machine are returned as follow-up events.
    async fn execute(&self, commands: Vec<Command>) -> Vec<SessionEvent> {
        let mut follow_ups = Vec::new();
        for command in commands {
            match command {
                Command::StartRecognizer {
                    language,
                    generation,
                } => {
                    if let Err(e) = self.recognizer.start(&language, generation).await {
                        follow_ups.push(SessionEvent::CaptureFailed {
                            message: format!("Recognizer start failed: {}", e),
                        });
                    }
                }
                Command::StopRecognizer => {
                    if let Err(e) = self.recognizer.stop().await {
                        // Wrapped: an invalid-state stop never blocks the
                        // transition
                        self.callbacks.message(
                            MessageLevel::Info,
                            &format!("Recognizer stop: {}", e),
                        );
                    }
                }
                Command::AbortRecognizer => {
                    if let Err(e) = self.recognizer.abort().await {
                        self.callbacks.message(
                            MessageLevel::Info,
                            &format!("Recognizer abort: {}", e),
                        );
                    }
                }
                Command::StartRecorder => {
                    if let Err(e) = self.recorder.start().await {
                        follow_ups.push(SessionEvent::CaptureFailed {
                            message: format!("Recorder start failed: {}", e),
                        });
                    }
                }
                Command::StopRecorder { flush } => match flush {
                    None => {
                        if let Err(e) = self.recorder.cancel().await {
                            self.callbacks.message(
                                MessageLevel::Info,
                                &format!("Recorder stop: {}", e),
                            );
                        }
                    }
                    Some(flush) => match self.recorder.stop().await {
                        Ok(clip) => self.spawn_audio_save(flush, clip),
                        Err(e) => {
                            self.callbacks.message(
                                MessageLevel::Error,
                                &format!("Recorder stop failed: {}", e),
                            );
                        }
                    },
                },
                Command::SaveRecognizedText {
                    segment_id,
                    session_id,
                    text,
                    overwrite,
                } => {
                    let store = Arc::clone(&self.store);
                    let callbacks = Arc::clone(&self.callbacks);
                    let save = TextSave {
                        session_id,
                        segment_id,
                        text,
                        overwrite,
                    };
                    tokio::spawn(async move {
                        match store.save_recognized_text(save).await {
                            Ok(message) => callbacks.message(MessageLevel::Info, &message),
                            Err(e) => callbacks.message(
                                MessageLevel::Error,
                                &format!("Text save failed: {}", e),
                            ),
                        }
                    });
                }
                Command::SaveEditedText {
                    segment_id,
                    session_id,
                    text,
                    overwrite,
                } => {
                    let store = Arc::clone(&self.store);
                    let callbacks = Arc::clone(&self.callbacks);
                    let save = TextSave {
                        session_id,
                        segment_id,
                        text,
                        overwrite,
                    };
                    tokio::spawn(async move {
                        match store.save_edited_text(save).await {
                            Ok(message) => callbacks.message(MessageLevel::Info, &message),
                            Err(e) => callbacks.message(
                                MessageLevel::Error,
                                &format!("Edit save failed: {}", e),
                            ),
                        }
                    });
                }
                Command::ShowInterim { text } => self.callbacks.interim(&text),
                Command::ShowFinal { segment_id, text } => {
                    self.callbacks.final_text(&segment_id, &text)
                }
                Command::Notify { level, text } => self.callbacks.message(level, &text),
            }
        }
        follow_ups
    }

    /// Upload a flushed clip. The flush carries the segment id by value,
    /// so a slow response cannot end up attached to a newer segment.
    fn spawn_audio_save(&self, flush: AudioFlush, clip: AudioClip) {
        let store = Arc::clone(&self.store);
        let callbacks = Arc::clone(&self.callbacks);
        let save = AudioSave {
            session_id: flush.session_id,
            segment_id: flush.segment_id,
            clip,
            overwrite: flush.overwrite,
            start_time: self.wall_time(flush.time_code_start),
            end_time: self.wall_time(flush.time_code_end),
            time_code_start: flush.time_code_start,
            time_code_end: flush.time_code_end,
        };
        tokio::spawn(async move {
            match store.save_audio(save).await {
                Ok(message) => callbacks.message(MessageLevel::Info, &message),
                Err(e) => {
                    callbacks.message(MessageLevel::Error, &format!("Audio save failed: {}", e))
                }
            }
        });
    }
}
