//! Main app runner for the interactive dictation loop

use crate::domain::abbrev::AbbrevMap;
use crate::domain::config::AppConfig;

use super::presenter::Presenter;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Load and merge configuration: defaults < file < CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    use crate::application::ports::ConfigStore;
    use crate::infrastructure::XdgConfigStore;

    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|_| AppConfig::empty());

    AppConfig::defaults().merge(file_config).merge(cli_config)
}

/// Re-play typed text through the abbreviation expander, expanding each
/// token as its trailing space is typed
pub fn expand_typed(abbrevs: &AbbrevMap, text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        out.push(ch);
        if ch == ' ' {
            if let Some(expanded) = abbrevs.expand(&out, out.len()) {
                out = expanded.text;
            }
        }
    }
    out
}

fn print_loop_help(presenter: &Presenter) {
    presenter.info("Commands:");
    presenter.info("  start | s        begin recording");
    presenter.info("  send  | <empty>  close the utterance and upload it");
    presenter.info("  cancel | c       discard the current utterance");
    presenter.info("  edit <text>      replace the transcript (abbreviations expand)");
    presenter.info("  save             upload the edited transcript");
    presenter.info("  dismiss          clear an error");
    presenter.info("  status           show session state");
    presenter.info("  quit | q         exit");
}

#[cfg(unix)]
mod dictate {
    use std::process::ExitCode;
    use std::sync::Arc;

    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::sync::mpsc;

    use crate::application::ports::AbbrevStore;
    use crate::application::{restore_session, SessionCallbacks, SessionController};
    use crate::cli::args::DictateOptions;
    use crate::cli::presenter::Presenter;
    use crate::domain::abbrev::AbbrevMap;
    use crate::domain::session::{
        MessageLevel, SegmentId, SessionId, SessionMachine, SessionState,
    };
    use crate::infrastructure::{
        CpalRecorder, DictationClient, RecognizerSocketPath, SocketRecognizer,
    };

    use super::{expand_typed, print_loop_help, EXIT_SUCCESS};

    type Controller = SessionController<CpalRecorder, SocketRecognizer, DictationClient>;

    /// Run the interactive dictation loop
    pub async fn run_dictation(options: DictateOptions) -> ExitCode {
        let presenter = Arc::new(Presenter::new());

        let client = Arc::new(DictationClient::new(options.server_url.as_str()));

        // Abbreviation table from the server; an unreachable server just
        // leaves it empty
        let abbrevs = match AbbrevStore::list(client.as_ref()).await {
            Ok(entries) => {
                presenter.info(&format!("Loaded {} abbreviations", entries.len()));
                AbbrevMap::from_entries(entries)
            }
            Err(e) => {
                presenter.warn(&format!("Abbreviations unavailable: {}", e));
                AbbrevMap::new()
            }
        };

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let socket_path = options
            .recognizer_socket
            .clone()
            .map(RecognizerSocketPath::with_path)
            .unwrap_or_default();
        let recognizer = SocketRecognizer::new(socket_path, events_tx);
        let recorder = CpalRecorder::new();

        let callbacks = {
            let interim_presenter = Arc::clone(&presenter);
            let final_presenter = Arc::clone(&presenter);
            let message_presenter = Arc::clone(&presenter);
            SessionCallbacks {
                on_interim: Some(Box::new(move |text| {
                    if text.is_empty() {
                        interim_presenter.clear_live();
                    } else {
                        interim_presenter.live(text);
                    }
                })),
                on_final: Some(Box::new(move |_, text| {
                    final_presenter.clear_live();
                    final_presenter.output(text);
                })),
                on_message: Some(Box::new(move |level, text| match level {
                    MessageLevel::Info => message_presenter.info(text),
                    MessageLevel::Error => message_presenter.error(text),
                })),
                on_controls: None,
            }
        };

        let machine = SessionMachine::new(options.language.as_str(), options.auto_restart);
        let controller = Arc::new(SessionController::new(
            recorder,
            recognizer,
            Arc::clone(&client),
            machine,
            callbacks,
        ));

        if let Some(session) = &options.session {
            controller.set_session_id(session).await;
        }

        if options.load_from_server {
            reload_session(&options, &controller, client.as_ref(), &presenter).await;
        }

        // Pump recognizer signals into the controller
        let pump_controller = Arc::clone(&controller);
        let pump = tokio::spawn(async move {
            while let Some(signal) = events_rx.recv().await {
                pump_controller.handle_signal(signal).await;
            }
        });

        print_loop_help(&presenter);

        let mut input = BufReader::new(tokio::io::stdin()).lines();
        let mut interrupted = false;
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    let busy = matches!(
                        controller.state().await,
                        SessionState::Recording | SessionState::Stopping
                    );
                    if busy && !interrupted {
                        // Navigation guard: one warning while capture is live
                        interrupted = true;
                        presenter.warn("Recording in progress; Ctrl+C again to quit");
                        continue;
                    }
                    break;
                }
                line = input.next_line() => {
                    let Ok(Some(line)) = line else { break; };
                    interrupted = false;
                    if !handle_line(&controller, &presenter, &abbrevs, line.trim()).await {
                        break;
                    }
                }
            }
        }

        controller.cancel().await;
        pump.abort();
        ExitCode::from(EXIT_SUCCESS)
    }

    async fn reload_session(
        options: &DictateOptions,
        controller: &Arc<Controller>,
        client: &DictationClient,
        presenter: &Presenter,
    ) {
        let Some(session_field) = &options.session else {
            presenter.error("--load-from-server requires --session");
            return;
        };
        let session = match session_field.parse::<SessionId>() {
            Ok(session) => session,
            Err(e) => {
                presenter.error(&e.to_string());
                return;
            }
        };
        match restore_session(client, &session).await {
            Ok(restored) => {
                for utterance in &restored {
                    presenter.output(&format!("{}  {}", utterance.basename, utterance.text));
                    controller
                        .seed_restored(
                            SegmentId::from_basename(&utterance.basename),
                            session.clone(),
                            utterance.text.clone(),
                        )
                        .await;
                }
                presenter.success(&format!("Reloaded {} utterances", restored.len()));
            }
            Err(e) => presenter.error(&format!("Reload failed: {}", e)),
        }
    }

    /// Process one input line; false ends the loop
    async fn handle_line(
        controller: &Arc<Controller>,
        presenter: &Presenter,
        abbrevs: &AbbrevMap,
        line: &str,
    ) -> bool {
        match line {
            "" | "send" => controller.send().await,
            "start" | "s" => controller.start().await,
            "cancel" | "c" => controller.cancel().await,
            "save" => controller.save_edit().await,
            "dismiss" => controller.dismiss_error().await,
            "status" => {
                let state = controller.state().await;
                let saved = controller.saved_count().await;
                let transcript = controller.transcript().await;
                presenter.info(&format!("State: {}", state));
                presenter.info(&format!("Saved utterances: {}", saved));
                if !transcript.is_empty() {
                    presenter.info(&format!("Transcript: {}", transcript));
                }
            }
            "help" | "?" => print_loop_help(presenter),
            "quit" | "q" => return false,
            _ => {
                if let Some(text) = line.strip_prefix("edit ") {
                    // The transcript field expands abbreviations as it is
                    // typed; replay the edit through the same path
                    let text = expand_typed(abbrevs, text.trim());
                    controller.edit_transcript(&text).await;
                } else if let Some(language) = line.strip_prefix("lang ") {
                    controller.set_language(language.trim()).await;
                    presenter.info(&format!("Language set to {}", language.trim()));
                } else {
                    presenter.warn(&format!("Unknown command '{}', try 'help'", line));
                }
            }
        }
        true
    }
}

#[cfg(unix)]
pub use dictate::run_dictation;

#[cfg(not(unix))]
pub async fn run_dictation(_options: super::args::DictateOptions) -> std::process::ExitCode {
    let presenter = Presenter::new();
    presenter.error("Interactive dictation requires unix domain sockets on this build");
    std::process::ExitCode::from(EXIT_ERROR)
}
