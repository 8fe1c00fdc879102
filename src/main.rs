//! Dictator CLI entry point

use std::process::ExitCode;

use clap::Parser;

use dictator::cli::{
    app::{load_merged_config, run_dictation, EXIT_ERROR},
    args::{Cli, Commands, DictateOptions},
    config_cmd::handle_config_command,
    presenter::Presenter,
    server_cmd::{
        handle_abbrev_command, handle_doc_command, handle_pull_command, handle_sessions_command,
    },
};
use dictator::domain::config::AppConfig;
use dictator::infrastructure::{DictationClient, XdgConfigStore};

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();

    // Build CLI config from args
    let cli_config = AppConfig {
        server_url: cli.server.clone(),
        session: cli.session.clone(),
        language: cli.language.clone(),
        auto_restart: if cli.auto_restart { Some(true) } else { None },
    };

    // Merge config: defaults < file < cli
    let config = load_merged_config(cli_config).await;

    // Handle subcommands
    match cli.command {
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        Some(Commands::Abbrev { action }) => {
            let client = DictationClient::new(config.server_url_or_default());
            if let Err(e) = handle_abbrev_command(action, &client, &presenter).await {
                presenter.error(&e);
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        Some(Commands::Sessions { action }) => {
            let client = DictationClient::new(config.server_url_or_default());
            if let Err(e) = handle_sessions_command(action, &client, &presenter).await {
                presenter.error(&e);
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        Some(Commands::Pull { action }) => {
            let client = DictationClient::new(config.server_url_or_default());
            let mut presenter = presenter;
            if let Err(e) = handle_pull_command(action, &client, &mut presenter).await {
                presenter.error(&e);
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        Some(Commands::Doc) => {
            let client = DictationClient::new(config.server_url_or_default());
            if let Err(e) = handle_doc_command(&client, &presenter).await {
                presenter.error(&e);
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        None => {}
    }

    // Interactive dictation mode
    let options = DictateOptions {
        server_url: config.server_url_or_default().to_string(),
        session: config.session.clone(),
        language: config.language_or_default().to_string(),
        auto_restart: config.auto_restart_or_default(),
        load_from_server: cli.load_from_server,
        recognizer_socket: cli.recognizer_socket,
    };

    run_dictation(options).await
}
