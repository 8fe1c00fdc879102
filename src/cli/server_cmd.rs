//! Server-facing subcommand handlers: abbreviations, session listings,
//! artifact fetches, and the API doc listing.

use std::path::PathBuf;

use crate::application::ports::{AbbrevStore, ArtifactStore};
use crate::domain::session::SessionId;
use crate::infrastructure::DictationClient;

use super::args::{AbbrevAction, PullAction, SessionsAction};
use super::presenter::Presenter;

/// Handle the abbrev subcommand
pub async fn handle_abbrev_command(
    action: AbbrevAction,
    client: &DictationClient,
    presenter: &Presenter,
) -> Result<(), String> {
    match action {
        AbbrevAction::List => {
            let entries = AbbrevStore::list(client).await.map_err(|e| e.to_string())?;
            if entries.is_empty() {
                presenter.info("No abbreviations defined");
            }
            for entry in entries {
                presenter.key_value(&entry.abbrev, &entry.expansion);
            }
        }
        AbbrevAction::Add { abbrev, expansion } => {
            let abbrev = abbrev.trim().to_string();
            let expansion = expansion.trim().to_string();
            if abbrev.is_empty() {
                return Err("Cannot add empty abbreviation".to_string());
            }
            if expansion.is_empty() {
                return Err("Cannot add empty expansion".to_string());
            }
            client
                .add(&abbrev, &expansion)
                .await
                .map_err(|e| e.to_string())?;
            presenter.success(&format!("{} -> {}", abbrev, expansion));
        }
        AbbrevAction::Delete { abbrev } => {
            let abbrev = abbrev.trim().to_string();
            if abbrev.is_empty() {
                return Err("Cannot delete empty abbreviation".to_string());
            }
            client.delete(&abbrev).await.map_err(|e| e.to_string())?;
            presenter.success(&format!("Deleted '{}'", abbrev));
        }
    }
    Ok(())
}

/// Handle the sessions subcommand
pub async fn handle_sessions_command(
    action: SessionsAction,
    client: &DictationClient,
    presenter: &Presenter,
) -> Result<(), String> {
    match action {
        SessionsAction::List => {
            for session in client.list_sessions().await.map_err(|e| e.to_string())? {
                presenter.output(&session);
            }
        }
        SessionsAction::Files { session } => {
            let session = parse_session(&session)?;
            for file in client
                .list_files(&session)
                .await
                .map_err(|e| e.to_string())?
            {
                presenter.output(&file);
            }
        }
        SessionsAction::Basenames { session } => {
            let session = parse_session(&session)?;
            for basename in client
                .list_basenames(&session)
                .await
                .map_err(|e| e.to_string())?
            {
                presenter.output(&basename);
            }
        }
    }
    Ok(())
}

/// Handle the pull subcommand
pub async fn handle_pull_command(
    action: PullAction,
    client: &DictationClient,
    presenter: &mut Presenter,
) -> Result<(), String> {
    match action {
        PullAction::Text {
            session,
            file,
            recognized,
        } => {
            let session = parse_session(&session)?;
            let stored = if recognized {
                client.fetch_recognized_text(&session, &file).await
            } else {
                client.fetch_edited_text(&session, &file).await
            }
            .map_err(|e| e.to_string())?;

            if stored.text.is_empty() {
                presenter.warn(&stored.message);
            } else {
                presenter.output(&stored.text);
            }
        }
        PullAction::Audio {
            session,
            file,
            output,
        } => {
            let session = parse_session(&session)?;
            presenter.start_spinner(&format!("Fetching {}...", file));
            let stored = match client.fetch_audio(&session, &file).await {
                Ok(stored) => stored,
                Err(e) => {
                    presenter.spinner_fail("Fetch failed");
                    return Err(e.to_string());
                }
            };

            if stored.data.is_empty() {
                presenter.spinner_fail(&stored.message);
                return Ok(());
            }

            let path = output.unwrap_or_else(|| default_audio_path(&file, &stored.file_type));
            tokio::fs::write(&path, &stored.data)
                .await
                .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
            presenter.spinner_success(&format!(
                "Saved {} ({} bytes)",
                path.display(),
                stored.data.len()
            ));
        }
    }
    Ok(())
}

/// Handle the doc subcommand
pub async fn handle_doc_command(
    client: &DictationClient,
    presenter: &Presenter,
) -> Result<(), String> {
    let doc = client.api_doc().await.map_err(|e| e.to_string())?;
    for line in doc.lines() {
        presenter.output(line);
    }
    Ok(())
}

fn parse_session(value: &str) -> Result<SessionId, String> {
    value.parse::<SessionId>().map_err(|e| e.to_string())
}

/// Default output path for fetched audio: the file name, with an
/// extension derived from the reported MIME type when it has none
fn default_audio_path(file: &str, file_type: &str) -> PathBuf {
    let path = PathBuf::from(file);
    if path.extension().is_some() {
        return path;
    }
    let ext = file_type.strip_prefix("audio/").unwrap_or("webm");
    path.with_extension(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_audio_path_keeps_existing_extension() {
        assert_eq!(
            default_audio_path("utt_1.webm", "audio/webm"),
            PathBuf::from("utt_1.webm")
        );
    }

    #[test]
    fn default_audio_path_derives_extension_from_mime() {
        assert_eq!(
            default_audio_path("utt_1", "audio/flac"),
            PathBuf::from("utt_1.flac")
        );
    }

    #[test]
    fn default_audio_path_falls_back_to_webm() {
        assert_eq!(default_audio_path("utt_1", ""), PathBuf::from("utt_1.webm"));
    }
}
