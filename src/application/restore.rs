//! Session restore use case
//!
//! Reloads a session's previously saved utterances from the server: list
//! the distinct basenames, then fetch each edited transcript. Restored
//! segments are seeded into the session log so saving over them later is
//! an overwrite.

use crate::application::ports::{ArtifactStore, StoreError};
use crate::domain::session::SessionId;

/// One utterance reloaded from the server
#[derive(Debug, Clone)]
pub struct RestoredUtterance {
    pub basename: String,
    pub text: String,
}

/// Fetch all previously saved utterances of a session, in basename order
pub async fn restore_session<S: ArtifactStore>(
    store: &S,
    session: &SessionId,
) -> Result<Vec<RestoredUtterance>, StoreError> {
    let basenames = store.list_basenames(session).await?;
    let mut restored = Vec::with_capacity(basenames.len());
    for basename in basenames {
        let stored = store.fetch_edited_text(session, &basename).await?;
        restored.push(RestoredUtterance {
            basename,
            text: stored.text,
        });
    }
    Ok(restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        AudioSave, StoredAudio, StoredText, TextSave,
    };
    use async_trait::async_trait;

    struct FixtureStore;

    #[async_trait]
    impl ArtifactStore for FixtureStore {
        async fn save_audio(&self, _save: AudioSave) -> Result<String, StoreError> {
            unimplemented!("not used by restore")
        }

        async fn save_recognized_text(&self, _save: TextSave) -> Result<String, StoreError> {
            unimplemented!("not used by restore")
        }

        async fn save_edited_text(&self, _save: TextSave) -> Result<String, StoreError> {
            unimplemented!("not used by restore")
        }

        async fn fetch_edited_text(
            &self,
            _session: &SessionId,
            basename: &str,
        ) -> Result<StoredText, StoreError> {
            Ok(StoredText {
                text: format!("text of {}", basename),
                message: String::new(),
            })
        }

        async fn fetch_recognized_text(
            &self,
            _session: &SessionId,
            _basename: &str,
        ) -> Result<StoredText, StoreError> {
            unimplemented!("not used by restore")
        }

        async fn fetch_audio(
            &self,
            _session: &SessionId,
            _file_name: &str,
        ) -> Result<StoredAudio, StoreError> {
            unimplemented!("not used by restore")
        }

        async fn list_basenames(&self, _session: &SessionId) -> Result<Vec<String>, StoreError> {
            Ok(vec!["utt_a".to_string(), "utt_b".to_string()])
        }

        async fn list_files(&self, _session: &SessionId) -> Result<Vec<String>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn restores_in_basename_order() {
        let session: SessionId = "sess1".parse().unwrap();
        let restored = restore_session(&FixtureStore, &session).await.unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored[0].basename, "utt_a");
        assert_eq!(restored[0].text, "text of utt_a");
        assert_eq!(restored[1].basename, "utt_b");
    }
}
