//! Draft Session
//!
//! One editing session of one draft: the shared editor, the backend it is
//! saved to, and the configuration both were built with. Callers are
//! expected to run a single `save_all` at a time per session.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::EditorConfig;
use crate::domain::{BackendError, DraftError, RealId};
use crate::editor::DraftEditor;
use crate::repository::DraftBackend;
use crate::sync::{SaveOrchestrator, SaveOutcome};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to load draft: {0}")]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Draft(#[from] DraftError),
}

pub struct DraftSession {
    editor: Arc<Mutex<DraftEditor>>,
    orchestrator: SaveOrchestrator,
    config: EditorConfig,
}

impl DraftSession {
    /// Begin editing a draft that has no content yet
    pub fn start(backend: Arc<dyn DraftBackend>, draft_id: RealId, config: EditorConfig) -> Self {
        log::info!("Starting empty draft {}", draft_id);
        let editor = DraftEditor::new(draft_id, &config);
        Self::with_editor(backend, editor, config)
    }

    /// Load everything stored for a draft and begin editing it
    pub async fn open(
        backend: Arc<dyn DraftBackend>,
        draft_id: RealId,
        config: EditorConfig,
    ) -> Result<Self, SessionError> {
        let snapshot = backend.load_draft(draft_id).await?;
        let editor = DraftEditor::from_snapshot(snapshot, &config)?;
        Ok(Self::with_editor(backend, editor, config))
    }

    fn with_editor(backend: Arc<dyn DraftBackend>, editor: DraftEditor, config: EditorConfig) -> Self {
        Self {
            editor: Arc::new(Mutex::new(editor)),
            orchestrator: SaveOrchestrator::new(backend, &config),
            config,
        }
    }

    /// Shared handle to the editor, for the UI and for background saves
    pub fn editor(&self) -> Arc<Mutex<DraftEditor>> {
        Arc::clone(&self.editor)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub async fn save_all(&self) -> SaveOutcome {
        self.orchestrator.save_all(&self.editor).await
    }

    /// Throw away unsaved work and reload the draft from the backend
    pub async fn revert(&self) -> Result<(), SessionError> {
        let draft_id = self.editor.lock().await.draft_id();
        let snapshot = self.orchestrator.backend().load_draft(draft_id).await?;
        let reloaded = DraftEditor::from_snapshot(snapshot, &self.config)?;
        *self.editor.lock().await = reloaded;
        log::info!("Reverted draft {} to its stored state", draft_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DraftDetails, EntityKind, EntityRef, Lesson, LessonPatch, Step, VocabSet};
    use crate::repository::MemoryBackend;

    async fn backend() -> Arc<MemoryBackend> {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .add_draft(
                RealId(7),
                DraftDetails {
                    title: "French for beginners".to_string(),
                    ..Default::default()
                },
            )
            .await;
        backend
    }

    #[tokio::test]
    async fn test_open_loads_stored_rows() {
        let backend = backend().await;
        backend
            .seed_row(
                RealId(3),
                RealId(7),
                0,
                Lesson {
                    title: "Bonjour".to_string(),
                    ..Default::default()
                }
                .into(),
            )
            .await;

        let session = DraftSession::open(backend.clone(), RealId(7), EditorConfig::default())
            .await
            .unwrap();
        let editor = session.editor();
        let editor = editor.lock().await;
        assert_eq!(editor.details().title, "French for beginners");
        assert!(editor.get(&EntityRef::real(EntityKind::Lesson, 3)).is_some());
        assert!(!editor.is_dirty());
    }

    #[tokio::test]
    async fn test_open_unknown_draft() {
        let backend = backend().await;
        let result = DraftSession::open(backend, RealId(99), EditorConfig::default()).await;
        assert!(matches!(result, Err(SessionError::Backend(BackendError::NotFound(_)))));
    }

    #[tokio::test]
    async fn test_start_then_save() {
        let backend = backend().await;
        let session = DraftSession::start(backend.clone(), RealId(7), EditorConfig::default());
        session
            .editor()
            .lock()
            .await
            .add_vocab_set(VocabSet {
                title: "Numbers".to_string(),
                description: None,
            })
            .unwrap();

        let outcome = session.save_all().await;
        assert!(outcome.is_success());
        assert_eq!(backend.row_count().await, 1);
        assert!(!session.editor().lock().await.is_step_dirty(Step::Vocabulary));
    }

    #[tokio::test]
    async fn test_revert_drops_unsaved_edits() {
        let backend = backend().await;
        backend
            .seed_row(
                RealId(3),
                RealId(7),
                0,
                Lesson {
                    title: "Bonjour".to_string(),
                    ..Default::default()
                }
                .into(),
            )
            .await;
        let session = DraftSession::open(backend, RealId(7), EditorConfig::default())
            .await
            .unwrap();
        let lesson = EntityRef::real(EntityKind::Lesson, 3);
        session
            .editor()
            .lock()
            .await
            .update_lesson(
                &lesson,
                LessonPatch {
                    title: Some("Salut".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        session.revert().await.unwrap();
        let editor = session.editor();
        let editor = editor.lock().await;
        assert!(!editor.is_dirty());
        match editor.get(&lesson).unwrap().payload {
            crate::domain::Payload::Lesson(l) => assert_eq!(l.title, "Bonjour"),
            other => panic!("unexpected payload {:?}", other),
        }
    }
}
