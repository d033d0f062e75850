//! Repository Integration Tests
//!
//! Tests for SqliteDraftRepository with in-memory SQLite database.

#[cfg(test)]
mod tests {
    use crate::{init_db, SqliteDraftRepository};
    use course_draft::{
        flatten_step, AnswerOption, BackendError, CourseLevel, DraftBackend, DraftDetails,
        DraftSession, EditorConfig, EntityKind, EntityRef, Lesson, OrderEntry, Payload, Question,
        QuestionCollection, RealId, Record, SaveStatus, Step,
    };
    use std::path::PathBuf;
    use std::sync::Arc;

    async fn setup_test_db() -> SqliteDraftRepository {
        // Use in-memory database for tests
        let db_path = PathBuf::from(":memory:");
        let db_state = init_db(&db_path).await.expect("Failed to init test DB");
        SqliteDraftRepository::new(db_state.connection())
    }

    fn record(order: u32, payload: impl Into<Payload>) -> Record {
        Record {
            order,
            payload: payload.into(),
        }
    }

    fn collection(title: &str) -> QuestionCollection {
        QuestionCollection {
            title: title.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_load() {
        let repo = setup_test_db().await;
        let draft = repo.create_draft(&DraftDetails::default()).await.unwrap();

        let c = repo
            .create(EntityKind::QuestionCollection, draft, &record(0, collection("Verbs")))
            .await
            .unwrap();
        let q = repo
            .create(EntityKind::Question, c, &record(0, Question::default()))
            .await
            .unwrap();
        repo.create(EntityKind::AnswerOption, q, &record(0, AnswerOption::default()))
            .await
            .unwrap();
        repo.create(EntityKind::Lesson, draft, &record(0, Lesson::default()))
            .await
            .unwrap();

        let snapshot = repo.load_draft(draft).await.unwrap();
        assert_eq!(snapshot.rows.len(), 4);
        let question = snapshot
            .rows
            .iter()
            .find(|row| row.kind() == EntityKind::Question)
            .unwrap();
        assert_eq!(question.id, q);
        assert_eq!(question.parent_id, c);
    }

    #[tokio::test]
    async fn test_load_excludes_other_drafts() {
        let repo = setup_test_db().await;
        let first = repo.create_draft(&DraftDetails::default()).await.unwrap();
        let second = repo.create_draft(&DraftDetails::default()).await.unwrap();

        let c = repo
            .create(EntityKind::QuestionCollection, first, &record(0, collection("Mine")))
            .await
            .unwrap();
        repo.create(EntityKind::Question, c, &record(0, Question::default()))
            .await
            .unwrap();
        repo.create(EntityKind::QuestionCollection, second, &record(0, collection("Theirs")))
            .await
            .unwrap();

        let snapshot = repo.load_draft(first).await.unwrap();
        assert_eq!(snapshot.rows.len(), 2);
        assert_eq!(repo.list_drafts().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_under_missing_parent() {
        let repo = setup_test_db().await;
        let err = repo
            .create(EntityKind::Question, RealId(404), &record(0, Question::default()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = repo
            .create(EntityKind::Lesson, RealId(1), &record(0, collection("Wrong kind")))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let repo = setup_test_db().await;
        let draft = repo.create_draft(&DraftDetails::default()).await.unwrap();
        let c = repo
            .create(EntityKind::QuestionCollection, draft, &record(0, collection("Nouns")))
            .await
            .unwrap();
        let q = repo
            .create(EntityKind::Question, c, &record(0, Question::default()))
            .await
            .unwrap();
        repo.create(EntityKind::AnswerOption, q, &record(0, AnswerOption::default()))
            .await
            .unwrap();

        repo.delete(EntityKind::QuestionCollection, c).await.unwrap();
        assert!(repo.load_draft(draft).await.unwrap().rows.is_empty());

        // already gone with its parent
        let err = repo.delete(EntityKind::Question, q).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_reorder_is_atomic() {
        let repo = setup_test_db().await;
        let draft = repo.create_draft(&DraftDetails::default()).await.unwrap();
        let mut ids = Vec::new();
        for n in 0..3 {
            let id = repo
                .create(EntityKind::Lesson, draft, &record(n, Lesson::default()))
                .await
                .unwrap();
            ids.push(id);
        }

        let entries = vec![
            OrderEntry { id: ids[2], order: 0 },
            OrderEntry { id: ids[0], order: 1 },
            OrderEntry { id: ids[1], order: 2 },
        ];
        repo.reorder(EntityKind::Lesson, draft, &entries).await.unwrap();
        assert_eq!(
            repo.children(EntityKind::Lesson, draft).await.unwrap(),
            vec![ids[2], ids[0], ids[1]]
        );

        // one foreign entry rejects the whole batch
        let bad = vec![
            OrderEntry { id: ids[0], order: 0 },
            OrderEntry { id: RealId(999), order: 1 },
        ];
        let err = repo.reorder(EntityKind::Lesson, draft, &bad).await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidInput(_)));
        assert_eq!(
            repo.children(EntityKind::Lesson, draft).await.unwrap(),
            vec![ids[2], ids[0], ids[1]]
        );
    }

    #[tokio::test]
    async fn test_update_details() {
        let repo = setup_test_db().await;
        let draft = repo.create_draft(&DraftDetails::default()).await.unwrap();
        let details = DraftDetails {
            title: "Portuguese".to_string(),
            description: "From zero to ordering coffee".to_string(),
            level: Some(CourseLevel::Beginner),
            language: Some("pt".to_string()),
            ..Default::default()
        };

        repo.update_details(draft, &details).await.unwrap();
        assert_eq!(repo.load_draft(draft).await.unwrap().details, details);

        let err = repo.update_details(RealId(404), &details).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_missing_row() {
        let repo = setup_test_db().await;
        let err = repo
            .update(EntityKind::Lesson, RealId(8), &record(0, Lesson::default()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let repo = Arc::new(setup_test_db().await);
        let draft = repo.create_draft(&DraftDetails::default()).await.unwrap();

        let session = DraftSession::start(repo.clone(), draft, EditorConfig::default());
        {
            let editor = session.editor();
            let mut editor = editor.lock().await;
            let c = editor.add_question_collection(collection("Animals")).unwrap();
            let q = editor
                .add_question(
                    &c,
                    Question {
                        prompt: "Which one barks?".to_string(),
                        ..Default::default()
                    },
                )
                .unwrap();
            for (text, is_correct) in [("Cat", false), ("Dog", true)] {
                editor
                    .add_answer_option(
                        &q,
                        AnswerOption {
                            text: text.to_string(),
                            is_correct,
                        },
                    )
                    .unwrap();
            }
            editor.reorder_answer_options(&q, 1, 0).unwrap();
        }
        let outcome = session.save_all().await;
        assert_eq!(outcome.status(), SaveStatus::Saved);

        let reopened = DraftSession::open(repo.clone(), draft, EditorConfig::default())
            .await
            .unwrap();
        let editor = reopened.editor();
        let editor = editor.lock().await;
        let rows = flatten_step(&editor, Step::Questions);
        let depths: Vec<usize> = rows.iter().map(|(_, depth)| *depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 2]);
        match rows[2].0.payload {
            Payload::AnswerOption(option) => assert_eq!(option.text, "Dog"),
            other => panic!("unexpected payload {:?}", other),
        }
        assert!(rows.iter().all(|(view, _)| view.reference.real_id().is_some()));
        assert!(editor.get(&EntityRef::real(EntityKind::QuestionCollection, 1)).is_some());
    }
}
