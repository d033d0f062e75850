//! Draft Demo
//!
//! Drives a scripted authoring session against an on-disk database:
//! builds a small draft, saves it, edits and reorders, saves again, then
//! reopens the draft and prints it.
//!
//! Usage: draft-demo [data-dir]

use course_draft::{
    flatten_step, overall_progress, step_progress, AnswerOption, CourseLevel, DraftDetailsPatch,
    DraftSession, EditorConfig, Lesson, Payload, Question, QuestionCollection, QuestionType,
    SaveOutcome, Step, VocabItem, VocabSet,
};
use draft_sqlite::{init_db, SqliteDraftRepository};
use std::path::PathBuf;
use std::sync::Arc;

fn label(payload: &Payload) -> String {
    match payload {
        Payload::QuestionCollection(c) => c.title.clone(),
        Payload::Question(q) => q.prompt.clone(),
        Payload::AnswerOption(o) => format!("{}{}", o.text, if o.is_correct { " (correct)" } else { "" }),
        Payload::Lesson(l) => l.title.clone(),
        Payload::VocabSet(s) => s.title.clone(),
        Payload::VocabItem(v) => format!("{} = {}", v.term, v.definition),
    }
}

fn report(round: &str, outcome: &SaveOutcome) {
    log::info!("{}: {}", round, outcome.summary());
    println!("{}: {}", round, outcome.summary());
    for failure in &outcome.failures {
        println!("  failed {} of {}: {}", failure.operation, failure.target, failure.error);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("course-draft-demo"));
    std::fs::create_dir_all(&data_dir)?;

    rolling_logger::init_logger(data_dir.join("logs"), "CourseDraft")?;
    let config = EditorConfig::load(&data_dir.join("editor.json"))?;

    let db_state = init_db(&data_dir.join("drafts.db")).await?;
    let repo = Arc::new(SqliteDraftRepository::new(db_state.connection()));
    let draft_id = repo.create_draft(&Default::default()).await?;
    let _ = rolling_logger::info(&format!("Demo draft {} created", draft_id));

    let session = DraftSession::start(repo.clone(), draft_id, config.clone());
    let (greetings, hello, numbers) = {
        let editor = session.editor();
        let mut editor = editor.lock().await;
        editor.update_details(DraftDetailsPatch {
            title: Some("Spanish for travellers".to_string()),
            description: Some("Phrases for the first week abroad".to_string()),
            category: Some(Some("Languages".to_string())),
            level: Some(Some(CourseLevel::Beginner)),
            ..Default::default()
        });

        editor.add_lesson(Lesson {
            title: "Saying hello".to_string(),
            content: "Hola, buenos días, buenas noches.".to_string(),
            ..Default::default()
        })?;

        let greetings = editor.add_question_collection(QuestionCollection {
            title: "Greetings".to_string(),
            description: None,
        })?;
        let hello = editor.add_question(
            &greetings,
            Question {
                prompt: "How do you say hello?".to_string(),
                question_type: QuestionType::SingleChoice,
                ..Default::default()
            },
        )?;
        for (text, is_correct) in [("Adiós", false), ("Hola", true), ("Gracias", false)] {
            editor.add_answer_option(
                &hello,
                AnswerOption {
                    text: text.to_string(),
                    is_correct,
                },
            )?;
        }

        let numbers = editor.add_vocab_set(VocabSet {
            title: "Numbers".to_string(),
            description: None,
        })?;
        for (term, definition) in [("uno", "one"), ("dos", "two"), ("tres", "three")] {
            editor.add_vocab_item(
                &numbers,
                VocabItem {
                    term: term.to_string(),
                    definition: definition.to_string(),
                    example: None,
                },
            )?;
        }
        (greetings, hello, numbers)
    };
    report("First save", &session.save_all().await);

    {
        // handles taken before the save still address the same nodes
        let editor = session.editor();
        let mut editor = editor.lock().await;
        editor.reorder_answer_options(&hello, 1, 0)?;
        editor.add_question(
            &greetings,
            Question {
                prompt: "What does 'gracias' mean?".to_string(),
                question_type: QuestionType::ShortAnswer,
                ..Default::default()
            },
        )?;
        editor.remove_vocab_set(&numbers)?;
    }
    report("Second save", &session.save_all().await);

    let reopened = DraftSession::open(repo, draft_id, config).await?;
    let editor = reopened.editor();
    let editor = editor.lock().await;
    println!("\n{}", editor.details().title);
    for step in [Step::Lessons, Step::Questions, Step::Vocabulary] {
        let progress = step_progress(&editor, step);
        println!("\n[{:?}] {}%", step, progress.percent());
        for (view, depth) in flatten_step(&editor, step) {
            println!("{}- {}", "  ".repeat(depth), label(view.payload));
        }
    }
    println!("\nOverall: {}%", overall_progress(&editor).percent());
    Ok(())
}
