//! Domain Layer - Payloads
//!
//! Entity-specific fields. The synchronization engine treats them as
//! opaque apart from validation and progress counting.

use serde::{Deserialize, Serialize};

use super::entity::EntityKind;
use super::error::ValidationError;

/// How a question is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    #[default]
    SingleChoice,
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

impl QuestionType {
    /// Whether answers are picked from options
    pub fn uses_options(&self) -> bool {
        !matches!(self, QuestionType::ShortAnswer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LessonType {
    #[default]
    Text,
    Video,
    Audio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

/// Metadata of the draft itself (Details step)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DraftDetails {
    pub title: String,
    pub subtitle: Option<String>,
    pub description: String,
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuestionCollection {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub question_type: QuestionType,
    pub explanation: Option<String>,
    pub points: u32,
}

impl Default for Question {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            question_type: QuestionType::default(),
            explanation: None,
            points: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnswerOption {
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Lesson {
    pub title: String,
    /// Rich text, stored as produced by the editor
    pub content: String,
    pub lesson_type: LessonType,
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VocabSet {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VocabItem {
    pub term: String,
    pub definition: String,
    pub example: Option<String>,
}

/// Fields of any node, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Payload {
    QuestionCollection(QuestionCollection),
    Question(Question),
    AnswerOption(AnswerOption),
    Lesson(Lesson),
    VocabSet(VocabSet),
    VocabItem(VocabItem),
}

impl Payload {
    pub fn kind(&self) -> EntityKind {
        match self {
            Payload::QuestionCollection(_) => EntityKind::QuestionCollection,
            Payload::Question(_) => EntityKind::Question,
            Payload::AnswerOption(_) => EntityKind::AnswerOption,
            Payload::Lesson(_) => EntityKind::Lesson,
            Payload::VocabSet(_) => EntityKind::VocabSet,
            Payload::VocabItem(_) => EntityKind::VocabItem,
        }
    }

    /// Check field rules before the payload is sent to the store
    pub fn validate(&self) -> Result<(), ValidationError> {
        let kind = self.kind();
        match self {
            Payload::QuestionCollection(c) => require_text(kind, "title", &c.title),
            Payload::Question(q) => {
                require_text(kind, "prompt", &q.prompt)?;
                if q.points == 0 {
                    return Err(ValidationError::new(kind, "points", "must be at least 1"));
                }
                Ok(())
            }
            Payload::AnswerOption(o) => require_text(kind, "text", &o.text),
            Payload::Lesson(l) => require_text(kind, "title", &l.title),
            Payload::VocabSet(s) => require_text(kind, "title", &s.title),
            Payload::VocabItem(v) => {
                require_text(kind, "term", &v.term)?;
                require_text(kind, "definition", &v.definition)
            }
        }
    }
}

fn require_text(kind: EntityKind, field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new(kind, field, "must not be blank"))
    } else {
        Ok(())
    }
}

macro_rules! impl_from_payload {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Payload {
                fn from(value: $variant) -> Self {
                    Payload::$variant(value)
                }
            }
        )*
    };
}

impl_from_payload!(QuestionCollection, Question, AnswerOption, Lesson, VocabSet, VocabItem);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_kind() {
        let payload: Payload = AnswerOption {
            text: "Paris".to_string(),
            is_correct: true,
        }
        .into();
        assert_eq!(payload.kind(), EntityKind::AnswerOption);
    }

    #[test]
    fn test_blank_title_rejected() {
        let payload: Payload = QuestionCollection {
            title: "   ".to_string(),
            description: None,
        }
        .into();
        let err = payload.validate().unwrap_err();
        assert_eq!(err.kind, EntityKind::QuestionCollection);
        assert_eq!(err.field, "title");
    }

    #[test]
    fn test_question_needs_points() {
        let payload: Payload = Question {
            prompt: "Capital of France?".to_string(),
            points: 0,
            ..Default::default()
        }
        .into();
        assert_eq!(payload.validate().unwrap_err().field, "points");
    }

    #[test]
    fn test_vocab_item_rules() {
        let ok: Payload = VocabItem {
            term: "der Hund".to_string(),
            definition: "the dog".to_string(),
            example: None,
        }
        .into();
        assert!(ok.validate().is_ok());

        let missing: Payload = VocabItem {
            term: "die Katze".to_string(),
            ..Default::default()
        }
        .into();
        assert_eq!(missing.validate().unwrap_err().field, "definition");
    }

    #[test]
    fn test_payload_serialization_is_tagged() {
        let payload: Payload = Lesson {
            title: "Greetings".to_string(),
            ..Default::default()
        }
        .into();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "lesson");
        assert_eq!(json["data"]["title"], "Greetings");
        assert_eq!(json["data"]["lesson_type"], "text");
    }
}
