//! Domain Layer - Partial Updates
//!
//! Forms send only the fields they changed. `None` leaves a field alone;
//! for nullable fields `Some(None)` clears it.

use serde::{Deserialize, Serialize};

use super::entity::EntityKind;
use super::error::{DraftError, DraftResult};
use super::payload::{
    AnswerOption, CourseLevel, DraftDetails, Lesson, LessonType, Payload, Question,
    QuestionCollection, QuestionType, VocabItem, VocabSet,
};

fn set<T>(target: &mut T, value: &Option<T>)
where
    T: Clone,
{
    if let Some(v) = value {
        *target = v.clone();
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftDetailsPatch {
    pub title: Option<String>,
    pub subtitle: Option<Option<String>>,
    pub description: Option<String>,
    pub category: Option<Option<String>>,
    pub level: Option<Option<CourseLevel>>,
    pub language: Option<Option<String>>,
}

impl DraftDetailsPatch {
    pub fn apply_to(&self, details: &mut DraftDetails) {
        set(&mut details.title, &self.title);
        set(&mut details.subtitle, &self.subtitle);
        set(&mut details.description, &self.description);
        set(&mut details.category, &self.category);
        set(&mut details.level, &self.level);
        set(&mut details.language, &self.language);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionCollectionPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
}

impl QuestionCollectionPatch {
    pub fn apply_to(&self, collection: &mut QuestionCollection) {
        set(&mut collection.title, &self.title);
        set(&mut collection.description, &self.description);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionPatch {
    pub prompt: Option<String>,
    pub question_type: Option<QuestionType>,
    pub explanation: Option<Option<String>>,
    pub points: Option<u32>,
}

impl QuestionPatch {
    pub fn apply_to(&self, question: &mut Question) {
        set(&mut question.prompt, &self.prompt);
        set(&mut question.question_type, &self.question_type);
        set(&mut question.explanation, &self.explanation);
        set(&mut question.points, &self.points);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerOptionPatch {
    pub text: Option<String>,
    pub is_correct: Option<bool>,
}

impl AnswerOptionPatch {
    pub fn apply_to(&self, option: &mut AnswerOption) {
        set(&mut option.text, &self.text);
        set(&mut option.is_correct, &self.is_correct);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub lesson_type: Option<LessonType>,
    pub duration_minutes: Option<Option<u32>>,
}

impl LessonPatch {
    pub fn apply_to(&self, lesson: &mut Lesson) {
        set(&mut lesson.title, &self.title);
        set(&mut lesson.content, &self.content);
        set(&mut lesson.lesson_type, &self.lesson_type);
        set(&mut lesson.duration_minutes, &self.duration_minutes);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabSetPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
}

impl VocabSetPatch {
    pub fn apply_to(&self, set_: &mut VocabSet) {
        set(&mut set_.title, &self.title);
        set(&mut set_.description, &self.description);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabItemPatch {
    pub term: Option<String>,
    pub definition: Option<String>,
    pub example: Option<Option<String>>,
}

impl VocabItemPatch {
    pub fn apply_to(&self, item: &mut VocabItem) {
        set(&mut item.term, &self.term);
        set(&mut item.definition, &self.definition);
        set(&mut item.example, &self.example);
    }
}

/// Partial update for any node, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Patch {
    QuestionCollection(QuestionCollectionPatch),
    Question(QuestionPatch),
    AnswerOption(AnswerOptionPatch),
    Lesson(LessonPatch),
    VocabSet(VocabSetPatch),
    VocabItem(VocabItemPatch),
}

impl Patch {
    pub fn kind(&self) -> EntityKind {
        match self {
            Patch::QuestionCollection(_) => EntityKind::QuestionCollection,
            Patch::Question(_) => EntityKind::Question,
            Patch::AnswerOption(_) => EntityKind::AnswerOption,
            Patch::Lesson(_) => EntityKind::Lesson,
            Patch::VocabSet(_) => EntityKind::VocabSet,
            Patch::VocabItem(_) => EntityKind::VocabItem,
        }
    }
}

impl Payload {
    /// Merge `patch` into this payload; both must be of the same kind
    pub fn merge(&mut self, patch: &Patch) -> DraftResult<()> {
        match (self, patch) {
            (Payload::QuestionCollection(p), Patch::QuestionCollection(u)) => u.apply_to(p),
            (Payload::Question(p), Patch::Question(u)) => u.apply_to(p),
            (Payload::AnswerOption(p), Patch::AnswerOption(u)) => u.apply_to(p),
            (Payload::Lesson(p), Patch::Lesson(u)) => u.apply_to(p),
            (Payload::VocabSet(p), Patch::VocabSet(u)) => u.apply_to(p),
            (Payload::VocabItem(p), Patch::VocabItem(u)) => u.apply_to(p),
            (payload, patch) => {
                return Err(DraftError::KindMismatch {
                    expected: payload.kind(),
                    found: patch.kind(),
                })
            }
        }
        Ok(())
    }
}

macro_rules! impl_from_patch {
    ($($variant:ident => $patch:ident),*) => {
        $(
            impl From<$patch> for Patch {
                fn from(value: $patch) -> Self {
                    Patch::$variant(value)
                }
            }
        )*
    };
}

impl_from_patch!(
    QuestionCollection => QuestionCollectionPatch,
    Question => QuestionPatch,
    AnswerOption => AnswerOptionPatch,
    Lesson => LessonPatch,
    VocabSet => VocabSetPatch,
    VocabItem => VocabItemPatch
);
