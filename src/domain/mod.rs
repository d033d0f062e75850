//! Domain Layer
//!
//! Entity kinds, identities, payloads and errors.
//! This layer has NO async or storage dependencies.

mod entity;
mod error;
mod patch;
mod payload;

pub use entity::{EntityKind, EntityRef, Identity, Lifecycle, Parent, RealId, SiblingGroup, Step, TempId};
pub use error::{BackendError, BackendResult, DraftError, DraftResult, ValidationError};
pub use patch::{
    AnswerOptionPatch, DraftDetailsPatch, LessonPatch, Patch, QuestionCollectionPatch,
    QuestionPatch, VocabItemPatch, VocabSetPatch,
};
pub use payload::{
    AnswerOption, CourseLevel, DraftDetails, Lesson, LessonType, Payload, Question,
    QuestionCollection, QuestionType, VocabItem, VocabSet,
};
