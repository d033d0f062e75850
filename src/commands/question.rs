//! Question Commands
//!
//! Question collections, their questions, and each question's answer options.

use super::expect_kind;
use crate::domain::{
    AnswerOption, AnswerOptionPatch, DraftResult, EntityKind, EntityRef, Parent, Question,
    QuestionCollection, QuestionCollectionPatch, QuestionPatch, SiblingGroup,
};
use crate::editor::DraftEditor;

impl DraftEditor {
    // ========================
    // Collections
    // ========================

    pub fn add_question_collection(&mut self, collection: QuestionCollection) -> DraftResult<EntityRef> {
        self.add(&Parent::Draft, collection)
    }

    pub fn update_question_collection(
        &mut self,
        collection: &EntityRef,
        patch: QuestionCollectionPatch,
    ) -> DraftResult<()> {
        self.update(collection, patch)
    }

    pub fn remove_question_collection(&mut self, collection: &EntityRef) -> DraftResult<()> {
        expect_kind(collection, EntityKind::QuestionCollection)?;
        self.remove(collection)
    }

    pub fn reorder_question_collections(&mut self, from: usize, to: usize) -> DraftResult<()> {
        self.reorder(&SiblingGroup::root(EntityKind::QuestionCollection), from, to)
    }

    // ========================
    // Questions
    // ========================

    pub fn add_question(&mut self, collection: &EntityRef, question: Question) -> DraftResult<EntityRef> {
        self.add(&Parent::Entity(collection.clone()), question)
    }

    pub fn update_question(&mut self, question: &EntityRef, patch: QuestionPatch) -> DraftResult<()> {
        self.update(question, patch)
    }

    pub fn remove_question(&mut self, question: &EntityRef) -> DraftResult<()> {
        expect_kind(question, EntityKind::Question)?;
        self.remove(question)
    }

    pub fn reorder_questions(&mut self, collection: &EntityRef, from: usize, to: usize) -> DraftResult<()> {
        expect_kind(collection, EntityKind::QuestionCollection)?;
        let group = SiblingGroup::new(Parent::Entity(collection.clone()), EntityKind::Question);
        self.reorder(&group, from, to)
    }

    // ========================
    // Answer options
    // ========================

    pub fn add_answer_option(&mut self, question: &EntityRef, option: AnswerOption) -> DraftResult<EntityRef> {
        self.add(&Parent::Entity(question.clone()), option)
    }

    pub fn update_answer_option(&mut self, option: &EntityRef, patch: AnswerOptionPatch) -> DraftResult<()> {
        self.update(option, patch)
    }

    pub fn remove_answer_option(&mut self, option: &EntityRef) -> DraftResult<()> {
        expect_kind(option, EntityKind::AnswerOption)?;
        self.remove(option)
    }

    pub fn reorder_answer_options(&mut self, question: &EntityRef, from: usize, to: usize) -> DraftResult<()> {
        expect_kind(question, EntityKind::Question)?;
        let group = SiblingGroup::new(Parent::Entity(question.clone()), EntityKind::AnswerOption);
        self.reorder(&group, from, to)
    }
}
