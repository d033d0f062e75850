//! Vocabulary Commands
//!
//! Vocabulary sets and the items inside them.

use super::expect_kind;
use crate::domain::{
    DraftResult, EntityKind, EntityRef, Parent, SiblingGroup, VocabItem, VocabItemPatch, VocabSet,
    VocabSetPatch,
};
use crate::editor::DraftEditor;

impl DraftEditor {
    pub fn add_vocab_set(&mut self, set: VocabSet) -> DraftResult<EntityRef> {
        self.add(&Parent::Draft, set)
    }

    pub fn update_vocab_set(&mut self, set: &EntityRef, patch: VocabSetPatch) -> DraftResult<()> {
        self.update(set, patch)
    }

    pub fn remove_vocab_set(&mut self, set: &EntityRef) -> DraftResult<()> {
        expect_kind(set, EntityKind::VocabSet)?;
        self.remove(set)
    }

    pub fn reorder_vocab_sets(&mut self, from: usize, to: usize) -> DraftResult<()> {
        self.reorder(&SiblingGroup::root(EntityKind::VocabSet), from, to)
    }

    pub fn add_vocab_item(&mut self, set: &EntityRef, item: VocabItem) -> DraftResult<EntityRef> {
        self.add(&Parent::Entity(set.clone()), item)
    }

    pub fn update_vocab_item(&mut self, item: &EntityRef, patch: VocabItemPatch) -> DraftResult<()> {
        self.update(item, patch)
    }

    pub fn remove_vocab_item(&mut self, item: &EntityRef) -> DraftResult<()> {
        expect_kind(item, EntityKind::VocabItem)?;
        self.remove(item)
    }

    pub fn reorder_vocab_items(&mut self, set: &EntityRef, from: usize, to: usize) -> DraftResult<()> {
        expect_kind(set, EntityKind::VocabSet)?;
        let group = SiblingGroup::new(Parent::Entity(set.clone()), EntityKind::VocabItem);
        self.reorder(&group, from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::domain::{Lifecycle, RealId, Step};

    #[test]
    fn test_vocab_set_with_items() {
        let mut editor = DraftEditor::new(RealId(1), &EditorConfig::default());
        let set = editor
            .add_vocab_set(VocabSet {
                title: "Animals".to_string(),
                description: None,
            })
            .unwrap();
        let dog = editor
            .add_vocab_item(
                &set,
                VocabItem {
                    term: "der Hund".to_string(),
                    definition: "the dog".to_string(),
                    example: None,
                },
            )
            .unwrap();

        assert_eq!(editor.lifecycle(&dog), Some(Lifecycle::New));
        assert!(editor.is_step_dirty(Step::Vocabulary));
        assert!(!editor.is_step_dirty(Step::Questions));

        editor
            .update_vocab_item(
                &dog,
                VocabItemPatch {
                    example: Some(Some("Der Hund bellt.".to_string())),
                    ..Default::default()
                },
            )
            .unwrap();
        editor.remove_vocab_set(&set).unwrap();
        assert!(!editor.is_dirty());
    }
}
