//! Lesson Commands
//!
//! Lessons are a flat, ordered list directly under the draft.

use super::expect_kind;
use crate::domain::{DraftResult, EntityKind, EntityRef, Lesson, LessonPatch, Parent, SiblingGroup};
use crate::editor::DraftEditor;

impl DraftEditor {
    pub fn add_lesson(&mut self, lesson: Lesson) -> DraftResult<EntityRef> {
        self.add(&Parent::Draft, lesson)
    }

    pub fn update_lesson(&mut self, lesson: &EntityRef, patch: LessonPatch) -> DraftResult<()> {
        self.update(lesson, patch)
    }

    pub fn remove_lesson(&mut self, lesson: &EntityRef) -> DraftResult<()> {
        expect_kind(lesson, EntityKind::Lesson)?;
        self.remove(lesson)
    }

    pub fn reorder_lessons(&mut self, from: usize, to: usize) -> DraftResult<()> {
        self.reorder(&SiblingGroup::root(EntityKind::Lesson), from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::domain::{RealId, Step};

    #[test]
    fn test_lessons_are_flat() {
        let mut editor = DraftEditor::new(RealId(1), &EditorConfig::default());
        let first = editor.add_lesson(Lesson::default()).unwrap();
        let second = editor.add_lesson(Lesson::default()).unwrap();
        editor.reorder_lessons(1, 0).unwrap();

        assert_eq!(editor.get(&second).unwrap().order, 0);
        assert_eq!(editor.get(&first).unwrap().order, 1);

        editor.remove_lesson(&second).unwrap();
        assert_eq!(editor.get(&first).unwrap().order, 0);
        assert!(editor.is_step_dirty(Step::Lessons));
    }
}
