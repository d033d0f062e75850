//! Completion Progress
//!
//! Counts populated required fields per step, for the step navigator.

use serde::Serialize;

use crate::domain::{Payload, SiblingGroup, Step};
use crate::editor::DraftEditor;
use crate::store::EntityView;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepProgress {
    pub filled: u32,
    pub required: u32,
}

impl StepProgress {
    /// 0..=100; a step with nothing required counts as done
    pub fn percent(&self) -> u8 {
        if self.required == 0 {
            return 100;
        }
        (self.filled.min(self.required) * 100 / self.required) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.filled >= self.required
    }

    fn count(&mut self, filled: bool) {
        self.required += 1;
        if filled {
            self.filled += 1;
        }
    }

    fn merge(&mut self, other: StepProgress) {
        self.filled += other.filled;
        self.required += other.required;
    }
}

fn has_text(value: &str) -> bool {
    !value.trim().is_empty()
}

fn has_some(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(has_text)
}

pub fn step_progress(editor: &DraftEditor, step: Step) -> StepProgress {
    let mut progress = StepProgress::default();

    if step == Step::Details {
        let details = editor.details();
        progress.count(has_text(&details.title));
        progress.count(has_text(&details.description));
        progress.count(has_some(&details.category));
        progress.count(details.level.is_some());
        return progress;
    }

    let has_content = step
        .root_kinds()
        .iter()
        .any(|kind| !editor.tree.nodes_of_kind(*kind).is_empty());
    progress.count(has_content);

    for kind in step.kinds() {
        for view in editor.tree.nodes_of_kind(kind) {
            count_entity(editor, &view, &mut progress);
        }
    }
    progress
}

fn count_entity(editor: &DraftEditor, view: &EntityView<'_>, progress: &mut StepProgress) {
    match view.payload {
        Payload::QuestionCollection(c) => progress.count(has_text(&c.title)),
        Payload::Question(q) => {
            progress.count(has_text(&q.prompt));
            if q.question_type.uses_options() {
                let options = SiblingGroup::children_of(&view.reference)
                    .and_then(|group| editor.tree.children(&group).ok())
                    .unwrap_or_default();
                progress.count(options.len() >= 2);
                progress.count(
                    options
                        .iter()
                        .any(|option| matches!(option.payload, Payload::AnswerOption(o) if o.is_correct)),
                );
            }
        }
        Payload::AnswerOption(o) => progress.count(has_text(&o.text)),
        Payload::Lesson(l) => progress.count(has_text(&l.title)),
        Payload::VocabSet(s) => progress.count(has_text(&s.title)),
        Payload::VocabItem(v) => {
            progress.count(has_text(&v.term));
            progress.count(has_text(&v.definition));
        }
    }
}

/// Progress of every step, weighted by how much each one requires
pub fn overall_progress(editor: &DraftEditor) -> StepProgress {
    let mut total = StepProgress::default();
    for step in Step::ALL {
        total.merge(step_progress(editor, step));
    }
    total
}
