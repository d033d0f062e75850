//! Tree Utilities
//!
//! Helper functions for rendering one step of the draft as an indented list.

use std::collections::BTreeSet;

use crate::domain::{EntityRef, SiblingGroup, Step};
use crate::editor::DraftEditor;
use crate::store::{EntityTree, EntityView};

/// Render a step as an indented tree using recursive DFS.
/// Returns (view, depth) pairs in display order, top-level entities at 0.
pub fn flatten_step(editor: &DraftEditor, step: Step) -> Vec<(EntityView<'_>, usize)> {
    flatten_visible(editor, step, &BTreeSet::new())
}

/// Like `flatten_step`, but the children of collapsed nodes are left out
pub fn flatten_visible<'a>(
    editor: &'a DraftEditor,
    step: Step,
    collapsed: &BTreeSet<EntityRef>,
) -> Vec<(EntityView<'a>, usize)> {
    // handles taken before a save still match after reconciliation
    let collapsed: BTreeSet<EntityRef> = collapsed
        .iter()
        .filter_map(|reference| editor.tree.canonical(reference))
        .collect();

    fn collect<'a>(
        tree: &'a EntityTree,
        group: &SiblingGroup,
        depth: usize,
        collapsed: &BTreeSet<EntityRef>,
        result: &mut Vec<(EntityView<'a>, usize)>,
    ) {
        let Ok(children) = tree.children(group) else {
            return;
        };
        for view in children {
            let reference = view.reference.clone();
            result.push((view, depth));
            if collapsed.contains(&reference) {
                continue;
            }
            if let Some(group) = SiblingGroup::children_of(&reference) {
                collect(tree, &group, depth + 1, collapsed, result);
            }
        }
    }

    let mut result = Vec::new();
    for kind in step.root_kinds() {
        collect(&editor.tree, &SiblingGroup::root(*kind), 0, &collapsed, &mut result);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::domain::{AnswerOption, EntityKind, Lesson, Question, QuestionCollection, RealId};

    fn editor() -> DraftEditor {
        DraftEditor::new(RealId(1), &EditorConfig::default())
    }

    #[test]
    fn test_flatten_step() {
        let mut editor = editor();
        let c1 = editor.add_question_collection(QuestionCollection::default()).unwrap();
        let c2 = editor.add_question_collection(QuestionCollection::default()).unwrap();
        let q1 = editor.add_question(&c1, Question::default()).unwrap();
        let o1 = editor.add_answer_option(&q1, AnswerOption::default()).unwrap();
        let q2 = editor.add_question(&c1, Question::default()).unwrap();
        editor.add_lesson(Lesson::default()).unwrap();

        let rows = flatten_step(&editor, Step::Questions);

        // Should be: c1 (0), q1 (1), o1 (2), q2 (1), c2 (0)
        let got: Vec<(EntityRef, usize)> = rows.into_iter().map(|(v, d)| (v.reference, d)).collect();
        assert_eq!(got, vec![(c1, 0), (q1, 1), (o1, 2), (q2, 1), (c2, 0)]);
    }

    #[test]
    fn test_collapsed_and_removed_nodes_are_hidden() {
        let mut editor = editor();
        let c1 = editor.add_question_collection(QuestionCollection::default()).unwrap();
        let q1 = editor.add_question(&c1, Question::default()).unwrap();
        editor.add_question(&c1, Question::default()).unwrap();
        let c2 = editor.add_question_collection(QuestionCollection::default()).unwrap();
        editor.add_question(&c2, Question::default()).unwrap();

        editor.remove_question(&q1).unwrap();
        assert_eq!(flatten_step(&editor, Step::Questions).len(), 4);

        let collapsed = BTreeSet::from([c2.clone()]);
        let rows = flatten_visible(&editor, Step::Questions, &collapsed);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].0.reference, c2);
        assert!(rows.iter().all(|(v, _)| v.reference.kind != EntityKind::AnswerOption));
    }

    #[test]
    fn test_details_step_has_no_rows() {
        let mut editor = editor();
        editor.add_lesson(Lesson::default()).unwrap();
        assert!(flatten_step(&editor, Step::Details).is_empty());
        assert_eq!(flatten_step(&editor, Step::Lessons).len(), 1);
    }
}
