//! Details Commands
//!
//! Metadata of the draft itself. The draft always exists remotely, so
//! edits only raise the details flag for the next save.

use crate::domain::DraftDetailsPatch;
use crate::editor::DraftEditor;

impl DraftEditor {
    pub fn update_details(&mut self, patch: DraftDetailsPatch) {
        patch.apply_to(&mut self.details);
        self.details_revision += 1;
        self.ledger.mark_details_dirty();
        log::debug!("Updated details of draft {}", self.draft_id);
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EditorConfig;
    use crate::domain::{DraftDetailsPatch, RealId, Step};
    use crate::editor::DraftEditor;

    #[test]
    fn test_details_mark_step() {
        let mut editor = DraftEditor::new(RealId(1), &EditorConfig::default());
        editor.update_details(DraftDetailsPatch {
            title: Some("Spanish for travellers".to_string()),
            ..Default::default()
        });
        assert_eq!(editor.details().title, "Spanish for travellers");
        assert!(editor.is_step_dirty(Step::Details));
        assert!(!editor.is_step_dirty(Step::Lessons));
    }
}
