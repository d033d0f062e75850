//! Draft Editor
//!
//! Owns the entity tree, the ledger and the draft's own metadata for one
//! editing session. The mutation API (`commands`) and the save
//! orchestrator (`sync`) are both implemented against this type.

use std::collections::BTreeMap;

use crate::config::EditorConfig;
use crate::domain::{
    DraftDetails, DraftError, DraftResult, EntityKind, EntityRef, Identity, Lifecycle, Parent,
    RealId, SiblingGroup, Step, TempId,
};
use crate::identity::IdentityAllocator;
use crate::ledger::Ledger;
use crate::repository::DraftSnapshot;
use crate::store::{EntityTree, EntityView};

#[derive(Debug, Clone)]
pub struct DraftEditor {
    pub(crate) draft_id: RealId,
    pub(crate) details: DraftDetails,
    pub(crate) details_revision: u64,
    pub(crate) tree: EntityTree,
    pub(crate) ledger: Ledger,
}

impl DraftEditor {
    /// Start editing an empty draft
    pub fn new(draft_id: RealId, config: &EditorConfig) -> Self {
        Self::with_details(draft_id, DraftDetails::default(), config)
    }

    fn with_details(draft_id: RealId, details: DraftDetails, config: &EditorConfig) -> Self {
        let seed = format!("draft-{}", draft_id);
        Self {
            draft_id,
            details,
            details_revision: 0,
            tree: EntityTree::new(IdentityAllocator::with_prefix(&config.temp_id_prefix, &seed)),
            ledger: Ledger::new(),
        }
    }

    /// Rebuild the tree from persisted rows. Every node starts `Persisted`
    /// and sibling order is re-derived from the stored order column.
    pub fn from_snapshot(snapshot: DraftSnapshot, config: &EditorConfig) -> DraftResult<Self> {
        let mut editor = Self::with_details(snapshot.draft_id, snapshot.details, config);

        let mut by_depth: BTreeMap<u8, Vec<_>> = BTreeMap::new();
        for row in snapshot.rows {
            by_depth.entry(row.kind().depth()).or_default().push(row);
        }

        for (_, mut rows) in by_depth {
            rows.sort_by_key(|row| (row.kind(), row.parent_id, row.order, row.id));
            for row in rows {
                let kind = row.kind();
                let parent = match kind.parent_kind() {
                    None if row.parent_id == snapshot.draft_id => Parent::Draft,
                    None => {
                        return Err(DraftError::InvalidSnapshot(format!(
                            "{} {} belongs to draft {}",
                            kind, row.id, row.parent_id
                        )))
                    }
                    Some(parent_kind) => Parent::Entity(EntityRef::real(parent_kind, row.parent_id.0)),
                };
                editor
                    .tree
                    .insert(&parent, row.payload, Some(row.id))
                    .map_err(|err| match err {
                        DraftError::ParentNotFound(_) => DraftError::InvalidSnapshot(format!(
                            "orphaned {} {} (parent {})",
                            kind, row.id, row.parent_id
                        )),
                        other => other,
                    })?;
            }
        }

        log::info!(
            "Loaded draft {} with {} entities",
            editor.draft_id,
            editor.tree.len()
        );
        Ok(editor)
    }

    // ========================
    // Read accessors
    // ========================

    pub fn draft_id(&self) -> RealId {
        self.draft_id
    }

    pub fn details(&self) -> &DraftDetails {
        &self.details
    }

    pub fn tree(&self) -> &EntityTree {
        &self.tree
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn get(&self, reference: &EntityRef) -> Option<EntityView<'_>> {
        self.tree.get(reference)
    }

    pub fn children(&self, group: &SiblingGroup) -> DraftResult<Vec<EntityView<'_>>> {
        self.tree.children(group)
    }

    /// Lifecycle of a node, including ones removed but not yet deleted remotely
    pub fn lifecycle(&self, reference: &EntityRef) -> Option<Lifecycle> {
        if let Some(view) = self.tree.get(reference) {
            return Some(view.lifecycle);
        }
        let id = match &reference.identity {
            Identity::Real(id) => *id,
            Identity::Temp(temp) => self.tree.alias(temp)?,
        };
        self.ledger
            .is_deleted(reference.kind, id)
            .then_some(Lifecycle::DeletedPending)
    }

    pub fn is_step_dirty(&self, step: Step) -> bool {
        self.ledger.is_step_dirty(step)
    }

    /// Any unsaved work at all
    pub fn is_dirty(&self) -> bool {
        !self.ledger.is_empty()
    }

    // ========================
    // Reconciliation
    // ========================

    /// Swap `temp` for `real` everywhere it is referenced: the node itself,
    /// the optimistic ledger, order bookkeeping keyed by it as a parent, and
    /// the alias table that keeps old handles resolving. Children reference
    /// their parent structurally, so they see the real identity at once.
    ///
    /// Returns the node's new address, or None when the node was removed
    /// while its create call was in flight.
    pub(crate) fn reconcile(&mut self, kind: EntityKind, temp: &TempId, real: RealId) -> Option<EntityRef> {
        self.ledger.forget_new(kind, temp);
        let old = EntityRef::temp(kind, temp.clone());
        let new = EntityRef {
            kind,
            identity: Identity::Real(real),
        };
        self.ledger.rewrite_parent(&old, &new);

        let reconciled = self.tree.reconcile(kind, temp, real);
        log::debug!("Reconciled {} -> {}", old, new);
        reconciled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Question, QuestionCollection};
    use crate::repository::SnapshotRow;

    fn snapshot(rows: Vec<SnapshotRow>) -> DraftSnapshot {
        DraftSnapshot {
            draft_id: RealId(1),
            details: DraftDetails::default(),
            rows,
        }
    }

    fn row(id: i64, parent: i64, order: u32, payload: impl Into<crate::domain::Payload>) -> SnapshotRow {
        SnapshotRow {
            id: RealId(id),
            parent_id: RealId(parent),
            order,
            payload: payload.into(),
        }
    }

    #[test]
    fn test_load_orders_by_stored_position() {
        // stored orders have a gap and arrive out of order
        let editor = DraftEditor::from_snapshot(
            snapshot(vec![
                row(56, 10, 4, Question::default()),
                row(10, 1, 0, QuestionCollection::default()),
                row(55, 10, 1, Question::default()),
            ]),
            &EditorConfig::default(),
        )
        .unwrap();

        let group = SiblingGroup::children_of(&EntityRef::real(EntityKind::QuestionCollection, 10)).unwrap();
        let children = editor.children(&group).unwrap();
        let ids: Vec<_> = children.iter().map(|v| v.reference.real_id().unwrap().0).collect();
        assert_eq!(ids, vec![55, 56]);
        assert_eq!(children[1].order, 1);
        assert!(children.iter().all(|v| v.lifecycle == Lifecycle::Persisted));
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_load_rejects_orphans() {
        let err = DraftEditor::from_snapshot(
            snapshot(vec![row(55, 10, 0, Question::default())]),
            &EditorConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DraftError::InvalidSnapshot(_)));
    }

    #[test]
    fn test_load_rejects_foreign_rows() {
        let err = DraftEditor::from_snapshot(
            snapshot(vec![row(10, 2, 0, QuestionCollection::default())]),
            &EditorConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DraftError::InvalidSnapshot(_)));
    }
}
