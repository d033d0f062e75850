//! Mutation API
//!
//! Operations called by the editor forms, organized by step. Each one
//! performs a single tree mutation and the matching ledger update as one
//! unit. Structural errors (unknown node, wrong parent, index out of
//! range) are returned before anything changes.

mod details;
mod lesson;
mod question;
mod vocab;

use crate::domain::{
    DraftError, DraftResult, EntityKind, EntityRef, Identity, Lifecycle, Parent, Patch, Payload,
    SiblingGroup,
};
use crate::editor::DraftEditor;

fn expect_kind(reference: &EntityRef, kind: EntityKind) -> DraftResult<()> {
    if reference.kind == kind {
        Ok(())
    } else {
        Err(DraftError::KindMismatch {
            expected: kind,
            found: reference.kind,
        })
    }
}

impl DraftEditor {
    /// Resolve the group's parent to its current identity
    fn canonical_group(&self, group: &SiblingGroup) -> DraftResult<SiblingGroup> {
        let parent = match &group.parent {
            Parent::Draft => Parent::Draft,
            Parent::Entity(entity) => Parent::Entity(
                self.tree
                    .canonical(entity)
                    .ok_or_else(|| DraftError::ParentNotFound(group.parent.clone()))?,
            ),
        };
        Ok(SiblingGroup::new(parent, group.kind))
    }

    /// Append a new node under `parent`. It starts `New` with a temporary
    /// identity and is queued for creation.
    pub fn add(&mut self, parent: &Parent, payload: impl Into<Payload>) -> DraftResult<EntityRef> {
        let reference = self.tree.insert(parent, payload.into(), None)?;
        if let Identity::Temp(temp) = &reference.identity {
            self.ledger.track_new(reference.kind, temp.clone());
        }
        log::debug!("Added {} under {}", reference, parent);
        Ok(reference)
    }

    /// Merge a partial payload. Persisted nodes become dirty; new nodes
    /// are already queued for creation.
    pub fn update(&mut self, reference: &EntityRef, patch: impl Into<Patch>) -> DraftResult<()> {
        let patch = patch.into();
        expect_kind(reference, patch.kind())?;

        let lifecycle = self
            .tree
            .get(reference)
            .map(|view| view.lifecycle)
            .ok_or_else(|| DraftError::NotFound(reference.clone()))?;
        self.tree.replace(reference, &patch)?;

        if lifecycle.is_persisted() {
            let current = self
                .tree
                .canonical(reference)
                .ok_or_else(|| DraftError::NotFound(reference.clone()))?;
            if let Some(id) = current.real_id() {
                self.tree.set_lifecycle(&current, Lifecycle::PersistedDirty)?;
                self.ledger.mark_dirty(current.kind, id);
            }
        }
        Ok(())
    }

    /// Remove a node and its subtree from the visible tree.
    ///
    /// New nodes are simply dropped. Persisted ones, and their persisted
    /// descendants, are queued for deletion.
    pub fn remove(&mut self, reference: &EntityRef) -> DraftResult<()> {
        let removal = self.tree.remove(reference)?;

        for entity in &removal.entities {
            let kind = entity.reference.kind;
            match (&entity.reference.identity, entity.lifecycle) {
                (Identity::Temp(temp), _) => {
                    self.ledger.forget_new(kind, temp);
                }
                (Identity::Real(id), Lifecycle::Persisted | Lifecycle::PersistedDirty) => {
                    self.ledger.mark_deleted(kind, *id);
                }
                (Identity::Real(_), lifecycle) => {
                    log::warn!("Removed {} in unexpected state {:?}", entity.reference, lifecycle);
                }
            }
            self.ledger.drop_groups_under(&entity.reference);
        }

        // Persisted siblings after the gap moved up one slot
        let shifted = self
            .tree
            .children(&removal.group)?
            .iter()
            .skip(removal.index)
            .any(|view| view.reference.real_id().is_some());
        if shifted {
            self.ledger.mark_reordered(removal.group.clone());
        }

        log::debug!(
            "Removed {} ({} entities) from {}",
            reference,
            removal.entities.len(),
            removal.group
        );
        Ok(())
    }

    /// Move a node within its sibling group
    pub fn reorder(&mut self, group: &SiblingGroup, from: usize, to: usize) -> DraftResult<()> {
        let group = self.canonical_group(group)?;
        self.tree.move_within(&group, from, to)?;
        if from == to {
            return Ok(());
        }

        // Groups made only of new nodes get their order on creation
        let has_persisted = self
            .tree
            .children(&group)?
            .iter()
            .any(|view| view.reference.real_id().is_some());
        if has_persisted {
            self.ledger.mark_reordered(group.clone());
        }
        log::debug!("Reordered {}: {} -> {}", group, from, to);
        Ok(())
    }
}
