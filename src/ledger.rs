//! Dirty/Deletion Ledger
//!
//! Incrementally maintained record of what the next save has to do,
//! independent of the tree's content. Every mutation updates it; the save
//! orchestrator plans its calls from it and clears entries as calls succeed.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{EntityKind, EntityRef, Parent, RealId, SiblingGroup, Step, TempId};

/// Bookkeeping for one entity kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindLedger {
    /// Persisted entities with unsaved local edits
    pub dirty: BTreeSet<RealId>,
    /// Persisted entities removed locally, awaiting their delete call
    pub deleted: BTreeSet<RealId>,
    /// Entities awaiting their first save
    pub optimistic: BTreeSet<TempId>,
}

impl KindLedger {
    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty() && self.deleted.is_empty() && self.optimistic.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    kinds: BTreeMap<EntityKind, KindLedger>,
    reordered: BTreeSet<SiblingGroup>,
    details_dirty: bool,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            kinds: EntityKind::ALL
                .into_iter()
                .map(|kind| (kind, KindLedger::default()))
                .collect(),
            reordered: BTreeSet::new(),
            details_dirty: false,
        }
    }

    pub fn kind(&self, kind: EntityKind) -> &KindLedger {
        &self.kinds[&kind]
    }

    fn kind_mut(&mut self, kind: EntityKind) -> &mut KindLedger {
        self.kinds.entry(kind).or_default()
    }

    // ========================
    // Persisted entities
    // ========================

    /// Record local edits. Ignored for an identity already marked deleted.
    pub fn mark_dirty(&mut self, kind: EntityKind, id: RealId) -> bool {
        let entry = self.kind_mut(kind);
        if entry.deleted.contains(&id) {
            return false;
        }
        entry.dirty.insert(id)
    }

    /// Record a pending deletion, superseding any pending update
    pub fn mark_deleted(&mut self, kind: EntityKind, id: RealId) -> bool {
        let entry = self.kind_mut(kind);
        entry.dirty.remove(&id);
        entry.deleted.insert(id)
    }

    pub fn clear_dirty(&mut self, kind: EntityKind, id: RealId) -> bool {
        self.kind_mut(kind).dirty.remove(&id)
    }

    pub fn clear_deleted(&mut self, kind: EntityKind, id: RealId) -> bool {
        self.kind_mut(kind).deleted.remove(&id)
    }

    /// Forget the identity entirely
    pub fn clear(&mut self, kind: EntityKind, id: RealId) {
        let entry = self.kind_mut(kind);
        entry.dirty.remove(&id);
        entry.deleted.remove(&id);
    }

    pub fn is_dirty(&self, kind: EntityKind, id: RealId) -> bool {
        self.kind(kind).dirty.contains(&id)
    }

    pub fn is_deleted(&self, kind: EntityKind, id: RealId) -> bool {
        self.kind(kind).deleted.contains(&id)
    }

    // ========================
    // New entities
    // ========================

    pub fn track_new(&mut self, kind: EntityKind, id: TempId) -> bool {
        self.kind_mut(kind).optimistic.insert(id)
    }

    pub fn forget_new(&mut self, kind: EntityKind, id: &TempId) -> bool {
        self.kind_mut(kind).optimistic.remove(id)
    }

    pub fn is_new(&self, kind: EntityKind, id: &TempId) -> bool {
        self.kind(kind).optimistic.contains(id)
    }

    // ========================
    // Sibling order
    // ========================

    pub fn mark_reordered(&mut self, group: SiblingGroup) -> bool {
        self.reordered.insert(group)
    }

    pub fn clear_reordered(&mut self, group: &SiblingGroup) -> bool {
        self.reordered.remove(group)
    }

    pub fn reordered(&self) -> impl Iterator<Item = &SiblingGroup> {
        self.reordered.iter()
    }

    /// Drop order bookkeeping for the children of a removed node
    pub fn drop_groups_under(&mut self, parent: &EntityRef) {
        self.reordered
            .retain(|group| !matches!(&group.parent, Parent::Entity(owner) if owner == parent));
    }

    /// Point groups owned by `old` at `new` after a reconciliation
    pub fn rewrite_parent(&mut self, old: &EntityRef, new: &EntityRef) {
        let moved: Vec<SiblingGroup> = self
            .reordered
            .iter()
            .filter(|group| matches!(&group.parent, Parent::Entity(owner) if owner == old))
            .cloned()
            .collect();
        for group in moved {
            self.reordered.remove(&group);
            self.reordered
                .insert(SiblingGroup::new(Parent::Entity(new.clone()), group.kind));
        }
    }

    // ========================
    // Draft details
    // ========================

    pub fn mark_details_dirty(&mut self) {
        self.details_dirty = true;
    }

    pub fn clear_details_dirty(&mut self) {
        self.details_dirty = false;
    }

    pub fn details_dirty(&self) -> bool {
        self.details_dirty
    }

    // ========================
    // Derived state
    // ========================

    /// Any unsaved work attributed to `step`
    pub fn is_step_dirty(&self, step: Step) -> bool {
        match step {
            Step::Details => self.details_dirty,
            _ => {
                step.kinds().any(|kind| !self.kind(kind).is_empty())
                    || self.reordered.iter().any(|group| group.kind.step() == step)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.details_dirty
            && self.reordered.is_empty()
            && self.kinds.values().all(KindLedger::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityAllocator;

    #[test]
    fn test_dirty_and_deleted_are_exclusive() {
        let mut ledger = Ledger::new();
        let kind = EntityKind::Question;

        assert!(ledger.mark_dirty(kind, RealId(55)));
        assert!(!ledger.mark_dirty(kind, RealId(55)));
        assert!(ledger.mark_deleted(kind, RealId(55)));
        assert!(!ledger.is_dirty(kind, RealId(55)));
        assert!(ledger.is_deleted(kind, RealId(55)));

        // edits after deletion do not resurrect the dirty entry
        assert!(!ledger.mark_dirty(kind, RealId(55)));
        assert!(!ledger.is_dirty(kind, RealId(55)));

        ledger.clear(kind, RealId(55));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut ledger = Ledger::new();
        ledger.mark_dirty(EntityKind::Question, RealId(1));
        assert!(!ledger.is_dirty(EntityKind::AnswerOption, RealId(1)));
        assert!(ledger.is_step_dirty(Step::Questions));
        assert!(!ledger.is_step_dirty(Step::Vocabulary));
        assert!(!ledger.is_step_dirty(Step::Details));
    }

    #[test]
    fn test_optimistic_entries() {
        let mut ledger = Ledger::new();
        let mut allocator = IdentityAllocator::new("ledger");
        let temp = allocator.allocate(EntityKind::VocabItem);

        assert!(ledger.track_new(EntityKind::VocabItem, temp.clone()));
        assert!(ledger.is_new(EntityKind::VocabItem, &temp));
        assert!(ledger.is_step_dirty(Step::Vocabulary));
        assert!(ledger.forget_new(EntityKind::VocabItem, &temp));
        assert!(!ledger.forget_new(EntityKind::VocabItem, &temp));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_reordered_group_follows_reconciliation() {
        let mut ledger = Ledger::new();
        let mut allocator = IdentityAllocator::new("ledger");
        let old = EntityRef::temp(EntityKind::Question, allocator.allocate(EntityKind::Question));
        let new = EntityRef::real(EntityKind::Question, 55);

        ledger.mark_reordered(SiblingGroup::children_of(&old).unwrap());
        ledger.mark_reordered(SiblingGroup::root(EntityKind::Lesson));
        ledger.rewrite_parent(&old, &new);

        let groups: Vec<_> = ledger.reordered().cloned().collect();
        assert!(groups.contains(&SiblingGroup::children_of(&new).unwrap()));
        assert!(!groups.contains(&SiblingGroup::children_of(&old).unwrap()));
        assert!(ledger.is_step_dirty(Step::Lessons));

        ledger.drop_groups_under(&new);
        assert_eq!(ledger.reordered().count(), 1);
    }

    #[test]
    fn test_details_flag() {
        let mut ledger = Ledger::new();
        ledger.mark_details_dirty();
        assert!(ledger.is_step_dirty(Step::Details));
        assert!(!ledger.is_empty());
        ledger.clear_details_dirty();
        assert!(ledger.is_empty());
    }
}
