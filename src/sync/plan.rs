//! Save Planning
//!
//! Turns ledger entries into backend calls, one phase at a time. Planning
//! runs under the editor lock and only reads; the calls carry owned copies
//! of everything they send.

use crate::domain::{
    BackendResult, DraftDetails, EntityKind, EntityRef, Parent, RealId, SiblingGroup, TempId,
};
use crate::editor::DraftEditor;
use crate::repository::{DraftBackend, Operation, OrderEntry, Record};
use crate::store::EntityView;

use super::outcome::{InvalidEntity, SaveTarget};

#[derive(Debug, Clone)]
pub(crate) enum Call {
    Delete {
        kind: EntityKind,
        id: RealId,
    },
    Create {
        kind: EntityKind,
        temp: TempId,
        parent_id: RealId,
        record: Record,
        revision: u64,
    },
    Update {
        kind: EntityKind,
        id: RealId,
        record: Record,
        revision: u64,
    },
    UpdateDetails {
        draft_id: RealId,
        details: DraftDetails,
        revision: u64,
    },
    Reorder {
        group: SiblingGroup,
        parent_id: RealId,
        entries: Vec<OrderEntry>,
    },
}

impl Call {
    pub fn operation(&self) -> Operation {
        match self {
            Call::Delete { .. } => Operation::Delete,
            Call::Create { .. } => Operation::Create,
            Call::Update { .. } => Operation::Update,
            Call::UpdateDetails { .. } => Operation::UpdateDetails,
            Call::Reorder { .. } => Operation::Reorder,
        }
    }

    pub fn target(&self) -> SaveTarget {
        match self {
            Call::Delete { kind, id } | Call::Update { kind, id, .. } => {
                SaveTarget::Entity(EntityRef::real(*kind, id.0))
            }
            Call::Create { kind, temp, .. } => SaveTarget::Entity(EntityRef::temp(*kind, temp.clone())),
            Call::UpdateDetails { draft_id, .. } => SaveTarget::Draft(*draft_id),
            Call::Reorder { group, .. } => SaveTarget::Group(group.clone()),
        }
    }

    /// Issue the call. Creates and updates answer with the row's real id.
    pub async fn issue(&self, backend: &dyn DraftBackend) -> BackendResult<Option<RealId>> {
        match self {
            Call::Delete { kind, id } => backend.delete(*kind, *id).await.map(|_| None),
            Call::Create {
                kind,
                parent_id,
                record,
                ..
            } => backend.create(*kind, *parent_id, record).await.map(Some),
            Call::Update { kind, id, record, .. } => backend.update(*kind, *id, record).await.map(Some),
            Call::UpdateDetails { draft_id, details, .. } => {
                backend.update_details(*draft_id, details).await.map(|_| None)
            }
            Call::Reorder {
                group,
                parent_id,
                entries,
            } => backend
                .reorder(group.kind, *parent_id, entries)
                .await
                .map(|_| None),
        }
    }
}

/// Calls of one phase plus everything held back from it
#[derive(Debug, Default)]
pub(crate) struct Plan {
    pub calls: Vec<Call>,
    pub invalid: Vec<InvalidEntity>,
    pub pending: Vec<EntityRef>,
    pub pending_groups: Vec<SiblingGroup>,
    /// Reordered groups with nothing left to send
    pub settled_groups: Vec<SiblingGroup>,
}

/// Real id to send as the parent of a group's members
fn parent_id(editor: &DraftEditor, parent: &Parent) -> Option<RealId> {
    match parent {
        Parent::Draft => Some(editor.draft_id),
        Parent::Entity(owner) => editor.tree.canonical(owner)?.real_id(),
    }
}

/// Pending deletions, every kind at once. Deleting a parent first may
/// cascade over its children; those later answer NotFound.
pub(crate) fn deletions(editor: &DraftEditor) -> Plan {
    let mut plan = Plan::default();
    for depth in 1..=3 {
        for kind in EntityKind::at_depth(depth) {
            for id in &editor.ledger.kind(kind).deleted {
                plan.calls.push(Call::Delete { kind, id: *id });
            }
        }
    }
    plan
}

/// Creates and updates for kinds at `depth`, plus the details update with
/// the top level. Calls come out in display order.
pub(crate) fn upserts(editor: &DraftEditor, depth: u8, validate: bool) -> Plan {
    let mut plan = Plan::default();

    if depth == 1 && editor.ledger.details_dirty() {
        plan.calls.push(Call::UpdateDetails {
            draft_id: editor.draft_id,
            details: editor.details.clone(),
            revision: editor.details_revision,
        });
    }

    let mut keyed: Vec<((EntityKind, Vec<u32>), Call)> = Vec::new();
    for kind in EntityKind::at_depth(depth) {
        let entries = editor.ledger.kind(kind);

        for temp in &entries.optimistic {
            let reference = EntityRef::temp(kind, temp.clone());
            let Some(view) = editor.tree.get(&reference) else {
                log::warn!("Optimistic entry {} has no node", reference);
                continue;
            };
            let Some(parent_id) = parent_id(editor, &view.parent) else {
                plan.pending.push(reference);
                continue;
            };
            if !passes(&view, validate, &mut plan) {
                continue;
            }
            let call = Call::Create {
                kind,
                temp: temp.clone(),
                parent_id,
                record: record_of(&view),
                revision: view.revision,
            };
            keyed.push((sort_key(editor, &view), call));
        }

        for id in &entries.dirty {
            let reference = EntityRef::real(kind, id.0);
            let Some(view) = editor.tree.get(&reference) else {
                log::warn!("Dirty entry {} has no node", reference);
                continue;
            };
            if !passes(&view, validate, &mut plan) {
                continue;
            }
            let call = Call::Update {
                kind,
                id: *id,
                record: record_of(&view),
                revision: view.revision,
            };
            keyed.push((sort_key(editor, &view), call));
        }
    }

    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    plan.calls.extend(keyed.into_iter().map(|(_, call)| call));
    plan
}

/// Batched reorders for groups whose members and parent all have real ids
pub(crate) fn reorders(editor: &DraftEditor) -> Plan {
    let mut plan = Plan::default();

    for group in editor.ledger.reordered() {
        let Ok(members) = editor.tree.children(group) else {
            // parent no longer in the tree
            plan.settled_groups.push(group.clone());
            continue;
        };
        if members.is_empty() {
            plan.settled_groups.push(group.clone());
            continue;
        }
        let Some(parent_id) = parent_id(editor, &group.parent) else {
            plan.pending_groups.push(group.clone());
            continue;
        };
        let entries: Option<Vec<OrderEntry>> = members
            .iter()
            .map(|view| {
                view.reference.real_id().map(|id| OrderEntry {
                    id,
                    order: view.order,
                })
            })
            .collect();
        match entries {
            Some(entries) => plan.calls.push(Call::Reorder {
                group: group.clone(),
                parent_id,
                entries,
            }),
            None => plan.pending_groups.push(group.clone()),
        }
    }
    plan
}

/// Current order entries of a group, None while any member is unsaved
pub(crate) fn current_entries(editor: &DraftEditor, group: &SiblingGroup) -> Option<Vec<OrderEntry>> {
    editor
        .tree
        .children(group)
        .ok()?
        .iter()
        .map(|view| {
            view.reference.real_id().map(|id| OrderEntry {
                id,
                order: view.order,
            })
        })
        .collect()
}

fn passes(view: &EntityView<'_>, validate: bool, plan: &mut Plan) -> bool {
    if !validate {
        return true;
    }
    match view.payload.validate() {
        Ok(()) => true,
        Err(error) => {
            log::info!("Skipping {}: {}", view.reference, error);
            plan.invalid.push(InvalidEntity {
                reference: view.reference.clone(),
                error,
            });
            false
        }
    }
}

fn record_of(view: &EntityView<'_>) -> Record {
    Record {
        order: view.order,
        payload: view.payload.clone(),
    }
}

fn sort_key(editor: &DraftEditor, view: &EntityView<'_>) -> (EntityKind, Vec<u32>) {
    let path = editor.tree.position_path(&view.reference).unwrap_or_default();
    (view.reference.kind, path)
}

