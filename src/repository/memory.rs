//! In-Memory Backend
//!
//! A `DraftBackend` kept entirely in process. Mirrors the relational
//! layout (every row references its parent, deletes cascade) and records
//! every call in a journal. Faults can be injected per operation and kind
//! to exercise partial-failure paths.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

use super::traits::{DraftBackend, DraftSnapshot, OrderEntry, Operation, Record, SnapshotRow};
use crate::domain::{BackendError, BackendResult, DraftDetails, EntityKind, Payload, RealId};

/// One call as seen by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCall {
    pub operation: Operation,
    pub kind: Option<EntityKind>,
    /// Row id for update/delete, parent id for create/reorder, draft id otherwise
    pub target: RealId,
    /// Ids and orders sent with a reorder call
    pub entries: Vec<OrderEntry>,
}

#[derive(Debug, Clone)]
struct Fault {
    operation: Operation,
    kind: Option<EntityKind>,
    /// None = fail every matching call
    remaining: Option<u32>,
    error: BackendError,
}

#[derive(Debug, Clone)]
struct StoredRow {
    parent_id: RealId,
    order: u32,
    payload: Payload,
}

#[derive(Debug, Default)]
struct MemoryState {
    drafts: HashMap<RealId, DraftDetails>,
    rows: BTreeMap<(EntityKind, RealId), StoredRow>,
    next_ids: HashMap<EntityKind, i64>,
    journal: Vec<BackendCall>,
    faults: Vec<Fault>,
}

impl MemoryState {
    fn record(&mut self, operation: Operation, kind: Option<EntityKind>, target: RealId) {
        self.journal.push(BackendCall {
            operation,
            kind,
            target,
            entries: Vec::new(),
        });
    }

    fn injected(&mut self, operation: Operation, kind: Option<EntityKind>) -> BackendResult<()> {
        let position = self.faults.iter().position(|fault| {
            fault.operation == operation && (fault.kind.is_none() || fault.kind == kind)
        });
        let Some(position) = position else {
            return Ok(());
        };

        let error = self.faults[position].error.clone();
        if let Some(remaining) = self.faults[position].remaining.as_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                self.faults.remove(position);
            }
        }
        Err(error)
    }

    fn parent_exists(&self, kind: EntityKind, parent_id: RealId) -> bool {
        match kind.parent_kind() {
            None => self.drafts.contains_key(&parent_id),
            Some(parent_kind) => self.rows.contains_key(&(parent_kind, parent_id)),
        }
    }

    fn allocate(&mut self, kind: EntityKind) -> RealId {
        let next = self.next_ids.entry(kind).or_insert(1);
        let id = RealId(*next);
        *next += 1;
        id
    }

    fn cascade_delete(&mut self, kind: EntityKind, id: RealId) {
        self.rows.remove(&(kind, id));
        let Some(child_kind) = kind.child_kind() else {
            return;
        };
        let children: Vec<RealId> = self
            .rows
            .iter()
            .filter(|((k, _), row)| *k == child_kind && row.parent_id == id)
            .map(|((_, child), _)| *child)
            .collect();
        for child in children {
            self.cascade_delete(child_kind, child);
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a draft so rows can be created under it
    pub async fn add_draft(&self, draft_id: RealId, details: DraftDetails) {
        self.state.lock().await.drafts.insert(draft_id, details);
    }

    /// Make the next created row of `kind` receive `first`
    pub async fn start_ids_at(&self, kind: EntityKind, first: i64) {
        self.state.lock().await.next_ids.insert(kind, first);
    }

    /// Seed a persisted row directly, bypassing the journal
    pub async fn seed_row(&self, id: RealId, parent_id: RealId, order: u32, payload: Payload) {
        let mut state = self.state.lock().await;
        let kind = payload.kind();
        let next = state.next_ids.entry(kind).or_insert(1);
        *next = (*next).max(id.0 + 1);
        state.rows.insert(
            (kind, id),
            StoredRow {
                parent_id,
                order,
                payload,
            },
        );
    }

    /// Fail the next `times` calls of `operation` (optionally only for `kind`)
    pub async fn fail_next(&self, operation: Operation, kind: Option<EntityKind>, times: u32, error: BackendError) {
        if times == 0 {
            return;
        }
        self.state.lock().await.faults.push(Fault {
            operation,
            kind,
            remaining: Some(times),
            error,
        });
    }

    /// Fail every call of `operation` (optionally only for `kind`)
    pub async fn fail_always(&self, operation: Operation, kind: Option<EntityKind>, error: BackendError) {
        self.state.lock().await.faults.push(Fault {
            operation,
            kind,
            remaining: None,
            error,
        });
    }

    pub async fn clear_faults(&self) {
        self.state.lock().await.faults.clear();
    }

    /// Every call made so far
    pub async fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().await.journal.clone()
    }

    /// Drain the journal
    pub async fn take_calls(&self) -> Vec<BackendCall> {
        std::mem::take(&mut self.state.lock().await.journal)
    }

    /// Stored `(parent_id, order, payload)` of a row
    pub async fn row(&self, kind: EntityKind, id: RealId) -> Option<(RealId, u32, Payload)> {
        self.state
            .lock()
            .await
            .rows
            .get(&(kind, id))
            .map(|row| (row.parent_id, row.order, row.payload.clone()))
    }

    /// Ids of stored rows of `kind` under `parent_id`, by stored order
    pub async fn children(&self, kind: EntityKind, parent_id: RealId) -> Vec<RealId> {
        let state = self.state.lock().await;
        let mut rows: Vec<(u32, RealId)> = state
            .rows
            .iter()
            .filter(|((k, _), row)| *k == kind && row.parent_id == parent_id)
            .map(|((_, id), row)| (row.order, *id))
            .collect();
        rows.sort();
        rows.into_iter().map(|(_, id)| id).collect()
    }

    pub async fn row_count(&self) -> usize {
        self.state.lock().await.rows.len()
    }

    pub async fn details(&self, draft_id: RealId) -> Option<DraftDetails> {
        self.state.lock().await.drafts.get(&draft_id).cloned()
    }
}

#[async_trait]
impl DraftBackend for MemoryBackend {
    async fn create(&self, kind: EntityKind, parent_id: RealId, record: &Record) -> BackendResult<RealId> {
        let mut state = self.state.lock().await;
        state.record(Operation::Create, Some(kind), parent_id);
        state.injected(Operation::Create, Some(kind))?;

        if record.payload.kind() != kind {
            return Err(BackendError::InvalidInput(format!(
                "{} payload sent as {}",
                record.payload.kind(),
                kind
            )));
        }
        if !state.parent_exists(kind, parent_id) {
            return Err(BackendError::NotFound(format!("parent {} of {}", parent_id, kind)));
        }

        let id = state.allocate(kind);
        state.rows.insert(
            (kind, id),
            StoredRow {
                parent_id,
                order: record.order,
                payload: record.payload.clone(),
            },
        );
        Ok(id)
    }

    async fn update(&self, kind: EntityKind, id: RealId, record: &Record) -> BackendResult<RealId> {
        let mut state = self.state.lock().await;
        state.record(Operation::Update, Some(kind), id);
        state.injected(Operation::Update, Some(kind))?;

        let row = state
            .rows
            .get_mut(&(kind, id))
            .ok_or_else(|| BackendError::NotFound(format!("{} {}", kind, id)))?;
        row.order = record.order;
        row.payload = record.payload.clone();
        Ok(id)
    }

    async fn delete(&self, kind: EntityKind, id: RealId) -> BackendResult<()> {
        let mut state = self.state.lock().await;
        state.record(Operation::Delete, Some(kind), id);
        state.injected(Operation::Delete, Some(kind))?;

        if !state.rows.contains_key(&(kind, id)) {
            return Err(BackendError::NotFound(format!("{} {}", kind, id)));
        }
        state.cascade_delete(kind, id);
        Ok(())
    }

    async fn reorder(&self, kind: EntityKind, parent_id: RealId, entries: &[OrderEntry]) -> BackendResult<()> {
        let mut state = self.state.lock().await;
        state.journal.push(BackendCall {
            operation: Operation::Reorder,
            kind: Some(kind),
            target: parent_id,
            entries: entries.to_vec(),
        });
        state.injected(Operation::Reorder, Some(kind))?;

        for entry in entries {
            match state.rows.get(&(kind, entry.id)) {
                Some(row) if row.parent_id == parent_id => {}
                _ => {
                    return Err(BackendError::InvalidInput(format!(
                        "{} {} is not a child of {}",
                        kind, entry.id, parent_id
                    )))
                }
            }
        }
        for entry in entries {
            if let Some(row) = state.rows.get_mut(&(kind, entry.id)) {
                row.order = entry.order;
            }
        }
        Ok(())
    }

    async fn update_details(&self, draft_id: RealId, details: &DraftDetails) -> BackendResult<()> {
        let mut state = self.state.lock().await;
        state.record(Operation::UpdateDetails, None, draft_id);
        state.injected(Operation::UpdateDetails, None)?;

        let stored = state
            .drafts
            .get_mut(&draft_id)
            .ok_or_else(|| BackendError::NotFound(format!("draft {}", draft_id)))?;
        *stored = details.clone();
        Ok(())
    }

    async fn load_draft(&self, draft_id: RealId) -> BackendResult<DraftSnapshot> {
        let mut state = self.state.lock().await;
        state.record(Operation::Load, None, draft_id);
        state.injected(Operation::Load, None)?;

        let details = state
            .drafts
            .get(&draft_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("draft {}", draft_id)))?;

        // Walk down from the draft so rows of other drafts are left out
        let mut rows = Vec::new();
        let mut owners: Vec<(Option<EntityKind>, RealId)> = vec![(None, draft_id)];
        while let Some((owner_kind, owner_id)) = owners.pop() {
            let kinds: Vec<EntityKind> = match owner_kind {
                None => EntityKind::at_depth(1).collect(),
                Some(kind) => kind.child_kind().into_iter().collect(),
            };
            for kind in kinds {
                for ((k, id), row) in state.rows.iter() {
                    if *k == kind && row.parent_id == owner_id {
                        rows.push(SnapshotRow {
                            id: *id,
                            parent_id: owner_id,
                            order: row.order,
                            payload: row.payload.clone(),
                        });
                        owners.push((Some(kind), *id));
                    }
                }
            }
        }

        Ok(DraftSnapshot {
            draft_id,
            details,
            rows,
        })
    }
}
