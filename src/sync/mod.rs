//! Save Orchestrator
//!
//! Pushes the ledger to a `DraftBackend` in dependency order: pending
//! deletions first, then creates and updates level by level (collections,
//! lessons and vocab sets before their children), then batched sibling
//! reorders.
//!
//! The editor lock is only held while a phase is planned and while its
//! results are applied. Calls run unlocked, so edits made in the meantime
//! are detected through node revisions and survive the save.

mod outcome;
mod plan;

pub use outcome::{CreatedEntity, InvalidEntity, SaveFailure, SaveOutcome, SaveStatus, SaveTarget};

use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

use crate::config::EditorConfig;
use crate::domain::{BackendError, BackendResult, EntityRef, Lifecycle, RealId};
use crate::editor::DraftEditor;
use crate::repository::{DraftBackend, Operation};
use plan::{Call, Plan};

pub struct SaveOrchestrator {
    backend: Arc<dyn DraftBackend>,
    max_in_flight: usize,
    validate: bool,
}

impl SaveOrchestrator {
    pub fn new(backend: Arc<dyn DraftBackend>, config: &EditorConfig) -> Self {
        Self {
            backend,
            max_in_flight: config.max_in_flight.max(1),
            validate: config.validate_before_save,
        }
    }

    pub fn backend(&self) -> &Arc<dyn DraftBackend> {
        &self.backend
    }

    /// Run one full save cycle.
    ///
    /// Never fails as a whole: every call failure, validation problem and
    /// dependency-blocked entity is reported in the outcome, and the
    /// matching ledger entries stay in place for the next cycle.
    pub async fn save_all(&self, editor: &Mutex<DraftEditor>) -> SaveOutcome {
        let mut outcome = SaveOutcome::default();
        let draft_id = editor.lock().await.draft_id;
        log::info!("Saving draft {}", draft_id);

        self.phase(editor, &mut outcome, plan::deletions).await;
        for depth in 1..=3 {
            let validate = self.validate;
            self.phase(editor, &mut outcome, |current| plan::upserts(current, depth, validate))
                .await;
        }
        self.phase(editor, &mut outcome, plan::reorders).await;

        log::info!("Save of draft {} finished: {}", draft_id, outcome.summary());
        outcome
    }

    async fn phase<F>(&self, editor: &Mutex<DraftEditor>, outcome: &mut SaveOutcome, planner: F)
    where
        F: FnOnce(&DraftEditor) -> Plan,
    {
        let plan = {
            let guard = editor.lock().await;
            planner(&guard)
        };
        let Plan {
            calls,
            invalid,
            pending,
            pending_groups,
            settled_groups,
        } = plan;
        outcome.invalid.extend(invalid);
        outcome.pending.extend(pending);
        outcome.pending_groups.extend(pending_groups);

        if !settled_groups.is_empty() {
            let mut guard = editor.lock().await;
            for group in &settled_groups {
                guard.ledger.clear_reordered(group);
            }
        }
        if calls.is_empty() {
            return;
        }

        outcome.calls_issued += calls.len();
        let results = self.execute(calls).await;

        let mut guard = editor.lock().await;
        for (call, result) in results {
            match result {
                Ok(real) => apply(&mut guard, call, real, outcome),
                // already gone remotely, e.g. removed along with its parent
                Err(error) if error.is_not_found() && matches!(call, Call::Delete { .. }) => {
                    apply(&mut guard, call, None, outcome)
                }
                Err(error) => outcome.fail(call.operation(), call.target(), error),
            }
        }
    }

    /// Issue calls concurrently, at most `max_in_flight` at a time.
    /// Results come back in the order the calls were planned.
    async fn execute(&self, calls: Vec<Call>) -> Vec<(Call, BackendResult<Option<RealId>>)> {
        let permits = Arc::new(Semaphore::new(self.max_in_flight));
        let mut tasks = JoinSet::new();

        for (index, call) in calls.iter().cloned().enumerate() {
            let backend = Arc::clone(&self.backend);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                (index, call.issue(backend.as_ref()).await)
            });
        }

        let mut results: Vec<Option<BackendResult<Option<RealId>>>> = vec![None; calls.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(err) => log::error!("Persistence task failed: {}", err),
            }
        }

        calls
            .into_iter()
            .zip(results)
            .map(|(call, result)| {
                let result = result
                    .unwrap_or_else(|| Err(BackendError::Internal("call did not complete".to_string())));
                (call, result)
            })
            .collect()
    }
}

/// Fold one successful call back into the editor
fn apply(editor: &mut DraftEditor, call: Call, real: Option<RealId>, outcome: &mut SaveOutcome) {
    match call {
        Call::Delete { kind, id } => {
            editor.ledger.clear_deleted(kind, id);
            outcome.deleted.push(EntityRef::real(kind, id.0));
        }

        Call::Create {
            kind,
            temp,
            record,
            revision,
            ..
        } => {
            let Some(real) = real else {
                outcome.fail(
                    Operation::Create,
                    SaveTarget::Entity(EntityRef::temp(kind, temp)),
                    BackendError::Internal("create returned no id".to_string()),
                );
                return;
            };

            match editor.reconcile(kind, &temp, real) {
                Some(current) => {
                    let state = editor.tree.get(&current).map(|view| (view.revision, view.order));
                    if let Some((current_revision, order)) = state {
                        if current_revision != revision {
                            let _ = editor.tree.set_lifecycle(&current, Lifecycle::PersistedDirty);
                            editor.ledger.mark_dirty(kind, real);
                        }
                        if order != record.order {
                            if let Some(group) = editor.tree.group_of(&current) {
                                editor.ledger.mark_reordered(group);
                            }
                        }
                    }
                    outcome.created.push(CreatedEntity {
                        temp,
                        reference: current,
                        still_present: true,
                    });
                }
                None => {
                    log::info!("{} {} was removed while being created, queueing delete", kind, real);
                    editor.ledger.mark_deleted(kind, real);
                    outcome.created.push(CreatedEntity {
                        temp,
                        reference: EntityRef::real(kind, real.0),
                        still_present: false,
                    });
                }
            }
        }

        Call::Update {
            kind,
            id,
            record,
            revision,
        } => {
            let reference = EntityRef::real(kind, id.0);
            if let Some(returned) = real.filter(|returned| *returned != id) {
                log::warn!("Update of {} answered with id {}", reference, returned);
            }
            let state = editor.tree.get(&reference).map(|view| (view.revision, view.order));
            if let Some((current_revision, order)) = state {
                if current_revision == revision {
                    editor.ledger.clear_dirty(kind, id);
                    let _ = editor.tree.set_lifecycle(&reference, Lifecycle::Persisted);
                }
                if order != record.order {
                    if let Some(group) = editor.tree.group_of(&reference) {
                        editor.ledger.mark_reordered(group);
                    }
                }
            }
            outcome.updated.push(reference);
        }

        Call::UpdateDetails { revision, .. } => {
            if editor.details_revision == revision {
                editor.ledger.clear_details_dirty();
            }
            outcome.details_saved = true;
        }

        Call::Reorder { group, entries, .. } => {
            if plan::current_entries(editor, &group).as_deref() == Some(entries.as_slice()) {
                editor.ledger.clear_reordered(&group);
            }
            outcome.reordered.push(group);
        }
    }
}
