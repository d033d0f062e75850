//! Save Outcome
//!
//! Aggregated result of one save cycle. Individual call failures end up
//! here instead of aborting the cycle.

use serde::Serialize;
use std::fmt;

use crate::domain::{BackendError, EntityRef, RealId, SiblingGroup, TempId, ValidationError};
use crate::repository::Operation;

/// What a persistence call was about
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SaveTarget {
    Draft(RealId),
    Entity(EntityRef),
    Group(SiblingGroup),
}

impl fmt::Display for SaveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveTarget::Draft(id) => write!(f, "draft {}", id),
            SaveTarget::Entity(entity) => entity.fmt(f),
            SaveTarget::Group(group) => group.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveFailure {
    pub operation: Operation,
    pub target: SaveTarget,
    pub error: BackendError,
}

/// A node that received its real identity this cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedEntity {
    pub temp: TempId,
    pub reference: EntityRef,
    /// False when the node was removed while its create was in flight;
    /// the new row is then queued for deletion
    pub still_present: bool,
}

/// A node skipped because its payload failed validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidEntity {
    pub reference: EntityRef,
    pub error: ValidationError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    /// The ledger was empty, no call was issued
    NothingToSave,
    /// Every planned call succeeded and nothing was held back
    Saved,
    /// Something failed, was invalid, or is waiting on a parent
    Partial,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SaveOutcome {
    pub created: Vec<CreatedEntity>,
    pub updated: Vec<EntityRef>,
    pub deleted: Vec<EntityRef>,
    pub reordered: Vec<SiblingGroup>,
    pub details_saved: bool,
    pub failures: Vec<SaveFailure>,
    pub invalid: Vec<InvalidEntity>,
    /// New nodes not attempted because their parent has no real identity yet
    pub pending: Vec<EntityRef>,
    /// Sibling groups whose reorder waits on unsaved members or parent
    pub pending_groups: Vec<SiblingGroup>,
    pub calls_issued: usize,
}

impl SaveOutcome {
    pub fn status(&self) -> SaveStatus {
        if !self.failures.is_empty()
            || !self.invalid.is_empty()
            || !self.pending.is_empty()
            || !self.pending_groups.is_empty()
        {
            SaveStatus::Partial
        } else if self.calls_issued == 0 {
            SaveStatus::NothingToSave
        } else {
            SaveStatus::Saved
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() != SaveStatus::Partial
    }

    /// Failures of one kind of call
    pub fn failures_of(&self, operation: Operation) -> impl Iterator<Item = &SaveFailure> {
        self.failures
            .iter()
            .filter(move |failure| failure.operation == operation)
    }

    pub(crate) fn fail(&mut self, operation: Operation, target: SaveTarget, error: BackendError) {
        log::warn!("{} of {} failed: {}", operation, target, error);
        self.failures.push(SaveFailure {
            operation,
            target,
            error,
        });
    }

    /// One-line summary suitable for a status bar
    pub fn summary(&self) -> String {
        match self.status() {
            SaveStatus::NothingToSave => "Nothing to save".to_string(),
            SaveStatus::Saved => format!(
                "Saved: {} created, {} updated, {} deleted",
                self.created.len(),
                self.updated.len(),
                self.deleted.len()
            ),
            SaveStatus::Partial => format!(
                "Partially saved: {} failed, {} invalid, {} waiting",
                self.failures.len(),
                self.invalid.len(),
                self.pending.len() + self.pending_groups.len()
            ),
        }
    }
}
