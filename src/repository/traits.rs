//! Repository Layer - Core Traits
//!
//! The persistence collaborator the save orchestrator talks to.
//! Implementations can be a remote API, SQLite, in-memory, etc.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{BackendResult, DraftDetails, EntityKind, Payload, RealId};

/// Row content sent on create and update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Zero-based position among siblings at save time
    pub order: u32,
    pub payload: Payload,
}

/// One member of a batched reorder call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEntry {
    pub id: RealId,
    pub order: u32,
}

/// A persisted row as listed when a draft is loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub id: RealId,
    /// Owning row, or the draft for top-level kinds
    pub parent_id: RealId,
    pub order: u32,
    pub payload: Payload,
}

impl SnapshotRow {
    pub fn kind(&self) -> EntityKind {
        self.payload.kind()
    }
}

/// Everything stored for one draft
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DraftSnapshot {
    pub draft_id: RealId,
    pub details: DraftDetails,
    pub rows: Vec<SnapshotRow>,
}

/// Kinds of calls issued against a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Update,
    Delete,
    Reorder,
    UpdateDetails,
    Load,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Reorder => "reorder",
            Operation::UpdateDetails => "update_details",
            Operation::Load => "load",
        };
        f.write_str(name)
    }
}

/// Persistence collaborator for draft content.
///
/// Every call reports failure through its `Result` and may be retried
/// independently. Top-level kinds use the draft id as `parent_id`.
#[async_trait]
pub trait DraftBackend: Send + Sync {
    /// Create a row under `parent_id`, returning its real identity
    async fn create(&self, kind: EntityKind, parent_id: RealId, record: &Record) -> BackendResult<RealId>;

    /// Overwrite an existing row
    async fn update(&self, kind: EntityKind, id: RealId, record: &Record) -> BackendResult<RealId>;

    /// Delete a row (and, store permitting, its descendants)
    async fn delete(&self, kind: EntityKind, id: RealId) -> BackendResult<()>;

    /// Set the order of every listed child of `parent_id`
    async fn reorder(&self, kind: EntityKind, parent_id: RealId, entries: &[OrderEntry]) -> BackendResult<()>;

    /// Overwrite the draft's own metadata
    async fn update_details(&self, draft_id: RealId, details: &DraftDetails) -> BackendResult<()>;

    /// List everything stored for a draft
    async fn load_draft(&self, draft_id: RealId) -> BackendResult<DraftSnapshot>;
}
