//! Repository Layer
//!
//! The persistence collaborator seen by the save orchestrator, plus an
//! in-process implementation.

mod memory;
mod traits;

pub use memory::{BackendCall, MemoryBackend};
pub use traits::{DraftBackend, DraftSnapshot, OrderEntry, Operation, Record, SnapshotRow};
