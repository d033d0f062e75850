//! Course Draft
//!
//! Draft composition and synchronization engine for a course authoring
//! tool. A draft is edited as an in-memory tree (question collections with
//! questions and answer options, lessons, vocabulary sets with items) and
//! pushed to a persistence backend in dependency order, with temporary
//! identities swapped for real ones as rows are created.
//!
//! - `domain`: kinds, identities, payloads, patches, errors
//! - `store` / `ledger`: the tree and the record of unsaved work
//! - `commands`: the mutation API on `DraftEditor`
//! - `sync`: the save orchestrator
//! - `repository`: the backend trait and an in-memory backend
//! - `session`: editor + backend + config for one draft

mod commands;
pub mod config;
pub mod domain;
pub mod editor;
pub mod identity;
pub mod ledger;
pub mod progress;
pub mod repository;
pub mod session;
pub mod store;
pub mod sync;
pub mod tree;

pub use config::{ConfigError, EditorConfig};
pub use domain::*;
pub use editor::DraftEditor;
pub use progress::{overall_progress, step_progress, StepProgress};
pub use repository::{DraftBackend, DraftSnapshot, MemoryBackend, Operation, OrderEntry, Record, SnapshotRow};
pub use session::{DraftSession, SessionError};
pub use sync::{SaveOrchestrator, SaveOutcome, SaveStatus};
pub use tree::{flatten_step, flatten_visible};
