//! Draft SQLite
//!
//! Relational persistence for course drafts: one table per entity kind,
//! rows linked to their parent by foreign key with cascading deletes,
//! payloads stored as JSON.

mod db;
mod draft_repo;
mod positioning;
mod snapshot;

#[cfg(test)]
mod tests;

pub use db::{init_db, DbState};
pub use draft_repo::SqliteDraftRepository;
