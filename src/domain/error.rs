//! Domain Layer - Errors
//!
//! Structural errors are programming defects in the caller and are returned
//! immediately. Validation and backend errors are collected per entity by
//! the save orchestrator instead of being thrown.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entity::{EntityKind, EntityRef, Parent, SiblingGroup};

/// Common result type for editor operations
pub type DraftResult<T> = Result<T, DraftError>;

/// Result type returned by a persistence backend
pub type BackendResult<T> = Result<T, BackendError>;

/// The tree and the caller disagree about its shape
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("Entity not found: {0}")]
    NotFound(EntityRef),

    #[error("Parent not found: {0}")]
    ParentNotFound(Parent),

    #[error("A {child} cannot be placed under {parent}")]
    InvalidParent { child: EntityKind, parent: Parent },

    #[error("Expected a {expected} payload, got {found}")]
    KindMismatch { expected: EntityKind, found: EntityKind },

    #[error("Index {index} out of range for {group} ({len} entries)")]
    IndexOutOfRange { group: SiblingGroup, index: usize, len: usize },

    #[error("Invalid draft snapshot: {0}")]
    InvalidSnapshot(String),
}

/// A payload failed its field rules
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}.{field}: {message}")]
pub struct ValidationError {
    pub kind: EntityKind,
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(kind: EntityKind, field: &str, message: &str) -> Self {
        Self {
            kind,
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Failure reported by the persistence collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BackendError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound(_))
    }
}
