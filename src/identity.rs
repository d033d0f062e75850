//! Identity Allocator
//!
//! Hands out temporary identities for nodes created in the editor before
//! the store has assigned them a real one.

use crate::domain::{EntityKind, TempId};

/// Default namespace prefix of temporary identities
pub const DEFAULT_PREFIX: &str = "tmp";

/// Per-session generator of temporary identities.
///
/// Identities look like `tmp-question-1a2b3c4d-7`: prefix, kind namespace,
/// a session tag hashed from the seed and the clock, and a counter that
/// never repeats within the session.
#[derive(Debug, Clone)]
pub struct IdentityAllocator {
    prefix: String,
    session: String,
    counter: u64,
}

impl IdentityAllocator {
    pub fn new(seed: &str) -> Self {
        Self::with_prefix(DEFAULT_PREFIX, seed)
    }

    /// Use a custom prefix. Numeric prefixes fall back to the default so a
    /// temporary identity can never parse as a real one.
    pub fn with_prefix(prefix: &str, seed: &str) -> Self {
        let prefix = if prefix.is_empty() || prefix.chars().all(|c| c.is_ascii_digit()) {
            log::warn!("Rejected temporary id prefix {:?}, using {:?}", prefix, DEFAULT_PREFIX);
            DEFAULT_PREFIX.to_string()
        } else {
            prefix.to_string()
        };

        let mut hasher = blake3::Hasher::new();
        hasher.update(seed.as_bytes());
        hasher.update(&chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
        hasher.update(&std::process::id().to_le_bytes());
        let session = hasher.finalize().to_hex()[..8].to_string();

        Self {
            prefix,
            session,
            counter: 0,
        }
    }

    pub fn allocate(&mut self, kind: EntityKind) -> TempId {
        self.counter += 1;
        TempId::new(format!(
            "{}-{}-{}-{}",
            self.prefix,
            kind.as_str(),
            self.session,
            self.counter
        ))
    }

    /// Number of identities handed out so far
    pub fn issued(&self) -> u64 {
        self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identities_are_unique_and_namespaced() {
        let mut allocator = IdentityAllocator::new("draft-1");
        let mut seen = HashSet::new();
        for kind in EntityKind::ALL {
            for _ in 0..50 {
                let id = allocator.allocate(kind);
                assert!(id.as_str().starts_with(&format!("tmp-{}-", kind.as_str())));
                assert!(seen.insert(id));
            }
        }
        assert_eq!(allocator.issued(), 300);
    }

    #[test]
    fn test_identity_is_never_numeric() {
        let mut allocator = IdentityAllocator::with_prefix("42", "draft-1");
        let id = allocator.allocate(EntityKind::Lesson);
        assert!(id.as_str().parse::<i64>().is_err());
        assert!(id.as_str().starts_with("tmp-lesson-"));
    }

    #[test]
    fn test_custom_prefix() {
        let mut allocator = IdentityAllocator::with_prefix("draft", "seed");
        let id = allocator.allocate(EntityKind::VocabItem);
        assert!(id.as_str().starts_with("draft-vocab-item-"));
    }
}
