//! Idempotency key store for safely retryable actions.
//!
//! Network retries must not double-move a unit or double-apply damage, so
//! every committed action records its result under a client-supplied token.
//! The store contract is insert-if-absent: the first writer wins and a
//! replay always sees the originally committed result. Record expiry is the
//! backing store's concern (the durable SQLite store purges by age).

use crate::engine::ActionResult;
use std::collections::HashMap;

/// Build the composite idempotency key for one action.
///
/// Shape: `{action-kind}:{game-id}:{token}`.
pub fn action_key(kind: &str, game_id: &str, token: &str) -> String {
    format!("{}:{}:{}", kind, game_id, token)
}

/// Key-value store for previously committed action results.
pub trait IdempotencyStore {
    /// Look up the result recorded for a key, if any.
    fn try_get(&self, key: &str) -> Option<ActionResult>;

    /// Record a result if the key is absent.
    ///
    /// Returns `true` if the record was inserted, `false` if a previous
    /// record already existed (which is then left untouched).
    fn put(&mut self, key: &str, result: &ActionResult) -> bool;
}

/// In-memory idempotency store for tests and single-process deployments.
#[derive(Clone, Debug, Default)]
pub struct MemoryIdempotencyStore {
    entries: HashMap<String, ActionResult>,
}

impl MemoryIdempotencyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded results.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IdempotencyStore for MemoryIdempotencyStore {
    fn try_get(&self, key: &str) -> Option<ActionResult> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, result: &ActionResult) -> bool {
        use std::collections::hash_map::Entry;
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(result.clone());
                true
            }
        }
    }
}
