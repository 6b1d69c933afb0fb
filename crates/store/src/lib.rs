//! Storage boundary for the CloneGuard index structures.
//!
//! The cascade never talks to a concrete database; it is handed a
//! [`FeatureStore`] capability at construction. Production wires this to a
//! shared key-value/set store with read-after-write visibility per key; tests
//! and single-node deployments use the bundled [`MemoryStore`].

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use thiserror::Error;

/// Errors surfaced by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend is unreachable or rejected the operation.
    #[error("store backend error: {0}")]
    Backend(String),
    /// A stored value could not be decoded by the caller.
    #[error("corrupt stored value for key {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        StoreError::Backend(msg.into())
    }
}

/// Key-value and set storage used by the index and feature caches.
///
/// Contract (mirrors the storage collaborator boundary):
/// - `put` is idempotent and immediately visible to subsequent `get` calls on
///   the same key (read-after-write).
/// - `set_add` is atomic and idempotent; concurrent adds to the same set must
///   not corrupt it or drop members.
/// - No transactional guarantee is required across keys.
///
/// Every call is a potential suspension point (network-backed in production),
/// so callers must not hold exclusive locks across an await.
#[async_trait]
pub trait FeatureStore: Send + Sync {
    /// Fetch an opaque value by key.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store an opaque value under a key, replacing any previous value.
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Add a member to a set, creating the set if absent. Idempotent.
    async fn set_add(&self, set_key: &str, member: &str) -> Result<(), StoreError>;

    /// All members of a set; empty when the set does not exist.
    ///
    /// Implementations should return a stable ordering where practical so
    /// downstream results stay reproducible.
    async fn set_members(&self, set_key: &str) -> Result<Vec<String>, StoreError>;
}

/// Concurrent in-memory store.
///
/// Sets are sharded `DashSet`s, so `set_add` is an atomic insert rather than
/// a read-modify-write under an external lock. `set_members` returns members
/// sorted lexicographically.
#[derive(Default)]
pub struct MemoryStore {
    values: DashMap<String, Vec<u8>>,
    sets: DashMap<String, DashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeatureStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.values.get(key).map(|v| v.value().clone()))
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn set_add(&self, set_key: &str, member: &str) -> Result<(), StoreError> {
        self.sets
            .entry(set_key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn set_members(&self, set_key: &str) -> Result<Vec<String>, StoreError> {
        let mut members: Vec<String> = match self.sets.get(set_key) {
            Some(set) => set.iter().map(|m| m.key().clone()).collect(),
            None => Vec::new(),
        };
        members.sort();
        Ok(members)
    }
}
