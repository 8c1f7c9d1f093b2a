//! In-memory revocation store

use crate::storage::{RevocationStore, StorageError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Concurrent in-memory revocation records
///
/// Suitable for single-process deployments and tests. Reads are lock-free
/// snapshots; writes are per-entry upserts.
#[derive(Debug, Default)]
pub struct MemoryRevocationStore {
    records: DashMap<String, u64>,
    /// Outage simulation switch for fail-mode drills
    fail_reads: AtomicBool,
}

impl MemoryRevocationStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Make subsequent reads fail, to exercise fail-open/closed handling
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn get(&self, client_token: &str) -> Result<Option<u64>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("simulated outage".to_string()));
        }

        Ok(self.records.get(client_token).map(|r| *r))
    }

    async fn set(&self, client_token: &str, revoked_before: u64) -> Result<(), StorageError> {
        // Monotonic upsert: never move a revocation backwards
        self.records
            .entry(client_token.to_string())
            .and_modify(|existing| *existing = (*existing).max(revoked_before))
            .or_insert(revoked_before);

        Ok(())
    }

    async fn clear(&self, client_token: &str) -> Result<(), StorageError> {
        self.records.remove(client_token);
        Ok(())
    }

    async fn prune(&self, before: u64) -> Result<u64, StorageError> {
        let initial = self.records.len();
        self.records.retain(|_, revoked_before| *revoked_before >= before);
        Ok((initial - self.records.len()) as u64)
    }
}
