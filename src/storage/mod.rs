//! Revocation record storage
//!
//! The only shared mutable state in the subsystem. A record maps a client
//! token to a revoked-before timestamp: any credential for that token issued
//! at or before the timestamp is dead, regardless of its stated expiry.
//!
//! - Memory: lock-free concurrent map for embedding and tests
//! - Postgres: durable store shared across verifier instances

mod memory;
mod postgres;

pub use memory::MemoryRevocationStore;
pub use postgres::{PostgresConfig, PostgresStore};

pub use async_trait::async_trait;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Trait for revocation record storage
///
/// Writers never lock out readers: `set` is a single atomic upsert and reads
/// are snapshots. Eventual consistency across distributed instances is
/// acceptable; once a revocation is observed, denial is permanent for
/// credentials issued before the recorded time.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Get the revoked-before timestamp for a client token, if any
    async fn get(&self, client_token: &str) -> Result<Option<u64>, StorageError>;

    /// Record a revocation. Upserts monotonically: an existing later
    /// timestamp is never moved backwards.
    async fn set(&self, client_token: &str, revoked_before: u64) -> Result<(), StorageError>;

    /// Explicitly clear a record
    async fn clear(&self, client_token: &str) -> Result<(), StorageError>;

    /// Age out records older than `before` (unix seconds)
    ///
    /// Safe once `before` trails the current time by more than the longest
    /// credential TTL: such records can no longer affect any live
    /// credential. Returns the number of records removed.
    async fn prune(&self, before: u64) -> Result<u64, StorageError>;
}
