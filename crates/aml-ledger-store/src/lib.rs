//! # AML Ledger Store - Ledger Abstraction Layer
//!
//! Trait definitions for the versioned, append-only key-value ledger that
//! holds AML records, plus an in-memory implementation.
//!
//! The ledger itself (consensus, durability, linearizable per-key
//! versioning) is an external collaborator. This crate only describes the
//! capabilities the record layer consumes:
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │              aml-ledger-repository               │
//! │     (keys, identity, endorsement, history)       │
//! ├──────────────────────────────────────────────────┤
//! │                 StateBackend                     │
//! │  get, get_range, query, history_for_key,         │
//! │  write_constraint, transaction                   │
//! ├──────────────────────────────────────────────────┤
//! │   MemoryLedger  │  (any external ledger client)  │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Writes go through a [`LedgerTransaction`]: every key read inside the
//! transaction joins its read set, and commit fails with
//! [`StoreError::Conflict`] if any of those keys changed in the meantime.

#![deny(unsafe_code)]

use std::ops::Range;

use aml_ledger_types::{StoreError, StoreResult, TxId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod endorsement;
pub mod memory;
pub mod metrics;
pub mod query;

pub use endorsement::{EndorsementPolicy, RoleType};
pub use memory::{LedgerFaults, MemoryLedger};
pub use metrics::{MetricsSnapshot, OpTimer, StoreMetrics};

/// A key and its current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl KeyValue {
    pub fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self { key, value }
    }

    /// Key rendered for diagnostics.
    pub fn key_lossy(&self) -> String {
        String::from_utf8_lossy(&self.key).into_owned()
    }
}

/// The ledger's native commit timestamp.
///
/// Mirrors the protobuf well-known `Timestamp`: seconds since the Unix
/// epoch plus a non-negative nanosecond offset below one second. Values
/// outside that range can arrive from a remote ledger and are rejected
/// on conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LedgerTimestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl LedgerTimestamp {
    pub fn new(seconds: i64, nanos: i32) -> Self {
        Self { seconds, nanos }
    }

    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    /// Convert to a UTC datetime, or `None` if the value is out of range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        if !(0..1_000_000_000).contains(&self.nanos) {
            return None;
        }
        DateTime::<Utc>::from_timestamp(self.seconds, self.nanos as u32)
    }
}

impl From<DateTime<Utc>> for LedgerTimestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self { seconds: value.timestamp(), nanos: value.timestamp_subsec_nanos() as i32 }
    }
}

/// One entry of a key's append-only modification log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyModification {
    pub tx_id: TxId,
    /// Value written by the transaction; empty for deletions.
    pub value: Vec<u8>,
    pub timestamp: LedgerTimestamp,
    pub is_delete: bool,
}

/// Single-use iterator over a key's modification log, oldest first.
///
/// The iterator holds ledger-side resources until [`close`](Self::close)
/// is called. Callers must close it on every exit path.
#[async_trait]
pub trait KeyHistoryIterator: Send {
    /// Next modification, or `None` once the log is exhausted.
    async fn next_modification(&mut self) -> Option<StoreResult<KeyModification>>;

    /// Release the iterator. Calling it more than once is a no-op.
    fn close(&mut self);
}

/// A unit of work against the ledger.
///
/// Reads return committed state (a transaction does not see its own
/// staged writes) and record the version they observed. Staged writes
/// and constraint changes become visible atomically on [`commit`](Self::commit).
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Read a committed value and add the key to the read set.
    async fn get(&mut self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Stage a write.
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>);

    /// Stage a deletion.
    fn delete(&mut self, key: Vec<u8>);

    /// Stage a write constraint (encoded [`EndorsementPolicy`]) on a key.
    ///
    /// The key must hold a value, either committed or staged in this
    /// transaction.
    async fn set_write_constraint(&mut self, key: &[u8], policy: Vec<u8>) -> StoreResult<()>;

    /// Stage removal of a key's write constraint.
    fn clear_write_constraint(&mut self, key: &[u8]);

    /// Validate and apply the transaction, returning its id.
    async fn commit(self: Box<Self>) -> StoreResult<TxId>;
}

/// The versioned key-value ledger consumed by the record layer.
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Current value of a key.
    async fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Current values of all keys in `range`, in key order.
    async fn get_range(&self, range: Range<Vec<u8>>) -> StoreResult<Vec<KeyValue>>;

    /// Run a rich query. The query string is opaque to callers.
    async fn query(&self, query: &str) -> StoreResult<Vec<KeyValue>>;

    /// Committed write constraint of a key, if any.
    async fn write_constraint(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Open the modification log of a key.
    async fn history_for_key(&self, key: &[u8]) -> StoreResult<Box<dyn KeyHistoryIterator>>;

    /// Begin a transaction.
    async fn transaction(&self) -> StoreResult<Box<dyn LedgerTransaction>>;

    /// Write a single value in its own transaction.
    async fn put(&self, key: Vec<u8>, value: Vec<u8>) -> StoreResult<TxId> {
        let mut txn = self.transaction().await?;
        txn.put(key, value);
        txn.commit().await
    }

    /// Delete a single key in its own transaction.
    async fn delete(&self, key: Vec<u8>) -> StoreResult<TxId> {
        let mut txn = self.transaction().await?;
        txn.delete(key);
        txn.commit().await
    }
}

/// Smallest key strictly greater than every key starting with `prefix`.
///
/// Returns `None` when no such key exists (empty prefix or all `0xFF`).
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// Range covering every key that starts with `prefix`.
pub fn prefix_range(prefix: &[u8]) -> StoreResult<Range<Vec<u8>>> {
    let end = prefix_end(prefix)
        .ok_or_else(|| StoreError::Internal("prefix has no upper bound".to_string()))?;
    Ok(prefix.to_vec()..end)
}
