//! Error types for record ledger operations.
//!
//! [`LedgerError`] wraps storage-level failures and adds the domain
//! conditions of the record layer. Every key-scoped variant carries the
//! key's components so a failure can be diagnosed without retrying.

use aml_ledger_types::{OrgId, StoreError};

use crate::keys::RecordKey;

/// Result type alias for record ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors that can occur during record ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// No organization could be resolved from the request identity.
    #[error("failed to resolve organization: {0}")]
    Identity(String),

    /// The caller's organization differs from the executing node's.
    #[error(
        "client from org {client_org} is not authorized to read or write private data from an org {node_org} peer"
    )]
    Authorization { client_org: OrgId, node_org: OrgId },

    #[error("the aml data already exists {key}")]
    AlreadyExists { key: RecordKey },

    #[error("the aml data does not exist {key}")]
    NotFound { key: RecordKey },

    /// Backend failure, including optimistic-concurrency conflicts.
    #[error("ledger store error: {0}")]
    Store(#[from] StoreError),

    /// The owner endorsement could not be attached to a new key.
    #[error("failed to set endorsement policy for {key}: {source}")]
    Policy {
        key: RecordKey,
        #[source]
        source: StoreError,
    },

    /// Stored bytes do not decode as a record. `key` is the storage key.
    #[error("failed to decode record at {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A history entry carries a timestamp outside the representable range.
    #[error("invalid timestamp in history of {key}: seconds={seconds}, nanos={nanos}")]
    Timestamp { key: RecordKey, seconds: i64, nanos: i32 },

    #[error("validation error: {0}")]
    Validation(String),
}

impl LedgerError {
    /// True if the ledger rejected the transaction for a stale read.
    ///
    /// Conflicts are surfaced, never retried here. The caller decides.
    pub fn is_conflict(&self) -> bool {
        matches!(self, LedgerError::Store(StoreError::Conflict { .. }))
    }
}
