//! Reconstructed history entries
//!
//! A [`HistoryEntry`] is a read-only view of one version in a key's change
//! log. Entries are derived from the ledger's append-only log on demand and
//! are never persisted themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AmlRecord, TxId};

/// One version of a record key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Transaction that produced this version.
    #[serde(rename = "txId")]
    pub tx_id: TxId,

    /// Commit time of the transaction.
    pub timestamp: DateTime<Utc>,

    /// Record snapshot at this version, `None` for deletions.
    #[serde(default)]
    pub record: Option<AmlRecord>,

    /// True when this version removed the key.
    #[serde(rename = "isDelete")]
    pub is_delete: bool,
}

impl HistoryEntry {
    /// Tombstone entry for a version that deleted the key.
    pub fn tombstone(tx_id: TxId, timestamp: DateTime<Utc>) -> Self {
        Self { tx_id, timestamp, record: None, is_delete: true }
    }
}
