//! Record history reconstruction.
//!
//! [`RecordHistory`] replays a key's modification log into typed
//! [`HistoryEntry`] values, oldest first, in exactly the order the ledger
//! reports. It is lazy and single-use. The underlying ledger iterator is
//! closed exactly once: when the log is exhausted, on the first error, or
//! when the history is dropped part-way through.

use aml_ledger_store::{KeyHistoryIterator, KeyModification};
use aml_ledger_types::{AmlRecord, HistoryEntry};
use futures::Stream;
use tracing::{debug, trace};

use crate::{
    error::{LedgerError, LedgerResult},
    keys::RecordKey,
};

/// Lazy audit trail of one record key.
pub struct RecordHistory {
    key: RecordKey,
    /// `None` once the history has finished and released the iterator.
    iter: Option<Box<dyn KeyHistoryIterator>>,
    yielded: usize,
}

impl RecordHistory {
    /// Wrap an open ledger iterator. The history takes over closing it.
    pub fn new(key: RecordKey, iter: Box<dyn KeyHistoryIterator>) -> Self {
        Self { key, iter: Some(iter), yielded: 0 }
    }

    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    /// True once the log is exhausted or an error ended iteration.
    pub fn is_finished(&self) -> bool {
        self.iter.is_none()
    }

    /// Next entry, or `None` when the history is finished.
    ///
    /// After an error the history is finished and keeps returning `None`.
    pub async fn next_entry(&mut self) -> Option<LedgerResult<HistoryEntry>> {
        let next = self.iter.as_mut()?.next_modification().await;

        let result = match next {
            None => {
                debug!(key = %self.key, entries = self.yielded, "History exhausted");
                self.finish();
                return None;
            },
            Some(Err(e)) => Err(LedgerError::from(e)),
            Some(Ok(modification)) => to_entry(&self.key, modification),
        };

        match result {
            Ok(entry) => {
                self.yielded += 1;
                Some(Ok(entry))
            },
            Err(e) => {
                debug!(key = %self.key, error = %e, "History aborted");
                self.finish();
                Some(Err(e))
            },
        }
    }

    /// Drain the remaining entries, failing on the first error.
    pub async fn collect_entries(mut self) -> LedgerResult<Vec<HistoryEntry>> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next_entry().await {
            entries.push(entry?);
        }
        Ok(entries)
    }

    /// Expose the history as a stream.
    pub fn into_stream(self) -> impl Stream<Item = LedgerResult<HistoryEntry>> + Send {
        futures::stream::unfold(self, |mut history| async move {
            history.next_entry().await.map(|item| (item, history))
        })
    }

    fn finish(&mut self) {
        if let Some(mut iter) = self.iter.take() {
            iter.close();
        }
    }
}

impl Drop for RecordHistory {
    fn drop(&mut self) {
        self.finish();
    }
}

fn to_entry(key: &RecordKey, modification: KeyModification) -> LedgerResult<HistoryEntry> {
    let KeyModification { tx_id, value, timestamp, is_delete } = modification;

    let committed_at = timestamp.to_datetime().ok_or_else(|| LedgerError::Timestamp {
        key: key.clone(),
        seconds: timestamp.seconds,
        nanos: timestamp.nanos,
    })?;

    // An empty value marks a deletion; there is nothing to decode.
    if value.is_empty() {
        return Ok(HistoryEntry::tombstone(tx_id, committed_at));
    }

    let record: AmlRecord = serde_json::from_slice(&value)
        .map_err(|source| LedgerError::Decode { key: key.to_string(), source })?;
    trace!(tx_id = %tx_id, record = ?record, "Decoded history entry");

    Ok(HistoryEntry { tx_id, timestamp: committed_at, record: Some(record), is_delete })
}
