//! In-memory ledger for testing and development
//!
//! [`MemoryLedger`] models the parts of a permissioned ledger that the
//! record layer depends on:
//!
//! - Optimistic transactions. Reads record the key version they observed,
//!   and commit fails with [`StoreError::Conflict`] if any of those keys
//!   moved on.
//! - Key-level write constraints. A committed constraint must list the
//!   submitting peer's organization for any later write to the key.
//!   Constraints are key metadata and outlive deletion of the value.
//! - An append-only modification log per key, with one entry per commit
//!   that touched the key.
//!
//! Cloning a ledger (or calling [`MemoryLedger::peer`]) yields another
//! handle onto the same state.

use std::{
    collections::{BTreeMap, HashMap, HashSet, VecDeque},
    ops::Range,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use aml_ledger_types::{OrgId, StoreError, StoreResult, TxId};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::{
    EndorsementPolicy, KeyHistoryIterator, KeyModification, KeyValue, LedgerTimestamp,
    LedgerTransaction, StateBackend,
    metrics::{OpTimer, StoreMetrics},
    query::Selector,
};

/// Failures the ledger can be told to produce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerFaults {
    /// Refuse every `set_write_constraint` call.
    pub reject_constraints: bool,
    /// Fail point reads, range scans, queries and history opens.
    pub fail_reads: bool,
    /// History iterators fail after yielding this many entries.
    pub fail_history_after: Option<usize>,
}

#[derive(Debug, Default)]
struct LedgerState {
    values: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Per-key write counter. Entries survive deletion so that a
    /// delete-then-recreate still invalidates earlier reads.
    versions: HashMap<Vec<u8>, u64>,
    constraints: HashMap<Vec<u8>, Vec<u8>>,
    history: HashMap<Vec<u8>, Vec<KeyModification>>,
    /// Sum of key and value lengths over `values`.
    live_bytes: usize,
    height: u64,
    faults: LedgerFaults,
}

impl LedgerState {
    fn version(&self, key: &[u8]) -> u64 {
        self.versions.get(key).copied().unwrap_or(0)
    }

    fn check_reads(&self) -> StoreResult<()> {
        if self.faults.fail_reads {
            return Err(StoreError::Database("injected read failure".to_string()));
        }
        Ok(())
    }
}

/// In-memory ledger implementation.
#[derive(Debug, Clone)]
pub struct MemoryLedger {
    state: Arc<RwLock<LedgerState>>,
    endorser: OrgId,
    metrics: Arc<StoreMetrics>,
    open_iterators: Arc<AtomicUsize>,
}

impl MemoryLedger {
    /// Create an empty ledger whose transactions are endorsed by `endorser`.
    pub fn new(endorser: impl Into<OrgId>) -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState::default())),
            endorser: endorser.into(),
            metrics: Arc::new(StoreMetrics::new()),
            open_iterators: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A handle onto the same ledger that submits through a peer of `org`.
    pub fn peer(&self, org: impl Into<OrgId>) -> Self {
        Self { endorser: org.into(), ..self.clone() }
    }

    /// Organization endorsing transactions submitted through this handle.
    pub fn endorser(&self) -> &OrgId {
        &self.endorser
    }

    pub fn metrics(&self) -> &Arc<StoreMetrics> {
        &self.metrics
    }

    /// Number of history iterators opened and not yet closed.
    pub fn open_iterators(&self) -> usize {
        self.open_iterators.load(Ordering::SeqCst)
    }

    /// Number of committed transactions.
    pub async fn height(&self) -> u64 {
        self.state.read().await.height
    }

    /// Replace the injected faults.
    pub async fn set_faults(&self, faults: LedgerFaults) {
        self.state.write().await.faults = faults;
    }
}

#[async_trait]
impl StateBackend for MemoryLedger {
    async fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let timer = OpTimer::new();
        let state = self.state.read().await;
        let result = state.check_reads().map(|()| state.values.get(key).cloned());
        self.metrics.record_read(timer.elapsed(), result.is_err());
        result
    }

    async fn get_range(&self, range: Range<Vec<u8>>) -> StoreResult<Vec<KeyValue>> {
        let timer = OpTimer::new();
        let state = self.state.read().await;
        let result = state.check_reads().map(|()| {
            if range.start > range.end {
                return Vec::new();
            }
            state
                .values
                .range(range)
                .map(|(k, v)| KeyValue::new(k.clone(), v.clone()))
                .collect()
        });
        self.metrics.record_read(timer.elapsed(), result.is_err());
        result
    }

    async fn query(&self, query: &str) -> StoreResult<Vec<KeyValue>> {
        let timer = OpTimer::new();
        let result = async {
            let selector = Selector::parse(query)?;
            let state = self.state.read().await;
            state.check_reads()?;
            Ok::<_, StoreError>(
                state
                    .values
                    .iter()
                    .filter(|(_, v)| selector.matches_bytes(v))
                    .map(|(k, v)| KeyValue::new(k.clone(), v.clone()))
                    .collect::<Vec<_>>(),
            )
        }
        .await;
        self.metrics.record_query(timer.elapsed(), result.is_err());
        result
    }

    async fn write_constraint(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let state = self.state.read().await;
        state.check_reads()?;
        Ok(state.constraints.get(key).cloned())
    }

    async fn history_for_key(&self, key: &[u8]) -> StoreResult<Box<dyn KeyHistoryIterator>> {
        let timer = OpTimer::new();
        let state = self.state.read().await;
        if let Err(e) = state.check_reads() {
            self.metrics.record_history_open(timer.elapsed(), true);
            return Err(e);
        }

        let entries: VecDeque<KeyModification> =
            state.history.get(key).cloned().unwrap_or_default().into();
        self.open_iterators.fetch_add(1, Ordering::SeqCst);
        self.metrics.record_history_open(timer.elapsed(), false);

        Ok(Box::new(MemoryHistoryIterator {
            entries,
            yielded: 0,
            fail_after: state.faults.fail_history_after,
            open: Some(Arc::clone(&self.open_iterators)),
        }))
    }

    async fn transaction(&self) -> StoreResult<Box<dyn LedgerTransaction>> {
        Ok(Box::new(MemoryTransaction {
            ledger: self.clone(),
            reads: HashMap::new(),
            writes: BTreeMap::new(),
            constraint_ops: BTreeMap::new(),
        }))
    }
}

/// Transaction staged against a [`MemoryLedger`].
struct MemoryTransaction {
    ledger: MemoryLedger,
    /// Version of each key as first observed by this transaction.
    reads: HashMap<Vec<u8>, u64>,
    /// `None` stages a deletion.
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    /// `None` stages removal of the constraint.
    constraint_ops: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl MemoryTransaction {
    fn validate(&self, state: &LedgerState) -> StoreResult<()> {
        for (key, observed) in &self.reads {
            if state.version(key) != *observed {
                return Err(StoreError::Conflict { key: String::from_utf8_lossy(key).into_owned() });
            }
        }

        let touched: HashSet<&Vec<u8>> =
            self.writes.keys().chain(self.constraint_ops.keys()).collect();
        for key in touched {
            let Some(bytes) = state.constraints.get(key) else {
                continue;
            };
            let policy = EndorsementPolicy::from_bytes(bytes)?;
            if !policy.is_satisfied_by(std::slice::from_ref(&self.ledger.endorser)) {
                return Err(StoreError::EndorsementPolicyFailure {
                    key: String::from_utf8_lossy(key).into_owned(),
                    endorser: self.ledger.endorser.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerTransaction for MemoryTransaction {
    async fn get(&mut self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let timer = OpTimer::new();
        let state = self.ledger.state.read().await;
        let result = state.check_reads().map(|()| {
            self.reads.entry(key.to_vec()).or_insert_with(|| state.version(key));
            state.values.get(key).cloned()
        });
        self.ledger.metrics.record_read(timer.elapsed(), result.is_err());
        result
    }

    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, Some(value));
    }

    fn delete(&mut self, key: Vec<u8>) {
        self.writes.insert(key, None);
    }

    async fn set_write_constraint(&mut self, key: &[u8], policy: Vec<u8>) -> StoreResult<()> {
        let state = self.ledger.state.read().await;
        if state.faults.reject_constraints {
            return Err(StoreError::InvalidPolicy("ledger refused write constraint".to_string()));
        }
        EndorsementPolicy::from_bytes(&policy)?;

        let has_value = match self.writes.get(key) {
            Some(staged) => staged.is_some(),
            None => state.values.contains_key(key),
        };
        if !has_value {
            return Err(StoreError::InvalidPolicy(format!(
                "cannot constrain key {} with no value",
                String::from_utf8_lossy(key)
            )));
        }

        self.constraint_ops.insert(key.to_vec(), Some(policy));
        Ok(())
    }

    fn clear_write_constraint(&mut self, key: &[u8]) {
        self.constraint_ops.insert(key.to_vec(), None);
    }

    async fn commit(self: Box<Self>) -> StoreResult<TxId> {
        let timer = OpTimer::new();
        let this = *self;
        let metrics = Arc::clone(&this.ledger.metrics);
        let mut state = this.ledger.state.write().await;

        if let Err(e) = this.validate(&state) {
            match &e {
                StoreError::Conflict { .. } => metrics.record_conflict(),
                StoreError::EndorsementPolicyFailure { .. } => {
                    metrics.record_endorsement_failure()
                },
                _ => {},
            }
            debug!(error = %e, endorser = %this.ledger.endorser, "Transaction rejected");
            metrics.record_commit(timer.elapsed(), true);
            return Err(e);
        }

        let tx_id = Uuid::new_v4().to_string();
        let timestamp = LedgerTimestamp::now();
        state.height += 1;

        let (mut written, mut deleted) = (0, 0);
        for (key, op) in this.writes {
            *state.versions.entry(key.clone()).or_insert(0) += 1;
            let modification = match op {
                Some(value) => {
                    written += 1;
                    state.live_bytes += key.len() + value.len();
                    if let Some(old) = state.values.insert(key.clone(), value.clone()) {
                        state.live_bytes -= key.len() + old.len();
                    }
                    KeyModification { tx_id: tx_id.clone(), value, timestamp, is_delete: false }
                },
                None => {
                    deleted += 1;
                    if let Some(old) = state.values.remove(&key) {
                        state.live_bytes -= key.len() + old.len();
                    }
                    KeyModification {
                        tx_id: tx_id.clone(),
                        value: Vec::new(),
                        timestamp,
                        is_delete: true,
                    }
                },
            };
            state.history.entry(key).or_default().push(modification);
        }

        for (key, op) in this.constraint_ops {
            match op {
                Some(policy) => state.constraints.insert(key, policy),
                None => state.constraints.remove(&key),
            };
        }

        metrics.update_key_space(state.values.len() as u64, state.live_bytes as u64);
        metrics.record_applied(written, deleted);
        metrics.record_commit(timer.elapsed(), false);
        debug!(tx_id = %tx_id, height = state.height, written, deleted, "Transaction committed");

        Ok(tx_id)
    }
}

/// Iterator over a snapshot of one key's modification log.
struct MemoryHistoryIterator {
    entries: VecDeque<KeyModification>,
    yielded: usize,
    fail_after: Option<usize>,
    /// Open-iterator counter, taken on close.
    open: Option<Arc<AtomicUsize>>,
}

#[async_trait]
impl KeyHistoryIterator for MemoryHistoryIterator {
    async fn next_modification(&mut self) -> Option<StoreResult<KeyModification>> {
        self.open.as_ref()?;
        if self.fail_after.is_some_and(|n| self.yielded >= n) {
            return Some(Err(StoreError::Database("injected history failure".to_string())));
        }
        let entry = self.entries.pop_front()?;
        self.yielded += 1;
        Some(Ok(entry))
    }

    fn close(&mut self) {
        if let Some(counter) = self.open.take() {
            counter.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
