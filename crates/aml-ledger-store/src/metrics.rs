//! Ledger operation metrics

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

/// Latency and outcome counters for one class of ledger operation.
#[derive(Debug, Default)]
struct OpCounters {
    count: AtomicU64,
    latency_us: AtomicU64,
    errors: AtomicU64,
}

impl OpCounters {
    fn record(&self, duration: Duration, error: bool) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.latency_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        if error {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> OpSnapshot {
        let count = self.count.load(Ordering::Relaxed);
        let latency_us = self.latency_us.load(Ordering::Relaxed);
        OpSnapshot {
            count,
            avg_latency_us: if count > 0 { latency_us / count } else { 0 },
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
        self.latency_us.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }
}

/// Ledger operation metrics
#[derive(Debug, Default)]
pub struct StoreMetrics {
    reads: OpCounters,
    queries: OpCounters,
    commits: OpCounters,
    history_opens: OpCounters,

    // Commit rejections, by cause
    conflicts: AtomicU64,
    endorsement_failures: AtomicU64,

    // Written keys, by kind
    keys_written: AtomicU64,
    keys_deleted: AtomicU64,

    // Key space
    live_keys: AtomicU64,
    live_bytes: AtomicU64,
}

impl StoreMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a point read or range scan
    pub fn record_read(&self, duration: Duration, error: bool) {
        self.reads.record(duration, error);
    }

    /// Record a rich query
    pub fn record_query(&self, duration: Duration, error: bool) {
        self.queries.record(duration, error);
    }

    /// Record a commit attempt
    pub fn record_commit(&self, duration: Duration, error: bool) {
        self.commits.record(duration, error);
    }

    /// Record a history iterator open
    pub fn record_history_open(&self, duration: Duration, error: bool) {
        self.history_opens.record(duration, error);
    }

    pub fn record_conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_endorsement_failure(&self) {
        self.endorsement_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the keys applied by a successful commit
    pub fn record_applied(&self, written: u64, deleted: u64) {
        self.keys_written.fetch_add(written, Ordering::Relaxed);
        self.keys_deleted.fetch_add(deleted, Ordering::Relaxed);
    }

    /// Update key space metrics
    pub fn update_key_space(&self, keys: u64, bytes: u64) {
        self.live_keys.store(keys, Ordering::Relaxed);
        self.live_bytes.store(bytes, Ordering::Relaxed);
    }

    /// Get metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reads: self.reads.snapshot(),
            queries: self.queries.snapshot(),
            commits: self.commits.snapshot(),
            history_opens: self.history_opens.snapshot(),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            endorsement_failures: self.endorsement_failures.load(Ordering::Relaxed),
            keys_written: self.keys_written.load(Ordering::Relaxed),
            keys_deleted: self.keys_deleted.load(Ordering::Relaxed),
            live_keys: self.live_keys.load(Ordering::Relaxed),
            live_bytes: self.live_bytes.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters. Key space gauges are left as they are.
    pub fn reset(&self) {
        self.reads.reset();
        self.queries.reset();
        self.commits.reset();
        self.history_opens.reset();
        self.conflicts.store(0, Ordering::Relaxed);
        self.endorsement_failures.store(0, Ordering::Relaxed);
        self.keys_written.store(0, Ordering::Relaxed);
        self.keys_deleted.store(0, Ordering::Relaxed);
    }
}

/// Counters for one operation class at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpSnapshot {
    pub count: u64,
    pub avg_latency_us: u64,
    pub errors: u64,
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub reads: OpSnapshot,
    pub queries: OpSnapshot,
    pub commits: OpSnapshot,
    pub history_opens: OpSnapshot,
    pub conflicts: u64,
    pub endorsement_failures: u64,
    pub keys_written: u64,
    pub keys_deleted: u64,
    pub live_keys: u64,
    pub live_bytes: u64,
}

/// Helper to measure operation duration
pub struct OpTimer {
    start: Instant,
}

impl OpTimer {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for OpTimer {
    fn default() -> Self {
        Self::new()
    }
}
