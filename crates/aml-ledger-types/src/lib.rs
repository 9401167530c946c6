//! # AML Ledger Types
//!
//! Shared type definitions for the AML record ledger.
//!
//! This crate holds the domain entities (records, organizations, history
//! entries) and the storage error type, so that the store, repository and
//! binary crates agree on a single source of truth without depending on
//! each other.

#![deny(unsafe_code)]

use thiserror::Error;

// ============================================================================
// Multi-Tenancy Types
// ============================================================================

pub mod org;

pub use org::OrgId;

// ============================================================================
// Core Domain Types
// ============================================================================

pub mod history;
pub mod record;

pub use history::HistoryEntry;
pub use record::{AmlRecord, RecordFields};

/// Identifier of a committed ledger transaction.
pub type TxId = String;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised by a ledger storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A key read by the transaction changed before it committed.
    #[error("Conflict: key {key} was modified by a concurrent transaction")]
    Conflict { key: String },

    /// The endorsing organization does not satisfy the key's write constraint.
    #[error("Endorsement policy failure for key {key}: endorsed by {endorser}")]
    EndorsementPolicyFailure { key: String, endorser: String },

    #[error("Invalid endorsement policy: {0}")]
    InvalidPolicy(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
