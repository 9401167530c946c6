//! # AML Ledger Repository
//!
//! Record operations for a ledger shared by several organizations:
//!
//! - [`keys`]: composite key encoding that partitions records by owner
//! - [`identity`]: resolution of the acting organization from a request
//! - [`endorsement`]: owner-only write constraints on record keys
//! - [`record`]: exists, create, read, query, list, update and delete
//! - [`history`]: audit trail reconstruction from the ledger log
//! - [`seed`]: idempotent demo data
//!
//! All operations are generic over [`aml_ledger_store::StateBackend`].

#![deny(unsafe_code)]

pub mod endorsement;
pub mod error;
pub mod history;
pub mod identity;
pub mod keys;
pub mod record;
pub mod seed;

pub use error::{LedgerError, LedgerResult};
pub use history::RecordHistory;
pub use identity::{IdentitySource, RequestContext, resolve_acting_org};
pub use keys::{KeyScheme, RecordKey, build_key};
pub use record::{RecordRepository, RepositoryPolicy};
pub use seed::{SeedReport, demo_records};
