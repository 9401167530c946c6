//! Test fixtures for AML ledger test suites
//!
//! Shared builders for records and request contexts, pre-seeded ledgers,
//! proptest strategies and the proptest case configuration.

#![deny(unsafe_code)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod ledger;
pub mod proptest_config;
pub mod records;

pub use ledger::{ORGS, repository_for, seeded_ledger};
pub use records::{arb_key_field, fields, lee_tom, local, via_peer};
