//! # AML Ledger
//!
//! Startup wiring and commands of the `aml-ledger` binary.

#![deny(unsafe_code)]

pub mod commands;
pub mod initialization;
