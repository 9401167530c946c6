//! # AML Ledger Observe - Logging
//!
//! Structured logging setup for the ledger binary and span helpers for
//! the commands it runs.

#![deny(unsafe_code)]

pub mod logging;

pub use logging::{
    LogConfig, LogFormat, command_span, init_logging, log_slow_command, record_command_result,
};
