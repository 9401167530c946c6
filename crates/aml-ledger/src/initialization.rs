//! Startup wiring
//!
//! Turns a loaded [`Config`] into the logging setup and a ready repository.
//!
//! # Initialization Flow
//!
//! 1. Map the `store`, `policy` and `endorsement` sections onto a
//!    [`RepositoryPolicy`]
//! 2. Open an in-memory ledger whose endorsing peer is the node organization
//! 3. Seed the demo records when `store.seed_on_start` is set
//!
//! Seeding skips records that already exist, so it is safe on every start.

use aml_ledger_config::{Config, KeySchemeSetting};
use aml_ledger_observe::{LogConfig, LogFormat};
use aml_ledger_repository::{KeyScheme, RecordRepository, RepositoryPolicy, demo_records};
use aml_ledger_store::MemoryLedger;
use aml_ledger_types::OrgId;
use anyhow::{Context, Result};

/// Key scheme selected by a config value.
pub fn key_scheme(setting: KeySchemeSetting) -> KeyScheme {
    match setting {
        KeySchemeSetting::LengthPrefixed => KeyScheme::LengthPrefixed,
        KeySchemeSetting::Legacy => KeyScheme::Legacy,
    }
}

/// Repository policy described by `config`.
pub fn repository_policy(config: &Config) -> RepositoryPolicy {
    RepositoryPolicy::builder()
        .key_scheme(key_scheme(config.store.key_scheme))
        .verify_node_on_create(config.policy.verify_node_on_create)
        .verify_node_on_update(config.policy.verify_node_on_update)
        .verify_node_on_delete(config.policy.verify_node_on_delete)
        .verify_node_on_read(config.policy.verify_node_on_read)
        .clear_constraint_on_delete(config.endorsement.clear_on_delete)
        .build()
}

/// Logging setup for `config`.
///
/// `RUST_LOG`, when set, takes precedence over the configured level.
pub fn log_config(config: &Config) -> Result<LogConfig> {
    let format = match &config.log_format {
        Some(format) => format.parse::<LogFormat>()?,
        None => LogFormat::default(),
    };
    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => None,
        Err(_) => Some(config.logging.to_lowercase()),
    };

    Ok(LogConfig { format, filter, ..LogConfig::default() })
}

/// Open the ledger as seen from a node of `node_org`.
///
/// # Errors
///
/// Returns an error if seeding fails.
pub async fn initialize_ledger(
    config: &Config,
    node_org: &OrgId,
) -> Result<RecordRepository<MemoryLedger>> {
    let ledger = MemoryLedger::new(node_org.clone());
    let repository = RecordRepository::with_policy(ledger, repository_policy(config));

    if config.store.seed_on_start {
        let report =
            repository.seed(&demo_records()).await.context("Failed to seed demo records")?;
        tracing::info!(created = report.created, skipped = report.skipped, "Ledger seeded");
    } else {
        tracing::debug!("Starting with an empty ledger");
    }

    Ok(repository)
}
