//! # AML Ledger Config - Configuration Management
//!
//! Handles configuration loading from files and environment variables.
//!
//! The configuration file holds a `ledger:` section, so the ledger can share
//! one document with other services:
//!
//! ```yaml
//! ledger:
//!   logging: "info"
//!   log_format: "json"
//!   store:
//!     key_scheme: "length_prefixed"
//!     seed_on_start: true
//!   policy:
//!     verify_node_on_create: true
//!     verify_node_on_update: true
//!     verify_node_on_delete: true
//!   endorsement:
//!     clear_on_delete: false
//! ```
//!
//! Sections other than `ledger:` are ignored.

pub mod validation;

use std::path::Path;

use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Root configuration wrapper.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RootConfig {
    #[serde(default)]
    pub ledger: Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_logging")]
    pub logging: String,

    /// Log output format (pretty, compact, json). Unset picks the build default.
    #[serde(default)]
    pub log_format: Option<String>,

    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub endorsement: EndorsementConfig,
}

fn default_logging() -> String {
    "info".to_string()
}

/// Layout of record keys in the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySchemeSetting {
    #[default]
    LengthPrefixed,
    /// `{country}_{id_number}_{data_owner}`, for ledgers written with that layout
    Legacy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub key_scheme: KeySchemeSetting,

    /// Write the demo records when the ledger starts
    #[serde(default = "default_seed_on_start")]
    pub seed_on_start: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { key_scheme: KeySchemeSetting::default(), seed_on_start: default_seed_on_start() }
    }
}

fn default_seed_on_start() -> bool {
    true
}

/// Operations that require the executing node to belong to the caller's
/// organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_verify_on_write")]
    pub verify_node_on_create: bool,
    #[serde(default = "default_verify_on_write")]
    pub verify_node_on_update: bool,
    #[serde(default = "default_verify_on_write")]
    pub verify_node_on_delete: bool,
    #[serde(default)]
    pub verify_node_on_read: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            verify_node_on_create: default_verify_on_write(),
            verify_node_on_update: default_verify_on_write(),
            verify_node_on_delete: default_verify_on_write(),
            verify_node_on_read: false,
        }
    }
}

fn default_verify_on_write() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndorsementConfig {
    /// Drop the owner constraint together with the record. When false the
    /// constraint outlives the record and only the owner can recreate it.
    #[serde(default)]
    pub clear_on_delete: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: default_logging(),
            log_format: None,
            store: StoreConfig::default(),
            policy: PolicyConfig::default(),
            endorsement: EndorsementConfig::default(),
        }
    }
}

impl Config {
    /// Log relaxed or restricted settings that change observable behavior.
    pub fn warn_on_risky_settings(&self) {
        if !self.policy.verify_node_on_create {
            tracing::warn!(
                "policy.verify_node_on_create is disabled. A caller can create records \
                 through another organization's node, which then cannot satisfy the \
                 owner constraint on later writes."
            );
        }

        for (name, enabled) in [
            ("verify_node_on_update", self.policy.verify_node_on_update),
            ("verify_node_on_delete", self.policy.verify_node_on_delete),
        ] {
            if !enabled {
                tracing::warn!(
                    "policy.{name} is disabled. Writes through another organization's node \
                     are only refused by the ledger at commit."
                );
            }
        }

        if self.store.key_scheme == KeySchemeSetting::Legacy {
            tracing::warn!(
                "store.key_scheme is legacy. Keys with '_' in a field can collide and \
                 listing by country is unavailable."
            );
        }
    }
}

/// Load configuration with layered precedence: defaults → file → env vars
///
/// Each layer only overrides properties that are explicitly set.
///
/// Environment variables use the `AML_LEDGER__LEDGER__` prefix:
/// - `AML_LEDGER__LEDGER__LOGGING=debug`
/// - `AML_LEDGER__LEDGER__STORE__KEY_SCHEME=legacy`
/// - `AML_LEDGER__LEDGER__POLICY__VERIFY_NODE_ON_UPDATE=true`
pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    load_layers(path.as_ref(), environment())
}

fn environment() -> Environment {
    Environment::with_prefix("AML_LEDGER").separator("__").try_parsing(true)
}

fn load_layers(path: &Path, env: Environment) -> Result<Config, ConfigError> {
    let builder =
        ConfigBuilder::builder().add_source(File::from(path).required(false)).add_source(env);

    let root: RootConfig = builder.build()?.try_deserialize()?;
    Ok(root.ledger)
}
