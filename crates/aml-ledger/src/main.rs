//! # AML Ledger Binary
//!
//! Runs one record command against an in-memory ledger and prints the
//! result as JSON.

use std::time::Instant;

use aml_ledger::{
    commands::{self, Command},
    initialization,
};
use aml_ledger_config::validation;
use aml_ledger_observe::{command_span, init_logging, log_slow_command, record_command_result};
use aml_ledger_repository::RequestContext;
use aml_ledger_types::OrgId;
use anyhow::Result;
use clap::Parser;
use tracing::Instrument;

/// Commands slower than this are logged at warn.
const SLOW_COMMAND_MS: u128 = 500;

#[derive(Parser, Debug)]
#[command(name = "aml-ledger")]
#[command(about = "Multi-organization AML record ledger", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Organization bound to the caller's credential
    #[arg(long, env = "AML_LEDGER_CALLER_ORG", default_value = "org0MSP")]
    caller_org: String,

    /// Organization of the executing node (defaults to the caller's)
    #[arg(long, env = "AML_LEDGER_NODE_ORG")]
    node_org: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match aml_ledger_config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration from {}: {}", args.config, e);
            std::process::exit(1);
        },
    };

    if let Err(e) = validation::validate(&config) {
        eprintln!("Configuration validation error: {}", e);
        std::process::exit(1);
    }

    init_logging(initialization::log_config(&config)?)?;
    config.warn_on_risky_settings();

    let node_org = OrgId::from(args.node_org.unwrap_or_else(|| args.caller_org.clone()));
    let ctx = RequestContext::new(args.caller_org.as_str(), node_org.clone());
    let repository = initialization::initialize_ledger(&config, &node_org).await?;

    let name = args.command.name();
    let span = command_span(name, &args.caller_org, node_org.as_str());
    let started = Instant::now();
    let result = commands::execute(&repository, &ctx, args.command).instrument(span.clone()).await;
    let elapsed_ms = started.elapsed().as_millis();
    log_slow_command(name, elapsed_ms, SLOW_COMMAND_MS);

    match result {
        Ok(output) => {
            record_command_result(&span, "ok", elapsed_ms);
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        },
        Err(e) => {
            record_command_result(&span, "error", elapsed_ms);
            tracing::error!(command = name, error = %e, "Command failed");
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        },
    }
}
