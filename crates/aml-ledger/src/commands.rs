//! CLI commands and their execution against a repository.

use aml_ledger_repository::{RecordKey, RecordRepository, RequestContext, SeedReport, demo_records};
use aml_ledger_store::StateBackend;
use aml_ledger_types::RecordFields;
use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::{Value, json};

/// Record fields supplied on the command line.
#[derive(Args, Debug, Clone)]
pub struct RecordArgs {
    #[arg(long)]
    pub country: String,
    #[arg(long)]
    pub id_number: String,
    #[arg(long, default_value = "")]
    pub last_name: String,
    #[arg(long, default_value = "")]
    pub first_name: String,
    /// Date of birth, YYYY/MM/DD
    #[arg(long, default_value = "")]
    pub dob: String,
    #[arg(long, default_value = "")]
    pub risk_level: String,
}

impl From<RecordArgs> for RecordFields {
    fn from(args: RecordArgs) -> Self {
        RecordFields::builder()
            .country(args.country)
            .id_number(args.id_number)
            .last_name(args.last_name)
            .first_name(args.first_name)
            .dob(args.dob)
            .risk_level(args.risk_level)
            .build()
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Check whether a record is present
    Exists {
        #[arg(long)]
        country: String,
        #[arg(long)]
        id_number: String,
        /// Owning organization (defaults to the caller's)
        #[arg(long)]
        data_owner: Option<String>,
    },
    /// Create a record owned by the caller's organization
    Create(RecordArgs),
    /// Read one of the caller's records
    Read {
        #[arg(long)]
        country: String,
        #[arg(long)]
        id_number: String,
    },
    /// Run a selector query across all organizations
    Query {
        /// Query document, e.g. '{"selector":{"country":"TWN"}}'
        selector: String,
    },
    /// List every organization's records for a country
    List {
        #[arg(long)]
        country: String,
    },
    /// Replace the mutable fields of one of the caller's records
    Update(RecordArgs),
    /// Delete one of the caller's records
    Delete {
        #[arg(long)]
        country: String,
        #[arg(long)]
        id_number: String,
    },
    /// Show every version of a record, deletions included
    History {
        #[arg(long)]
        country: String,
        #[arg(long)]
        id_number: String,
        /// Owning organization (defaults to the caller's)
        #[arg(long)]
        data_owner: Option<String>,
    },
    /// Write the demo records that are not yet present
    Seed,
}

impl Command {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Exists { .. } => "exists",
            Command::Create(_) => "create",
            Command::Read { .. } => "read",
            Command::Query { .. } => "query",
            Command::List { .. } => "list",
            Command::Update(_) => "update",
            Command::Delete { .. } => "delete",
            Command::History { .. } => "history",
            Command::Seed => "seed",
        }
    }
}

/// Run `command` for `ctx` and render its result as JSON.
pub async fn execute<S: StateBackend>(
    repository: &RecordRepository<S>,
    ctx: &RequestContext,
    command: Command,
) -> Result<Value> {
    let default_owner = || ctx.caller_org.as_ref().map(|org| org.to_string()).unwrap_or_default();

    let output = match command {
        Command::Exists { country, id_number, data_owner } => {
            let owner = data_owner.unwrap_or_else(default_owner);
            let exists = repository.exists(&RecordKey::new(&country, &id_number, &owner)).await?;
            json!({ "exists": exists })
        },
        Command::Create(args) => serde_json::to_value(repository.create(ctx, args.into()).await?)?,
        Command::Read { country, id_number } => {
            serde_json::to_value(repository.read(ctx, &country, &id_number).await?)?
        },
        Command::Query { selector } => {
            serde_json::to_value(repository.read_by_query(&selector).await?)?
        },
        Command::List { country } => {
            serde_json::to_value(repository.list_by_country(&country).await?)?
        },
        Command::Update(args) => serde_json::to_value(repository.update(ctx, args.into()).await?)?,
        Command::Delete { country, id_number } => {
            repository.delete(ctx, &country, &id_number).await?;
            json!({ "deleted": true })
        },
        Command::History { country, id_number, data_owner } => {
            let owner = data_owner.unwrap_or_else(default_owner);
            let entries =
                repository.history(&country, &id_number, &owner).await?.collect_entries().await?;
            serde_json::to_value(entries)?
        },
        Command::Seed => {
            let report: SeedReport = repository.seed(&demo_records()).await?;
            serde_json::to_value(report)?
        },
    };

    Ok(output)
}
