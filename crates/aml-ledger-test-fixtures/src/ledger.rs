//! Pre-built ledgers and repositories.

use aml_ledger_repository::{RecordRepository, RepositoryPolicy, demo_records};
use aml_ledger_store::MemoryLedger;

/// The organizations of the demo data set.
pub const ORGS: [&str; 3] = ["org0MSP", "org1MSP", "org2MSP"];

/// A ledger seeded with the demo records, submitting through `org0MSP`.
pub async fn seeded_ledger() -> MemoryLedger {
    let ledger = MemoryLedger::new(ORGS[0]);
    RecordRepository::new(ledger.clone())
        .seed(&demo_records())
        .await
        .expect("seeding an empty ledger");
    ledger
}

/// Repository submitting through `org`'s peer on a shared ledger.
pub fn repository_for(ledger: &MemoryLedger, org: &str) -> RecordRepository<MemoryLedger> {
    RecordRepository::with_policy(ledger.peer(org), RepositoryPolicy::default())
}
