//! Demo data seeding.
//!
//! Seeding writes a fixed set of records spread over three organizations,
//! each with its owner endorsement. Records whose key already holds a value
//! are skipped, so seeding an already-seeded ledger is a no-op.

use aml_ledger_store::StateBackend;
use aml_ledger_types::{AmlRecord, OrgId};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    endorsement::attach_owner_endorsement,
    error::{LedgerError, LedgerResult},
    keys::RecordKey,
    record::{RecordRepository, encode_record, owner_of, validate_fields},
};

/// Outcome of a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub created: usize,
    pub skipped: usize,
}

/// The demo data set: nine records across `org0MSP`, `org1MSP` and `org2MSP`.
///
/// `TWN/A123456789` appears once per organization, showing that tenants
/// hold independent records for the same person.
pub fn demo_records() -> Vec<AmlRecord> {
    const ROWS: [(&str, &str, &str, &str, &str, &str, &str); 9] = [
        ("Lee", "Tom", "1980/01/02", "TWN", "A123456789", "org0MSP", "low"),
        ("Tseng", "Ling-Pei", "1982/02/20", "TWN", "D111111111", "org0MSP", "high"),
        ("Chan", "Yip", "1970/02/15", "HKG", "ABZG156465", "org0MSP", "medium"),
        ("Lee", "Tom", "1980/01/02", "TWN", "A123456789", "org1MSP", "low"),
        ("Li", "Kuei-Jung", "1973/10/04", "NLD", "CALZ12557", "org1MSP", "low"),
        ("Shen", "Lung-Tsu", "1979/05/14", "TWN", "F123456789", "org1MSP", "low"),
        ("Lee", "Tom", "1980/01/02", "TWN", "A123456789", "org2MSP", "low"),
        ("TSUNG", "CHUN-CHEN", "1982/06/10", "TWN", "B123456789", "org2MSP", "medium"),
        ("Chan", "Chi-Jong", "1975/04/03", "TWN", "C123456789", "org2MSP", "low"),
    ];

    ROWS.iter()
        .map(|&(last_name, first_name, dob, country, id_number, data_owner, risk_level)| {
            AmlRecord {
                last_name: last_name.to_string(),
                first_name: first_name.to_string(),
                dob: dob.to_string(),
                country: country.to_string(),
                id_number: id_number.to_string(),
                data_owner: data_owner.to_string(),
                risk_level: risk_level.to_string(),
            }
        })
        .collect()
}

impl<S: StateBackend> RecordRepository<S> {
    /// Write `records` that are not yet present, each with its owner endorsement.
    ///
    /// Each record is committed in its own transaction. The first failure
    /// aborts the run; records committed before it stay committed.
    #[tracing::instrument(
        name = "ledger",
        skip(self, records),
        fields(operation = "seed", count = records.len())
    )]
    pub async fn seed(&self, records: &[AmlRecord]) -> LedgerResult<SeedReport> {
        let mut report = SeedReport::default();

        for record in records {
            validate_fields(&record.fields())?;
            let owner: OrgId = owner_of(record);
            if owner.is_blank() {
                return Err(LedgerError::Validation(format!(
                    "seed record {}/{} has no data_owner",
                    record.country, record.id_number
                )));
            }

            let key = RecordKey::new(&record.country, &record.id_number, &owner);
            let encoded = self.encode_key(&key);

            let mut txn = self.storage.transaction().await?;
            if txn.get(&encoded).await?.is_some() {
                debug!(key = %key, "Seed record already present");
                report.skipped += 1;
                continue;
            }

            txn.put(encoded.clone(), encode_record(record)?);
            attach_owner_endorsement(txn.as_mut(), &key, &encoded, &owner).await?;
            txn.commit().await?;
            report.created += 1;
        }

        info!(created = report.created, skipped = report.skipped, "Seeding complete");
        Ok(report)
    }
}
