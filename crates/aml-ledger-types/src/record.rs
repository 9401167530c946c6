//! AML record types
//!
//! [`AmlRecord`] is the persisted document. Its JSON encoding (snake_case
//! keys, field order below) must stay byte-for-byte stable because history
//! reconstruction decodes every version ever written to a key.

use serde::{Deserialize, Serialize};

use crate::OrgId;

/// A per-entity compliance record as stored in the ledger.
///
/// The triple (`country`, `id_number`, `data_owner`) identifies the record.
/// `data_owner` is assigned from the acting organization on creation and
/// never changes afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AmlRecord {
    pub last_name: String,
    pub first_name: String,
    /// Date of birth, `YYYY/MM/DD`. Stored as given.
    pub dob: String,
    pub country: String,
    pub id_number: String,
    pub data_owner: String,
    /// Free-text classification such as "low", "medium" or "high".
    pub risk_level: String,
}

impl AmlRecord {
    /// Returns the client-controlled portion of this record.
    pub fn fields(&self) -> RecordFields {
        RecordFields {
            last_name: self.last_name.clone(),
            first_name: self.first_name.clone(),
            dob: self.dob.clone(),
            country: self.country.clone(),
            id_number: self.id_number.clone(),
            risk_level: self.risk_level.clone(),
        }
    }
}

/// Client-supplied record fields.
///
/// Carries no `data_owner`: ownership always comes from
/// the resolved acting organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[builder(on(String, into))]
pub struct RecordFields {
    #[builder(default)]
    pub last_name: String,
    #[builder(default)]
    pub first_name: String,
    #[builder(default)]
    pub dob: String,
    pub country: String,
    pub id_number: String,
    #[builder(default)]
    pub risk_level: String,
}

impl RecordFields {
    /// Materialize a record owned by `owner`.
    pub fn into_record(self, owner: &OrgId) -> AmlRecord {
        AmlRecord {
            last_name: self.last_name,
            first_name: self.first_name,
            dob: self.dob,
            country: self.country,
            id_number: self.id_number,
            data_owner: owner.as_str().to_string(),
            risk_level: self.risk_level,
        }
    }
}
