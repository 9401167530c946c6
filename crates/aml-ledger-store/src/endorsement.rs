//! Key-level endorsement policies
//!
//! An [`EndorsementPolicy`] names the organizations whose peers must
//! endorse any transaction that writes a key. Record owners attach one to
//! each record key so that only their own peers can mutate it later.
//!
//! The ledger stores the policy as opaque bytes. The encoding is JSON:
//!
//! ```json
//! {"role":"peer","orgs":["org0MSP"]}
//! ```

use aml_ledger_types::{OrgId, StoreError, StoreResult};
use serde::{Deserialize, Serialize};

/// Role an endorsing identity must hold within its organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    #[default]
    Peer,
    Member,
}

/// Set of organizations that must all endorse writes to a key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndorsementPolicy {
    role: RoleType,
    orgs: Vec<OrgId>,
}

impl EndorsementPolicy {
    /// An empty policy. It cannot be encoded until at least one org is added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require endorsement from each of `orgs` under `role`.
    ///
    /// All orgs of one policy share a role; mixing roles is rejected.
    pub fn add_orgs<I, O>(&mut self, role: RoleType, orgs: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = O>,
        O: Into<OrgId>,
    {
        if !self.orgs.is_empty() && self.role != role {
            return Err(StoreError::InvalidPolicy(format!(
                "policy already requires role {:?}, cannot add role {:?}",
                self.role, role
            )));
        }
        self.role = role;

        for org in orgs {
            let org = org.into();
            if org.is_blank() {
                return Err(StoreError::InvalidPolicy("organization id is empty".to_string()));
            }
            if !self.orgs.contains(&org) {
                self.orgs.push(org);
            }
        }
        Ok(())
    }

    /// Organizations listed in the policy.
    pub fn orgs(&self) -> &[OrgId] {
        &self.orgs
    }

    pub fn role(&self) -> RoleType {
        self.role
    }

    /// True if every listed org is among `endorsers`.
    pub fn is_satisfied_by(&self, endorsers: &[OrgId]) -> bool {
        !self.orgs.is_empty() && self.orgs.iter().all(|org| endorsers.contains(org))
    }

    /// Encode the policy for the ledger.
    pub fn to_bytes(&self) -> StoreResult<Vec<u8>> {
        if self.orgs.is_empty() {
            return Err(StoreError::InvalidPolicy("policy lists no organizations".to_string()));
        }
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a policy previously produced by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> StoreResult<Self> {
        let policy: Self = serde_json::from_slice(bytes)
            .map_err(|e| StoreError::InvalidPolicy(format!("malformed policy: {e}")))?;
        if policy.orgs.is_empty() {
            return Err(StoreError::InvalidPolicy("policy lists no organizations".to_string()));
        }
        if policy.orgs.iter().any(OrgId::is_blank) {
            return Err(StoreError::InvalidPolicy("organization id is empty".to_string()));
        }
        Ok(policy)
    }
}
