//! Owner endorsement for record keys.
//!
//! A new record key is bound to its owner by staging a single-org peer
//! endorsement policy in the same transaction that writes the record. The
//! ledger then refuses any later write to the key that the owner's peers
//! did not endorse.

use aml_ledger_store::{EndorsementPolicy, LedgerTransaction, RoleType};
use aml_ledger_types::{OrgId, StoreError};
use tracing::warn;

use crate::{
    error::{LedgerError, LedgerResult},
    keys::RecordKey,
};

/// Policy requiring `owner`'s peers, and only them, to endorse writes.
pub fn owner_policy(owner: &OrgId) -> Result<EndorsementPolicy, StoreError> {
    let mut policy = EndorsementPolicy::new();
    policy.add_orgs(RoleType::Peer, [owner.clone()])?;
    Ok(policy)
}

/// Stage the owner endorsement of `key` inside `txn`.
///
/// Must be called after the record write is staged in the same
/// transaction: the ledger refuses constraints on keys without a value.
/// Any failure is reported as [`LedgerError::Policy`].
pub async fn attach_owner_endorsement(
    txn: &mut dyn LedgerTransaction,
    key: &RecordKey,
    encoded_key: &[u8],
    owner: &OrgId,
) -> LedgerResult<()> {
    let policy_failure = |source: StoreError| {
        warn!(key = %key, owner = %owner, error = %source, "Failed to attach owner endorsement");
        LedgerError::Policy { key: key.clone(), source }
    };

    let bytes = owner_policy(owner).and_then(|p| p.to_bytes()).map_err(policy_failure)?;
    txn.set_write_constraint(encoded_key, bytes).await.map_err(policy_failure)
}
