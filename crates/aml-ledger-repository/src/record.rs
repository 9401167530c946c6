//! Repository for AML record operations.
//!
//! This module provides [`RecordRepository`], which handles the record
//! lifecycle on top of a generic [`StateBackend`]:
//!
//! ```text
//! Absent --create--> Present --update--> Present
//!                    Present --delete--> Absent
//! ```
//!
//! Every mutation runs inside one ledger transaction. The key is read
//! inside that transaction, so a concurrent write to the same key makes the
//! commit fail with a conflict instead of silently overwriting. Conflicts
//! are surfaced as [`LedgerError::Store`] and never retried here.
//!
//! Ownership always comes from the resolved acting organization, never from
//! caller-supplied fields.

use std::fmt::Display;

use aml_ledger_store::StateBackend;
use aml_ledger_types::{AmlRecord, OrgId, RecordFields, StoreError};
use tracing::{debug, info};

use crate::{
    endorsement::attach_owner_endorsement,
    error::{LedgerError, LedgerResult},
    history::RecordHistory,
    identity::{IdentitySource, resolve_acting_org},
    keys::{KeyScheme, RecordKey},
};

/// Behavior switches of a [`RecordRepository`].
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
pub struct RepositoryPolicy {
    #[builder(default)]
    pub key_scheme: KeyScheme,
    /// Require the caller's org to match the executing node's on create.
    #[builder(default = true)]
    pub verify_node_on_create: bool,
    #[builder(default = true)]
    pub verify_node_on_update: bool,
    #[builder(default = true)]
    pub verify_node_on_delete: bool,
    #[builder(default)]
    pub verify_node_on_read: bool,
    /// Remove the owner endorsement together with the record.
    #[builder(default)]
    pub clear_constraint_on_delete: bool,
}

impl Default for RepositoryPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Repository for AML records.
///
/// # Example
///
/// ```ignore
/// use aml_ledger_repository::{RecordRepository, RequestContext};
/// use aml_ledger_store::MemoryLedger;
///
/// let repo = RecordRepository::new(MemoryLedger::new("org0MSP"));
/// let record = repo.create(&RequestContext::local("org0MSP"), fields).await?;
/// ```
pub struct RecordRepository<S: StateBackend> {
    pub(crate) storage: S,
    pub(crate) policy: RepositoryPolicy,
}

impl<S: StateBackend> RecordRepository<S> {
    /// Create a repository with the default policy.
    pub fn new(storage: S) -> Self {
        Self::with_policy(storage, RepositoryPolicy::default())
    }

    pub fn with_policy(storage: S, policy: RepositoryPolicy) -> Self {
        Self { storage, policy }
    }

    /// Storage key of `key` under the configured scheme.
    pub fn encode_key(&self, key: &RecordKey) -> Vec<u8> {
        self.policy.key_scheme.encode(key)
    }

    /// Check whether a record is present.
    ///
    /// A missing key is `Ok(false)`; only backend failures are errors.
    #[tracing::instrument(
        name = "ledger",
        skip(self, key),
        fields(operation = "exists", country = %key.country, id_number = %key.id_number)
    )]
    pub async fn exists(&self, key: &RecordKey) -> LedgerResult<bool> {
        Ok(self.storage.get(&self.encode_key(key)).await?.is_some())
    }

    /// Create a record owned by the acting organization.
    ///
    /// The record write and its owner endorsement are committed together.
    /// If the endorsement cannot be staged nothing is committed and the
    /// create fails with [`LedgerError::Policy`].
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the acting organization already holds a
    /// record for (country, id_number).
    #[tracing::instrument(
        name = "ledger",
        skip(self, ctx, fields),
        fields(operation = "create", country = %fields.country, id_number = %fields.id_number)
    )]
    pub async fn create<I>(&self, ctx: &I, fields: RecordFields) -> LedgerResult<AmlRecord>
    where
        I: IdentitySource + ?Sized,
    {
        let owner = resolve_acting_org(ctx, self.policy.verify_node_on_create)?;
        validate_fields(&fields)?;

        let key = RecordKey::new(&fields.country, &fields.id_number, &owner);
        let encoded = self.encode_key(&key);

        let mut txn = self.storage.transaction().await?;
        if txn.get(&encoded).await?.is_some() {
            return Err(LedgerError::AlreadyExists { key });
        }

        let record = fields.into_record(&owner);
        txn.put(encoded.clone(), encode_record(&record)?);
        attach_owner_endorsement(txn.as_mut(), &key, &encoded, &owner).await?;
        let tx_id = txn.commit().await?;

        info!(tx_id = %tx_id, data_owner = %owner, "Record created");
        Ok(record)
    }

    /// Read the acting organization's record for (country, id_number).
    #[tracing::instrument(
        name = "ledger",
        skip(self, ctx),
        fields(operation = "read", country = %country, id_number = %id_number)
    )]
    pub async fn read<I>(&self, ctx: &I, country: &str, id_number: &str) -> LedgerResult<AmlRecord>
    where
        I: IdentitySource + ?Sized,
    {
        let owner = resolve_acting_org(ctx, self.policy.verify_node_on_read)?;
        let key = RecordKey::new(country, id_number, &owner);

        match self.storage.get(&self.encode_key(&key)).await? {
            Some(bytes) => decode_record(&key, &bytes),
            None => Err(LedgerError::NotFound { key }),
        }
    }

    /// Run a rich query and decode every returned document.
    ///
    /// The query string is handed to the ledger unchanged. One document that
    /// does not decode fails the whole query.
    #[tracing::instrument(name = "ledger", skip(self), fields(operation = "query"))]
    pub async fn read_by_query(&self, query: &str) -> LedgerResult<Vec<AmlRecord>> {
        let documents = self.storage.query(query).await?;
        let records = documents
            .iter()
            .map(|kv| decode_record(kv.key_lossy(), &kv.value))
            .collect::<LedgerResult<Vec<_>>>()?;

        debug!(count = records.len(), "Query returned records");
        Ok(records)
    }

    /// All records of `country`, across organizations, in key order.
    ///
    /// Only supported by key schemes with a per-country prefix.
    #[tracing::instrument(
        name = "ledger",
        skip(self),
        fields(operation = "list", country = %country)
    )]
    pub async fn list_by_country(&self, country: &str) -> LedgerResult<Vec<AmlRecord>> {
        if country.is_empty() {
            return Err(LedgerError::Validation("country must not be empty".to_string()));
        }
        let range = self.policy.key_scheme.country_range(country)?;
        let entries = self.storage.get_range(range).await?;

        entries.iter().map(|kv| decode_record(kv.key_lossy(), &kv.value)).collect()
    }

    /// Replace the acting organization's record.
    ///
    /// `data_owner` is re-derived from the acting organization. The ledger
    /// also enforces the key's owner endorsement at commit, which is what
    /// stops a foreign node once node verification is turned off.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the record does not exist.
    #[tracing::instrument(
        name = "ledger",
        skip(self, ctx, fields),
        fields(operation = "update", country = %fields.country, id_number = %fields.id_number)
    )]
    pub async fn update<I>(&self, ctx: &I, fields: RecordFields) -> LedgerResult<AmlRecord>
    where
        I: IdentitySource + ?Sized,
    {
        let owner = resolve_acting_org(ctx, self.policy.verify_node_on_update)?;
        validate_fields(&fields)?;

        let key = RecordKey::new(&fields.country, &fields.id_number, &owner);
        let encoded = self.encode_key(&key);

        let mut txn = self.storage.transaction().await?;
        if txn.get(&encoded).await?.is_none() {
            return Err(LedgerError::NotFound { key });
        }

        let record = fields.into_record(&owner);
        txn.put(encoded, encode_record(&record)?);
        let tx_id = txn.commit().await?;

        info!(tx_id = %tx_id, data_owner = %owner, "Record updated");
        Ok(record)
    }

    /// Delete the acting organization's record.
    ///
    /// The owner endorsement stays on the key unless the policy clears it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the record does not exist.
    #[tracing::instrument(
        name = "ledger",
        skip(self, ctx),
        fields(operation = "delete", country = %country, id_number = %id_number)
    )]
    pub async fn delete<I>(&self, ctx: &I, country: &str, id_number: &str) -> LedgerResult<()>
    where
        I: IdentitySource + ?Sized,
    {
        let owner = resolve_acting_org(ctx, self.policy.verify_node_on_delete)?;
        let key = RecordKey::new(country, id_number, &owner);
        let encoded = self.encode_key(&key);

        let mut txn = self.storage.transaction().await?;
        if txn.get(&encoded).await?.is_none() {
            return Err(LedgerError::NotFound { key });
        }

        if self.policy.clear_constraint_on_delete {
            txn.clear_write_constraint(&encoded);
        }
        txn.delete(encoded);
        let tx_id = txn.commit().await?;

        info!(tx_id = %tx_id, data_owner = %owner, "Record deleted");
        Ok(())
    }

    /// Open the audit trail of a record, oldest version first.
    ///
    /// Any organization may read any record's history.
    #[tracing::instrument(
        name = "ledger",
        skip(self),
        fields(operation = "history", country = %country, id_number = %id_number)
    )]
    pub async fn history(
        &self,
        country: &str,
        id_number: &str,
        data_owner: &str,
    ) -> LedgerResult<RecordHistory> {
        let key = RecordKey::new(country, id_number, data_owner);
        let iter = self.storage.history_for_key(&self.encode_key(&key)).await?;
        Ok(RecordHistory::new(key, iter))
    }

    /// Access the underlying ledger.
    #[inline]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    #[inline]
    pub fn policy(&self) -> &RepositoryPolicy {
        &self.policy
    }
}

pub(crate) fn validate_fields(fields: &RecordFields) -> LedgerResult<()> {
    if fields.country.is_empty() {
        return Err(LedgerError::Validation("country must not be empty".to_string()));
    }
    if fields.id_number.is_empty() {
        return Err(LedgerError::Validation("id_number must not be empty".to_string()));
    }
    Ok(())
}

pub(crate) fn encode_record(record: &AmlRecord) -> LedgerResult<Vec<u8>> {
    Ok(serde_json::to_vec(record).map_err(StoreError::from)?)
}

fn decode_record(key: impl Display, bytes: &[u8]) -> LedgerResult<AmlRecord> {
    serde_json::from_slice(bytes)
        .map_err(|source| LedgerError::Decode { key: key.to_string(), source })
}

/// Owner of `record` as an organization id.
pub(crate) fn owner_of(record: &AmlRecord) -> OrgId {
    OrgId::from(record.data_owner.as_str())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use aml_ledger_store::{EndorsementPolicy, LedgerFaults, MemoryLedger};

    use super::*;
    use crate::identity::RequestContext;

    fn lee_tom() -> RecordFields {
        RecordFields::builder()
            .last_name("Lee")
            .first_name("Tom")
            .dob("1980/01/02")
            .country("TWN")
            .id_number("A123456789")
            .risk_level("low")
            .build()
    }

    fn repo(org: &str) -> RecordRepository<MemoryLedger> {
        RecordRepository::new(MemoryLedger::new(org))
    }

    fn lee_key(owner: &str) -> RecordKey {
        RecordKey::new("TWN", "A123456789", owner)
    }

    // =========================================================================
    // Create / Exists
    // =========================================================================

    #[tokio::test]
    async fn test_create_then_exists() {
        let repo = repo("org0MSP");
        let ctx = RequestContext::local("org0MSP");

        assert!(!repo.exists(&lee_key("org0MSP")).await.unwrap());
        let record = repo.create(&ctx, lee_tom()).await.unwrap();

        assert_eq!(record.data_owner, "org0MSP");
        assert!(repo.exists(&lee_key("org0MSP")).await.unwrap());
        assert!(!repo.exists(&lee_key("org1MSP")).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_create_is_already_exists() {
        let repo = repo("org0");
        let ctx = RequestContext::local("org0");
        repo.create(&ctx, lee_tom()).await.unwrap();
        let height = repo.storage().height().await;

        let mut changed = lee_tom();
        changed.risk_level = "high".to_string();
        let err = repo.create(&ctx, changed).await.unwrap_err();

        assert!(matches!(err, LedgerError::AlreadyExists { .. }));
        assert_eq!(
            err.to_string(),
            "the aml data already exists country:TWN, id_number:A123456789, data_owner:org0"
        );
        assert_eq!(repo.storage().height().await, height);
        assert_eq!(repo.read(&ctx, "TWN", "A123456789").await.unwrap().risk_level, "low");
    }

    #[tokio::test]
    async fn test_create_attaches_owner_endorsement() {
        let repo = repo("org0MSP");
        repo.create(&RequestContext::local("org0MSP"), lee_tom()).await.unwrap();

        let encoded = repo.encode_key(&lee_key("org0MSP"));
        let stored = repo.storage().write_constraint(&encoded).await.unwrap().unwrap();
        let policy = EndorsementPolicy::from_bytes(&stored).unwrap();
        assert_eq!(policy.orgs(), &[OrgId::from("org0MSP")]);
    }

    #[tokio::test]
    async fn test_create_from_foreign_node_is_rejected_by_default() {
        let repo = repo("org1MSP");
        let ctx = RequestContext::new("org0MSP", "org1MSP");

        let err = repo.create(&ctx, lee_tom()).await.unwrap_err();
        assert!(matches!(err, LedgerError::Authorization { .. }));
        assert_eq!(repo.storage().height().await, 0);
    }

    #[tokio::test]
    async fn test_create_requires_key_fields() {
        let repo = repo("org0MSP");
        let fields = RecordFields::builder().country("TWN").id_number("").build();
        let err = repo.create(&RequestContext::local("org0MSP"), fields).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_policy_rejection_commits_nothing() {
        let repo = repo("org0MSP");
        repo.storage()
            .set_faults(LedgerFaults { reject_constraints: true, ..Default::default() })
            .await;

        let err = repo.create(&RequestContext::local("org0MSP"), lee_tom()).await.unwrap_err();
        assert!(matches!(err, LedgerError::Policy { .. }));
        assert!(!repo.exists(&lee_key("org0MSP")).await.unwrap());
        assert_eq!(repo.storage().height().await, 0);
    }

    #[tokio::test]
    async fn test_store_failure_on_exists() {
        let repo = repo("org0MSP");
        repo.storage().set_faults(LedgerFaults { fail_reads: true, ..Default::default() }).await;
        let err = repo.exists(&lee_key("org0MSP")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Store(StoreError::Database(_))));
    }

    // =========================================================================
    // Read / Query
    // =========================================================================

    #[tokio::test]
    async fn test_query_round_trip_forces_owner() {
        let repo = repo("org0MSP");
        let ctx = RequestContext::local("org0MSP");
        repo.create(&ctx, lee_tom()).await.unwrap();

        let found = repo
            .read_by_query(
                r#"{"selector":{"country":"TWN","id_number":"A123456789","data_owner":"org0MSP"}}"#,
            )
            .await
            .unwrap();

        assert_eq!(found, vec![lee_tom().into_record(&OrgId::from("org0MSP"))]);
    }

    #[tokio::test]
    async fn test_query_fails_on_undecodable_document() {
        let repo = repo("org0MSP");
        repo.create(&RequestContext::local("org0MSP"), lee_tom()).await.unwrap();
        repo.storage()
            .put(b"junk".to_vec(), br#"{"country":"TWN","risk_level":5}"#.to_vec())
            .await
            .unwrap();

        let err = repo.read_by_query(r#"{"selector":{"country":"TWN"}}"#).await.unwrap_err();
        match err {
            LedgerError::Decode { key, .. } => assert_eq!(key, "junk"),
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_query_is_store_error() {
        let repo = repo("org0MSP");
        let err = repo.read_by_query("country == TWN").await.unwrap_err();
        assert!(matches!(err, LedgerError::Store(StoreError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_read_missing_and_undecodable() {
        let repo = repo("org0MSP");
        let ctx = RequestContext::local("org0MSP");

        let err = repo.read(&ctx, "TWN", "A123456789").await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));

        let encoded = repo.encode_key(&lee_key("org0MSP"));
        repo.storage().put(encoded, b"not a record".to_vec()).await.unwrap();
        let err = repo.read(&ctx, "TWN", "A123456789").await.unwrap_err();
        assert!(matches!(err, LedgerError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_list_by_country() {
        let repo = repo("org0MSP");
        repo.create(&RequestContext::local("org0MSP"), lee_tom()).await.unwrap();
        let mut hkg = lee_tom();
        hkg.country = "HKG".to_string();
        repo.create(&RequestContext::local("org0MSP"), hkg).await.unwrap();

        let twn = repo.list_by_country("TWN").await.unwrap();
        assert_eq!(twn.len(), 1);
        assert_eq!(twn[0].country, "TWN");
        assert!(repo.list_by_country("NLD").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_unsupported_for_legacy_keys() {
        let policy = RepositoryPolicy::builder().key_scheme(KeyScheme::Legacy).build();
        let repo = RecordRepository::with_policy(MemoryLedger::new("org0MSP"), policy);
        let err = repo.list_by_country("TWN").await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    // =========================================================================
    // Update / Delete
    // =========================================================================

    #[tokio::test]
    async fn test_update_absent_is_not_found_without_write() {
        let repo = repo("org0MSP");
        let err = repo.update(&RequestContext::local("org0MSP"), lee_tom()).await.unwrap_err();

        assert!(matches!(err, LedgerError::NotFound { .. }));
        assert_eq!(repo.storage().height().await, 0);
    }

    #[tokio::test]
    async fn test_update_replaces_fields_and_keeps_owner() {
        let repo = repo("org0MSP");
        let ctx = RequestContext::local("org0MSP");
        repo.create(&ctx, lee_tom()).await.unwrap();

        let mut changed = lee_tom();
        changed.risk_level = "high".to_string();
        changed.first_name = String::new();
        let updated = repo.update(&ctx, changed).await.unwrap();

        assert_eq!(updated.data_owner, "org0MSP");
        let stored = repo.read(&ctx, "TWN", "A123456789").await.unwrap();
        assert_eq!(stored.risk_level, "high");
        assert_eq!(stored.first_name, "");
    }

    #[tokio::test]
    async fn test_update_and_delete_from_foreign_node_rejected_by_default() {
        let ledger = MemoryLedger::new("org0MSP");
        let owner_repo = RecordRepository::new(ledger.clone());
        owner_repo.create(&RequestContext::local("org0MSP"), lee_tom()).await.unwrap();
        let height = ledger.height().await;

        let foreign_repo = RecordRepository::new(ledger.peer("org1MSP"));
        let ctx = RequestContext::new("org0MSP", "org1MSP");
        let mut changed = lee_tom();
        changed.risk_level = "high".to_string();

        let err = foreign_repo.update(&ctx, changed).await.unwrap_err();
        assert!(matches!(err, LedgerError::Authorization { .. }), "got {err:?}");
        let err = foreign_repo.delete(&ctx, "TWN", "A123456789").await.unwrap_err();
        assert!(matches!(err, LedgerError::Authorization { .. }), "got {err:?}");

        assert_eq!(ledger.height().await, height);
        assert_eq!(ledger.metrics().snapshot().endorsement_failures, 0);
    }

    #[tokio::test]
    async fn test_update_through_foreign_peer_is_rejected_by_store() {
        let ledger = MemoryLedger::new("org0MSP");
        let owner_repo = RecordRepository::new(ledger.clone());
        owner_repo.create(&RequestContext::local("org0MSP"), lee_tom()).await.unwrap();

        // Presence check passes; only the ledger's endorsement check stops it.
        let policy = RepositoryPolicy::builder().verify_node_on_update(false).build();
        let foreign_repo = RecordRepository::with_policy(ledger.peer("org1MSP"), policy);
        let mut changed = lee_tom();
        changed.risk_level = "high".to_string();
        let err = foreign_repo
            .update(&RequestContext::new("org0MSP", "org1MSP"), changed)
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Store(StoreError::EndorsementPolicyFailure { .. })));
        let stored =
            owner_repo.read(&RequestContext::local("org0MSP"), "TWN", "A123456789").await.unwrap();
        assert_eq!(stored.risk_level, "low");
    }

    #[tokio::test]
    async fn test_delete_absent_is_not_found() {
        let repo = repo("org0MSP");
        let err =
            repo.delete(&RequestContext::local("org0MSP"), "TWN", "A123456789").await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_present() {
        let repo = repo("org0MSP");
        let ctx = RequestContext::local("org0MSP");
        repo.create(&ctx, lee_tom()).await.unwrap();

        repo.delete(&ctx, "TWN", "A123456789").await.unwrap();
        assert!(!repo.exists(&lee_key("org0MSP")).await.unwrap());

        let encoded = repo.encode_key(&lee_key("org0MSP"));
        assert!(repo.storage().write_constraint(&encoded).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_can_clear_constraint() {
        let policy = RepositoryPolicy::builder().clear_constraint_on_delete(true).build();
        let repo = RecordRepository::with_policy(MemoryLedger::new("org0MSP"), policy);
        let ctx = RequestContext::local("org0MSP");
        repo.create(&ctx, lee_tom()).await.unwrap();

        repo.delete(&ctx, "TWN", "A123456789").await.unwrap();
        let encoded = repo.encode_key(&lee_key("org0MSP"));
        assert!(repo.storage().write_constraint(&encoded).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recreate_through_foreign_peer_blocked_by_retained_constraint() {
        let ledger = MemoryLedger::new("org0MSP");
        let owner_repo = RecordRepository::new(ledger.clone());
        let ctx = RequestContext::local("org0MSP");
        owner_repo.create(&ctx, lee_tom()).await.unwrap();
        owner_repo.delete(&ctx, "TWN", "A123456789").await.unwrap();
        let height = ledger.height().await;

        let policy = RepositoryPolicy::builder().verify_node_on_create(false).build();
        let foreign_repo = RecordRepository::with_policy(ledger.peer("org1MSP"), policy);
        let err = foreign_repo
            .create(&RequestContext::new("org0MSP", "org1MSP"), lee_tom())
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Store(StoreError::EndorsementPolicyFailure { .. })));
        assert!(!owner_repo.exists(&lee_key("org0MSP")).await.unwrap());
        assert_eq!(ledger.height().await, height);
    }

    // =========================================================================
    // History
    // =========================================================================

    #[tokio::test]
    async fn test_history_create_update_delete() {
        let repo = repo("org0MSP");
        let ctx = RequestContext::local("org0MSP");
        repo.create(&ctx, lee_tom()).await.unwrap();
        let mut changed = lee_tom();
        changed.risk_level = "medium".to_string();
        repo.update(&ctx, changed).await.unwrap();
        repo.delete(&ctx, "TWN", "A123456789").await.unwrap();

        let entries = repo
            .history("TWN", "A123456789", "org0MSP")
            .await
            .unwrap()
            .collect_entries()
            .await
            .unwrap();

        let flags: Vec<bool> = entries.iter().map(|e| e.is_delete).collect();
        assert_eq!(flags, vec![false, false, true]);
        assert_eq!(entries[0].record.as_ref().unwrap().risk_level, "low");
        assert_eq!(entries[1].record.as_ref().unwrap().risk_level, "medium");
        assert!(entries[2].record.is_none());
        assert_eq!(repo.storage().open_iterators(), 0);
    }

    #[tokio::test]
    async fn test_history_of_unknown_key_is_empty() {
        let repo = repo("org0MSP");
        let history = repo.history("TWN", "none", "org0MSP").await.unwrap();
        assert!(history.collect_entries().await.unwrap().is_empty());
        assert_eq!(repo.storage().open_iterators(), 0);
    }
}
