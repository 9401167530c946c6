//! Tenant isolation tests
//!
//! These tests verify that organizations sharing one ledger hold disjoint
//! record partitions, and that no organization can mutate another's
//! records, whichever node it submits through.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use aml_ledger_repository::{
    LedgerError, RecordKey, RecordRepository, RepositoryPolicy, build_key,
};
use aml_ledger_store::{MemoryLedger, StateBackend};
use aml_ledger_test_fixtures::{
    ORGS, fields, lee_tom, local, repository_for, seeded_ledger, via_peer,
};
use aml_ledger_types::StoreError;

/// Number of organizations racing on the same (country, id_number).
const CONCURRENT_TENANTS: usize = 3;

// =============================================================================
// 1. Partitioning
// =============================================================================

#[tokio::test]
async fn test_same_person_held_independently_by_each_org() {
    let ledger = MemoryLedger::new(ORGS[0]);
    for org in ORGS {
        let repo = repository_for(&ledger, org);
        repo.create(&local(org), lee_tom()).await.unwrap();
    }

    for org in ORGS {
        let repo = repository_for(&ledger, org);
        let record = repo.read(&local(org), "TWN", "A123456789").await.unwrap();
        assert_eq!(record.data_owner, org);
    }

    let all = repository_for(&ledger, ORGS[0]).list_by_country("TWN").await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_delete_by_one_org_leaves_others_untouched() {
    let ledger = seeded_ledger().await;
    let org0 = repository_for(&ledger, "org0MSP");

    org0.delete(&local("org0MSP"), "TWN", "A123456789").await.unwrap();

    assert!(!org0.exists(&RecordKey::new("TWN", "A123456789", "org0MSP")).await.unwrap());
    assert!(org0.exists(&RecordKey::new("TWN", "A123456789", "org1MSP")).await.unwrap());
    assert!(org0.exists(&RecordKey::new("TWN", "A123456789", "org2MSP")).await.unwrap());
}

#[tokio::test]
async fn test_org_cannot_read_another_orgs_record_as_its_own() {
    let ledger = seeded_ledger().await;
    let org1 = repository_for(&ledger, "org1MSP");

    // HKG/ABZG156465 belongs to org0 only.
    let err = org1.read(&local("org1MSP"), "HKG", "ABZG156465").await.unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }));
}

#[tokio::test]
async fn test_query_spans_organizations() {
    let ledger = seeded_ledger().await;
    let repo = repository_for(&ledger, "org2MSP");

    let records = repo
        .read_by_query(r#"{"selector":{"id_number":"A123456789"}}"#)
        .await
        .unwrap();
    let mut owners: Vec<&str> = records.iter().map(|r| r.data_owner.as_str()).collect();
    owners.sort_unstable();
    assert_eq!(owners, ORGS.to_vec());

    let org1_only = repo
        .read_by_query(r#"{"selector":{"data_owner":"org1MSP","risk_level":{"$ne":"high"}}}"#)
        .await
        .unwrap();
    assert_eq!(org1_only.len(), 3);
}

// =============================================================================
// 2. Write Authorization
// =============================================================================

#[tokio::test]
async fn test_update_creates_nothing_in_foreign_partition() {
    let ledger = seeded_ledger().await;
    let org1 = repository_for(&ledger, "org1MSP");

    // org1 holds no HKG/ABZG156465, so its update has nothing to replace.
    let err = org1
        .update(&local("org1MSP"), fields("HKG", "ABZG156465", "low"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }));

    let record = repository_for(&ledger, "org0MSP")
        .read(&local("org0MSP"), "HKG", "ABZG156465")
        .await
        .unwrap();
    assert_eq!(record.risk_level, "medium");
}

#[tokio::test]
async fn test_forged_writes_through_foreign_node_are_refused_by_ledger() {
    let ledger = seeded_ledger().await;
    let relaxed = RepositoryPolicy::builder()
        .verify_node_on_update(false)
        .verify_node_on_delete(false)
        .build();
    let org1_node = RecordRepository::with_policy(ledger.peer("org1MSP"), relaxed);
    let forged = via_peer("org0MSP", "org1MSP");

    let update = org1_node.update(&forged, fields("TWN", "D111111111", "low")).await;
    assert!(matches!(
        update,
        Err(LedgerError::Store(StoreError::EndorsementPolicyFailure { .. }))
    ));

    let delete = org1_node.delete(&forged, "TWN", "D111111111").await;
    assert!(matches!(
        delete,
        Err(LedgerError::Store(StoreError::EndorsementPolicyFailure { .. }))
    ));

    let record = repository_for(&ledger, "org0MSP")
        .read(&local("org0MSP"), "TWN", "D111111111")
        .await
        .unwrap();
    assert_eq!(record.risk_level, "high");
}

#[tokio::test]
async fn test_default_policy_rejects_forged_writes_before_the_ledger() {
    let ledger = seeded_ledger().await;
    let org1_node = repository_for(&ledger, "org1MSP");
    let height = ledger.height().await;

    let forged = via_peer("org0MSP", "org1MSP");
    let update = org1_node.update(&forged, fields("TWN", "D111111111", "low")).await;
    assert!(matches!(update, Err(LedgerError::Authorization { .. })));
    let delete = org1_node.delete(&forged, "TWN", "D111111111").await;
    assert!(matches!(delete, Err(LedgerError::Authorization { .. })));

    assert_eq!(ledger.height().await, height);
    assert_eq!(ledger.metrics().snapshot().endorsement_failures, 0);
}

// =============================================================================
// 3. Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_by_different_orgs_all_succeed() {
    let ledger = MemoryLedger::new(ORGS[0]);

    let mut handles = Vec::with_capacity(CONCURRENT_TENANTS);
    for org in ORGS.iter().take(CONCURRENT_TENANTS) {
        let repo = repository_for(&ledger, org);
        let org = org.to_string();
        handles.push(tokio::spawn(async move { repo.create(&local(&org), lee_tom()).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(ledger.metrics().snapshot().live_keys, CONCURRENT_TENANTS as u64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_of_one_key_admit_exactly_one() {
    let ledger = MemoryLedger::new(ORGS[0]);

    let mut handles = Vec::new();
    for risk in ["low", "medium", "high", "low", "medium", "high"] {
        let repo = repository_for(&ledger, ORGS[0]);
        handles.push(tokio::spawn(async move {
            repo.create(&local(ORGS[0]), fields("TWN", "E222222222", risk)).await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(LedgerError::AlreadyExists { .. }) => {},
            Err(e) if e.is_conflict() => {},
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }

    assert_eq!(created, 1);
    let key = build_key("TWN", "E222222222", "org0MSP");
    assert!(ledger.get(&key).await.unwrap().is_some());
}
