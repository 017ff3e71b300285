//! Approval-path tests: pending-to-active promotion, single-use tokens, and
//! failure ordering.

mod common;

use common::{token_from_link, TestPortal, CORP_VLAN, GUEST_VLAN};
use guest_portal::dtos::AccessTier;
use guest_portal::services::{CredentialStore, ServiceError};

/// Register a privileged guest and return the minted approval token.
async fn register_privileged(portal: &TestPortal, email: &str) -> String {
    let req = portal.solved_request(email, AccessTier::Privileged);
    let res = portal.service.register(req).await.unwrap();
    assert!(res.accepted);
    token_from_link(portal.notifier.approval_links().last().unwrap())
}

#[tokio::test]
async fn approval_promotes_pending_credential() {
    let portal = TestPortal::new();
    let token = register_privileged(&portal, "exec@example.com").await;

    let pending_secret = portal
        .store
        .get("cred:pending:corp:exec@example.com")
        .await
        .unwrap()
        .unwrap();

    let res = portal.service.approve(&token).await.unwrap();
    assert!(res.accepted);
    assert_eq!(res.email, "exec@example.com");
    assert!(res.notified);

    // Promotion preserved the secret and cleared the pending key.
    assert_eq!(
        portal
            .store
            .get("cred:active:corp:exec@example.com")
            .await
            .unwrap(),
        Some(pending_secret.clone())
    );
    assert_eq!(
        portal
            .store
            .get("cred:pending:corp:exec@example.com")
            .await
            .unwrap(),
        None
    );

    // The token no longer resolves.
    assert_eq!(
        portal
            .store
            .get(&format!("approval:{}", token))
            .await
            .unwrap(),
        None
    );

    // The guest now holds the same secret that was pending.
    let deliveries = portal.notifier.credential_deliveries();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(
        deliveries[0],
        ("exec@example.com".to_string(), pending_secret)
    );
}

#[tokio::test]
async fn approval_token_is_single_use() {
    let portal = TestPortal::new();
    let token = register_privileged(&portal, "exec@example.com").await;

    portal.service.approve(&token).await.unwrap();
    let secret_after_first = portal
        .store
        .get("cred:active:corp:exec@example.com")
        .await
        .unwrap()
        .unwrap();

    let err = portal.service.approve(&token).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidApproval));

    // No double notification, no secret change.
    assert_eq!(portal.notifier.credential_deliveries().len(), 1);
    assert_eq!(
        portal
            .store
            .get("cred:active:corp:exec@example.com")
            .await
            .unwrap(),
        Some(secret_after_first)
    );
}

#[tokio::test]
async fn unknown_token_is_rejected_generically() {
    let portal = TestPortal::new();

    let err = portal.service.approve("deadbeef").await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidApproval));

    let err = portal.service.approve("").await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidApproval));
}

#[tokio::test]
async fn lapsed_pending_credential_leaves_approval_record_intact() {
    let portal = TestPortal::new();
    let token = register_privileged(&portal, "exec@example.com").await;

    // Simulate the pending credential expiring ahead of its approval record.
    portal
        .store
        .delete("cred:pending:corp:exec@example.com")
        .await
        .unwrap();

    let err = portal.service.approve(&token).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidApproval));

    // The rename failed, so the approval record must survive for a retry.
    assert_eq!(
        portal
            .store
            .get(&format!("approval:{}", token))
            .await
            .unwrap(),
        Some("exec@example.com".to_string())
    );
    assert!(portal.notifier.credential_deliveries().is_empty());
}

#[tokio::test]
async fn vlan_tag_is_written_only_on_activation() {
    let portal = TestPortal::new();
    let token = register_privileged(&portal, "exec@example.com").await;

    // Pending alone carries no network tag.
    assert_eq!(
        portal.store.get("vlan:exec@example.com").await.unwrap(),
        None
    );

    portal.service.approve(&token).await.unwrap();
    assert_eq!(
        portal.store.get("vlan:exec@example.com").await.unwrap(),
        Some(CORP_VLAN.to_string())
    );
}

#[tokio::test]
async fn pending_registration_does_not_retag_an_active_guest() {
    let portal = TestPortal::new();

    let req = portal.solved_request("exec@example.com", AccessTier::SelfService);
    portal.service.register(req).await.unwrap();
    assert_eq!(
        portal.store.get("vlan:exec@example.com").await.unwrap(),
        Some(GUEST_VLAN.to_string())
    );

    // Requesting corp access keeps the guest on the guest segment until an
    // administrator approves.
    let token = register_privileged(&portal, "exec@example.com").await;
    assert_eq!(
        portal.store.get("vlan:exec@example.com").await.unwrap(),
        Some(GUEST_VLAN.to_string())
    );

    portal.service.approve(&token).await.unwrap();
    assert_eq!(
        portal.store.get("vlan:exec@example.com").await.unwrap(),
        Some(CORP_VLAN.to_string())
    );
}

#[tokio::test]
async fn repeat_privileged_registration_reuses_pending_secret() {
    let portal = TestPortal::new();
    register_privileged(&portal, "exec@example.com").await;
    let first = portal
        .store
        .get("cred:pending:corp:exec@example.com")
        .await
        .unwrap()
        .unwrap();

    register_privileged(&portal, "exec@example.com").await;
    let second = portal
        .store
        .get("cred:pending:corp:exec@example.com")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first, second);

    // Each registration mints its own approval token; either may be used.
    assert_eq!(portal.notifier.approval_links().len(), 2);
}

#[tokio::test]
async fn delivery_failure_after_approval_is_degraded_success() {
    let portal = TestPortal::new();
    let token = register_privileged(&portal, "exec@example.com").await;

    portal
        .notifier
        .fail
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let res = portal.service.approve(&token).await.unwrap();
    assert!(res.accepted);
    assert!(!res.notified);

    // The credential is active regardless of the failed send.
    assert!(portal
        .store
        .get("cred:active:corp:exec@example.com")
        .await
        .unwrap()
        .is_some());
}
