// ============================================================================
// Submission Pipeline Tests
// ============================================================================
//
// Drives SubmissionOrchestrator end to end against in-memory collaborators:
// 1. Acceptance, sealing at rest and notification
// 2. Check ordering (global terms before recipient policy, paused before phrases)
// 3. Thread integrity
// 4. Failure modes (lookup, storage, seal policy, timeout)
//
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use replied_server::submission::{Rejection, SubmissionRequest};

use test_utils::*;

fn request(receiver: Uuid, content: &str) -> SubmissionRequest {
    SubmissionRequest {
        receiver_id: receiver.to_string(),
        content: content.to_string(),
        source_key: "203.0.113.7".to_string(),
        ..Default::default()
    }
}

async fn next_notification(
    h: &mut Harness,
) -> Option<replied_server::notification::Notification> {
    tokio::time::timeout(Duration::from_secs(1), h.notifications.recv())
        .await
        .ok()
        .flatten()
}

// ============================================================================
// Acceptance
// ============================================================================

#[tokio::test]
async fn test_hello_is_accepted_sealed_and_notified() {
    let mut h = harness().build();
    let receiver = h.seed_profile(ProfileSeed {
        email: Some("alice@example.com"),
        ..Default::default()
    });

    let accepted = h
        .context
        .submissions
        .submit(request(receiver, "hello"))
        .await
        .expect("accepted");
    assert!(accepted.sealed);
    assert_eq!(accepted.sender_id, None);

    let messages = h.messages();
    assert_eq!(messages.len(), 1);
    let stored = &messages[0];
    assert_eq!(stored["id"], accepted.message_id.to_string());
    assert_eq!(stored["status"], "pending");
    assert_eq!(stored["receiver_id"], receiver.to_string());
    assert!(stored.get("sender_id").is_none());

    let sealed = stored["content"].as_str().unwrap();
    assert_ne!(sealed, "hello");
    assert_eq!(h.vault.open(sealed).unwrap(), "hello");

    let notification = next_notification(&mut h).await.expect("notification sent");
    assert_eq!(notification.contact, "alice@example.com");
    assert_eq!(notification.display_name, "alice");
    assert_eq!(notification.content, "hello");
}

#[tokio::test]
async fn test_no_contact_address_means_no_notification() {
    let mut h = harness().build();
    let receiver = h.seed_profile(ProfileSeed::default());

    h.context
        .submissions
        .submit(request(receiver, "hello"))
        .await
        .expect("accepted");

    assert!(next_notification(&mut h).await.is_none());
}

#[tokio::test]
async fn test_unreadable_contact_address_skips_notification() {
    let mut h = harness().build();
    // stored without sealing, so it cannot be opened
    let receiver = Uuid::new_v4();
    h.store.seed(
        "profiles",
        serde_json::json!({
            "id": receiver.to_string(),
            "username": "bob",
            "email": "plain@example.com"
        }),
    );

    h.context
        .submissions
        .submit(request(receiver, "hello"))
        .await
        .expect("accepted despite unreadable contact");

    assert!(next_notification(&mut h).await.is_none());
}

#[tokio::test]
async fn test_verified_token_binds_sender() {
    let h = harness().build();
    let receiver = h.seed_profile(ProfileSeed::default());
    let sender = h.identity.issue("token-a");

    let mut req = request(receiver, "hello");
    req.bearer_token = Some("token-a".into());
    let accepted = h.context.submissions.submit(req).await.unwrap();

    assert_eq!(accepted.sender_id, Some(sender));
    assert_eq!(h.messages()[0]["sender_id"], sender.to_string());
}

#[tokio::test]
async fn test_bad_token_or_identity_outage_sends_anonymously() {
    let h = harness().build();
    let receiver = h.seed_profile(ProfileSeed::default());

    let mut req = request(receiver, "hello");
    req.bearer_token = Some("forged".into());
    let accepted = h.context.submissions.submit(req.clone()).await.unwrap();
    assert_eq!(accepted.sender_id, None);

    h.identity.set_unreachable();
    let accepted = h.context.submissions.submit(req).await.unwrap();
    assert_eq!(accepted.sender_id, None);
}

// ============================================================================
// Check ordering
// ============================================================================

#[tokio::test]
async fn test_global_terms_win_over_recipient_phrases() {
    let h = harness().build();
    let receiver = h.seed_profile(ProfileSeed {
        blocked_phrases: &["badword1"],
        ..Default::default()
    });

    for content in ["BadWord1", "badword1"] {
        let rejection = h
            .context
            .submissions
            .submit(request(receiver, content))
            .await
            .unwrap_err();
        assert_eq!(rejection, Rejection::ProhibitedContent);
    }
    assert!(h.messages().is_empty());
}

#[tokio::test]
async fn test_global_terms_checked_before_recipient_lookup() {
    let h = harness().build();
    h.store.fail_collection("profiles");

    let rejection = h
        .context
        .submissions
        .submit(request(Uuid::new_v4(), "visit spamlink now"))
        .await
        .unwrap_err();
    assert_eq!(rejection.code(), "PROHIBITED_CONTENT");
}

#[tokio::test]
async fn test_paused_inbox_rejects_before_phrases() {
    let h = harness().build();
    let receiver = h.seed_profile(ProfileSeed {
        is_paused: true,
        blocked_phrases: &["hello"],
        ..Default::default()
    });

    for content in ["hello", "something harmless"] {
        let rejection = h
            .context
            .submissions
            .submit(request(receiver, content))
            .await
            .unwrap_err();
        assert_eq!(rejection, Rejection::InboxPaused);
    }
}

#[tokio::test]
async fn test_recipient_phrases_are_case_insensitive() {
    let h = harness().build();
    let receiver = h.seed_profile(ProfileSeed {
        blocked_phrases: &["Pineapple"],
        ..Default::default()
    });

    let rejection = h
        .context
        .submissions
        .submit(request(receiver, "I like PINEAPPLE on pizza"))
        .await
        .unwrap_err();
    assert_eq!(rejection.code(), "BLOCKED_PHRASE");

    assert!(
        h.context
            .submissions
            .submit(request(receiver, "I like olives"))
            .await
            .is_ok()
    );
}

// ============================================================================
// Thread integrity
// ============================================================================

#[tokio::test]
async fn test_anonymous_thread_accepts_anyone() {
    let h = harness().build();
    let receiver = h.seed_profile(ProfileSeed::default());
    let thread = Uuid::new_v4();
    h.seed_thread_root(receiver, thread, None);
    h.identity.issue("token-b");

    let mut anonymous = request(receiver, "follow up");
    anonymous.thread_id = Some(thread.to_string());
    assert!(h.context.submissions.submit(anonymous.clone()).await.is_ok());

    let mut identified = anonymous;
    identified.bearer_token = Some("token-b".into());
    assert!(h.context.submissions.submit(identified).await.is_ok());
}

#[tokio::test]
async fn test_sender_thread_only_accepts_original_sender() {
    let h = harness().build();
    let receiver = h.seed_profile(ProfileSeed::default());
    let thread = Uuid::new_v4();
    let sender_a = h.identity.issue("token-a");
    h.identity.issue("token-b");
    h.seed_thread_root(receiver, thread, Some(sender_a));

    let mut req = request(receiver, "follow up");
    req.thread_id = Some(thread.to_string());

    req.bearer_token = Some("token-b".into());
    assert_eq!(
        h.context.submissions.submit(req.clone()).await.unwrap_err(),
        Rejection::ThreadIntegrity
    );

    req.bearer_token = None;
    assert_eq!(
        h.context.submissions.submit(req.clone()).await.unwrap_err(),
        Rejection::ThreadIntegrity
    );

    req.bearer_token = Some("token-a".into());
    let accepted = h.context.submissions.submit(req).await.unwrap();
    assert_eq!(accepted.sender_id, Some(sender_a));

    let follow_up = h
        .messages()
        .into_iter()
        .find(|m| m["id"] == accepted.message_id.to_string())
        .unwrap();
    assert_eq!(follow_up["thread_id"], thread.to_string());
}

#[tokio::test]
async fn test_unknown_thread_places_no_constraint() {
    let h = harness().build();
    let receiver = h.seed_profile(ProfileSeed::default());

    let mut req = request(receiver, "hello");
    req.thread_id = Some(Uuid::new_v4().to_string());
    assert!(h.context.submissions.submit(req).await.is_ok());
}

// ============================================================================
// Failure modes
// ============================================================================

#[tokio::test]
async fn test_missing_recipient_is_lookup_failure() {
    let h = harness().build();
    let rejection = h
        .context
        .submissions
        .submit(request(Uuid::new_v4(), "hello"))
        .await
        .unwrap_err();
    assert_eq!(rejection.code(), "RECIPIENT_LOOKUP_FAILED");
}

#[tokio::test]
async fn test_profile_store_outage_is_lookup_failure() {
    let h = harness().build();
    let receiver = h.seed_profile(ProfileSeed::default());
    h.store.fail_collection("profiles");

    let rejection = h
        .context
        .submissions
        .submit(request(receiver, "hello"))
        .await
        .unwrap_err();
    assert!(matches!(rejection, Rejection::RecipientLookupFailed(_)));
}

#[tokio::test]
async fn test_thread_lookup_outage_fails_closed() {
    let h = harness().build();
    let receiver = h.seed_profile(ProfileSeed::default());
    h.store.fail_collection("messages");

    let mut req = request(receiver, "hello");
    req.thread_id = Some(Uuid::new_v4().to_string());
    let rejection = h.context.submissions.submit(req).await.unwrap_err();
    assert_eq!(rejection.code(), "THREAD_LOOKUP_FAILED");
}

#[tokio::test]
async fn test_insert_failure_is_storage_failure() {
    let mut h = harness().build();
    let receiver = h.seed_profile(ProfileSeed {
        email: Some("alice@example.com"),
        ..Default::default()
    });
    h.store.fail_collection("messages");

    let rejection = h
        .context
        .submissions
        .submit(request(receiver, "hello"))
        .await
        .unwrap_err();
    assert!(matches!(rejection, Rejection::StorageFailed(_)));
    assert!(next_notification(&mut h).await.is_none());
}

#[tokio::test]
async fn test_seal_failure_stores_plaintext_by_default() {
    let h = harness()
        .sealer(Arc::new(BrokenSealer(test_vault())))
        .build();
    let receiver = h.seed_profile(ProfileSeed::default());

    let accepted = h
        .context
        .submissions
        .submit(request(receiver, "hello"))
        .await
        .unwrap();
    assert!(!accepted.sealed);
    assert_eq!(h.messages()[0]["content"], "hello");
}

#[tokio::test]
async fn test_seal_failure_rejects_when_configured() {
    let h = harness()
        .env("SEAL_FAILURE_POLICY", "reject")
        .sealer(Arc::new(BrokenSealer(test_vault())))
        .build();
    let receiver = h.seed_profile(ProfileSeed::default());

    let rejection = h
        .context
        .submissions
        .submit(request(receiver, "hello"))
        .await
        .unwrap_err();
    assert_eq!(rejection, Rejection::EncryptionFailed);
    assert!(h.messages().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_dependencies_time_out_without_persisting() {
    let h = harness().env("SUBMISSION_TIMEOUT_SECS", "10").build();
    let receiver = h.seed_profile(ProfileSeed::default());
    h.store.set_delay(Duration::from_secs(30));

    let rejection = h
        .context
        .submissions
        .submit(request(receiver, "hello"))
        .await
        .unwrap_err();
    assert_eq!(rejection, Rejection::Timeout);
    assert!(h.messages().is_empty());
}

#[tokio::test]
async fn test_validation_runs_after_admission() {
    let h = harness().counters(MemoryCounterStore::new()).build();

    for _ in 0..5 {
        let rejection = h
            .context
            .submissions
            .submit(request(Uuid::new_v4(), ""))
            .await
            .unwrap_err();
        assert_eq!(rejection.code(), "VALIDATION_ERROR");
    }

    // invalid submissions still consumed the window
    let rejection = h
        .context
        .submissions
        .submit(request(Uuid::new_v4(), ""))
        .await
        .unwrap_err();
    assert_eq!(rejection, Rejection::RateLimited);
}
