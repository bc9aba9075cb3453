// ============================================================================
// Admission Window Tests
// ============================================================================
//
// Window timing is driven by tokio's paused clock: the counter store expires
// windows on tokio::time::Instant, so advance() moves both together.
//
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use replied_server::submission::{Rejection, SubmissionRequest};

use test_utils::*;

fn from_source(receiver: Uuid, source: &str) -> SubmissionRequest {
    SubmissionRequest {
        receiver_id: receiver.to_string(),
        content: "hello".to_string(),
        source_key: source.to_string(),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_window_allows_five_then_resets_after_expiry() {
    let h = harness().counters(MemoryCounterStore::new()).build();
    let receiver = h.seed_profile(ProfileSeed::default());
    let submit = || h.context.submissions.submit(from_source(receiver, "198.51.100.4"));

    // t = 0: submissions 1..=5
    for n in 1..=5 {
        assert!(submit().await.is_ok(), "submission {} should be admitted", n);
    }

    // t = 9m59s: still inside the window
    tokio::time::advance(Duration::from_secs(9 * 60 + 59)).await;
    assert_eq!(submit().await.unwrap_err(), Rejection::RateLimited);

    // t = 10m01s: window expired
    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(submit().await.is_ok());

    assert_eq!(h.messages().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_sources_are_counted_independently() {
    let h = harness().counters(MemoryCounterStore::new()).build();
    let receiver = h.seed_profile(ProfileSeed::default());

    for _ in 0..5 {
        h.context
            .submissions
            .submit(from_source(receiver, "198.51.100.4"))
            .await
            .unwrap();
    }
    assert_eq!(
        h.context
            .submissions
            .submit(from_source(receiver, "198.51.100.4"))
            .await
            .unwrap_err()
            .code(),
        "RATE_LIMITED"
    );
    assert!(
        h.context
            .submissions
            .submit(from_source(receiver, "198.51.100.5"))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_rate_limit_is_checked_before_content() {
    let h = harness().counters(MemoryCounterStore::new()).build();
    let receiver = h.seed_profile(ProfileSeed::default());

    for _ in 0..5 {
        h.context
            .submissions
            .submit(from_source(receiver, "198.51.100.4"))
            .await
            .unwrap();
    }

    let mut banned = from_source(receiver, "198.51.100.4");
    banned.content = "badword1".into();
    assert_eq!(
        h.context.submissions.submit(banned).await.unwrap_err(),
        Rejection::RateLimited
    );
}

#[tokio::test]
async fn test_unreachable_counter_store_fails_open() {
    let h = harness()
        .counters(Arc::new(UnreachableCounterStore))
        .build();
    let receiver = h.seed_profile(ProfileSeed::default());

    for _ in 0..10 {
        assert!(
            h.context
                .submissions
                .submit(from_source(receiver, "198.51.100.4"))
                .await
                .is_ok()
        );
    }
}

#[tokio::test]
async fn test_custom_limit_from_config() {
    let h = harness()
        .env("RATE_LIMIT_MAX_SENDS", "2")
        .counters(MemoryCounterStore::new())
        .build();
    let receiver = h.seed_profile(ProfileSeed::default());

    for _ in 0..2 {
        h.context
            .submissions
            .submit(from_source(receiver, "198.51.100.4"))
            .await
            .unwrap();
    }
    assert_eq!(
        h.context
            .submissions
            .submit(from_source(receiver, "198.51.100.4"))
            .await
            .unwrap_err(),
        Rejection::RateLimited
    );
}
