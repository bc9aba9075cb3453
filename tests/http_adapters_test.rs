// ============================================================================
// HTTP Adapter Tests
// ============================================================================
//
// PostgREST record store, GoTrue identity and the email dispatcher against
// a wiremock server.
//
// ============================================================================

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use replied_config::NotificationConfig;
use replied_server::identity::{IdentityError, IdentityProvider, SupabaseIdentity};
use replied_server::notification::{DeliveryOutcome, Notification, NotificationDispatcher, Notifier};
use replied_server::repository::MessageRepository;
use replied_server::store::{Filter, PostgrestStore, RecordStore, StoreError};
use replied_types::{MessageStatus, NewMessage};

use std::sync::Arc;

// ============================================================================
// PostgREST
// ============================================================================

#[tokio::test]
async fn test_postgrest_insert_returns_assigned_id() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/messages"))
        .and(header("apikey", "service-role"))
        .and(header("authorization", "Bearer service-role"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(json!({"content": "sealed", "status": "pending"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": id.to_string()}])))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(PostgrestStore::new(
        reqwest::Client::new(),
        &server.uri(),
        "service-role",
    ));
    let repository = MessageRepository::new(store);

    let inserted = repository
        .insert_message(&NewMessage::pending(Uuid::new_v4(), "sealed".into()))
        .await
        .unwrap();
    assert_eq!(inserted, id);
}

#[tokio::test]
async fn test_postgrest_thread_root_query_params() {
    let server = MockServer::start().await;
    let thread = Uuid::new_v4();
    let sender = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/messages"))
        .and(query_param("thread_id", format!("eq.{}", thread)))
        .and(query_param("order", "created_at.asc"))
        .and(query_param("limit", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"sender_id": sender.to_string()}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(PostgrestStore::new(
        reqwest::Client::new(),
        &server.uri(),
        "service-role",
    ));
    let root = MessageRepository::new(store)
        .thread_root(thread)
        .await
        .unwrap()
        .expect("root");
    assert_eq!(root.sender_id, Some(sender));
}

#[tokio::test]
async fn test_postgrest_closed_messages_excludes_pending() {
    let server = MockServer::start().await;
    let owner = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/messages"))
        .and(query_param("receiver_id", format!("eq.{}", owner)))
        .and(query_param("status", "neq.pending"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(PostgrestStore::new(
        reqwest::Client::new(),
        &server.uri(),
        "service-role",
    ));
    let closed = MessageRepository::new(store)
        .closed_messages(owner)
        .await
        .unwrap();
    assert!(closed.is_empty());
}

#[tokio::test]
async fn test_postgrest_get_returns_none_for_empty_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let store = PostgrestStore::new(reqwest::Client::new(), &server.uri(), "service-role");
    let found = store
        .get("profiles", &Filter::new().eq("id", Uuid::new_v4()))
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_postgrest_update_patches_by_id() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/messages"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(body_partial_json(json!({"status": "archived"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(PostgrestStore::new(
        reqwest::Client::new(),
        &server.uri(),
        "service-role",
    ));
    MessageRepository::new(store)
        .set_status(id, MessageStatus::Archived)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_postgrest_server_error_surfaces_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let store = PostgrestStore::new(reqwest::Client::new(), &server.uri(), "service-role");
    let err = store
        .query("messages", &Filter::new(), None, None)
        .await
        .unwrap_err();

    match err {
        StoreError::Server { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_profile_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"is_paused": "definitely"}])),
        )
        .mount(&server)
        .await;

    let store = Arc::new(PostgrestStore::new(
        reqwest::Client::new(),
        &server.uri(),
        "service-role",
    ));
    let err = MessageRepository::new(store)
        .recipient_policy(Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Decode(_)));
}

// ============================================================================
// Identity
// ============================================================================

#[tokio::test]
async fn test_identity_resolves_principal() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer user-token"))
        .and(header("apikey", "service-role"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": user_id.to_string(),
            "email": "bob@example.com",
            "aud": "authenticated"
        })))
        .mount(&server)
        .await;

    let identity = SupabaseIdentity::new(reqwest::Client::new(), &server.uri(), "service-role");
    let principal = identity.verify("user-token").await.unwrap();
    assert_eq!(principal.user_id, user_id);
}

#[tokio::test]
async fn test_identity_rejects_unauthorized_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let identity = SupabaseIdentity::new(reqwest::Client::new(), &server.uri(), "service-role");
    assert!(matches!(
        identity.verify("expired").await,
        Err(IdentityError::Invalid)
    ));
}

#[tokio::test]
async fn test_identity_outage_is_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let identity = SupabaseIdentity::new(reqwest::Client::new(), &server.uri(), "service-role");
    assert!(matches!(
        identity.verify("token").await,
        Err(IdentityError::Transport(_))
    ));
}

// ============================================================================
// Notification
// ============================================================================

fn notification() -> Notification {
    Notification {
        contact: "alice@example.com".into(),
        display_name: "Alice".into(),
        content: "hello".into(),
    }
}

fn dispatcher(server: &MockServer) -> NotificationDispatcher {
    NotificationDispatcher::new(
        reqwest::Client::new(),
        NotificationConfig {
            api_key: Some("re_test".into()),
            endpoint: format!("{}/emails", server.uri()),
            ..NotificationConfig::default()
        },
    )
}

#[tokio::test]
async fn test_dispatcher_posts_email_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(header("authorization", "Bearer re_test"))
        .and(body_partial_json(json!({
            "from": "Replied <noreply@marvlock.dev>",
            "to": ["alice@example.com"],
            "subject": "New Anonymous Message Received!"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "email_1"})))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = dispatcher(&server).notify(notification()).await;
    assert_eq!(outcome, DeliveryOutcome::Sent);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let html = body["html"].as_str().unwrap();
    assert!(html.contains("Alice"));
    assert!(html.contains("hello"));
}

#[tokio::test]
async fn test_dispatcher_drops_rejected_delivery() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422).set_body_string("invalid recipient"))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = dispatcher(&server).notify(notification()).await;
    assert_eq!(outcome, DeliveryOutcome::Rejected(422));
}

#[tokio::test]
async fn test_dispatcher_transport_error() {
    let dispatcher = NotificationDispatcher::new(
        reqwest::Client::new(),
        NotificationConfig {
            api_key: Some("re_test".into()),
            endpoint: "http://127.0.0.1:1/emails".into(),
            ..NotificationConfig::default()
        },
    );

    let outcome = dispatcher.notify(notification()).await;
    assert_eq!(outcome, DeliveryOutcome::TransportError);
}
