//! End-to-end token refresh against a mock backend.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use pms_application::{ApiError, AuthenticatedClient, SessionEvents, TokenStore};
use pms_domain::{AccessToken, ApiRequest, ClientSettings, SessionEvent, StatusCode, TerminationReason, TokenPair};
use pms_infrastructure::{FileTokenStore, ReqwestHttpClient};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_NOT_VALID: &str = "Given token not valid for any token type";

struct Harness {
    server: MockServer,
    client: AuthenticatedClient,
    store: Arc<FileTokenStore>,
    events: SessionEvents,
    _dir: TempDir,
}

async fn harness() -> Harness {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileTokenStore::open(dir.path().join("session.json")).await);
    store.set_tokens(TokenPair::new("tok1", "r1")).await.unwrap();

    let http = ReqwestHttpClient::new(&ClientSettings {
        base_url: format!("{}/api/", server.uri()),
        timeout_secs: 5,
        ..ClientSettings::default()
    })
    .unwrap();
    let events = SessionEvents::new();
    let client = AuthenticatedClient::new(Arc::new(http), store.clone(), events.clone());

    Harness {
        server,
        client,
        store,
        events,
        _dir: dir,
    }
}

async fn mount_expired_token(server: &MockServer) {
    Mock::given(header("authorization", "Bearer tok1"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "detail": TOKEN_NOT_VALID, "code": "token_not_valid" })),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn concurrent_401s_share_one_refresh() {
    let h = harness().await;
    mount_expired_token(&h.server).await;
    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .and(body_json(json!({ "refresh": "r1" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access": "tok2" }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer tok2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .expect(3)
        .mount(&h.server)
        .await;

    let (a, b, c) = tokio::join!(
        h.client.send(ApiRequest::get("properties/")),
        h.client.send(ApiRequest::get("tenants/")),
        h.client.send(ApiRequest::get("leases/")),
    );

    for outcome in [a, b, c] {
        assert_eq!(outcome.unwrap().status, StatusCode::OK);
    }
    assert_eq!(h.store.access_token(), Some(AccessToken::new("tok2")));

    let retried: Vec<_> = h
        .server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "GET")
        .filter_map(|r| {
            r.headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .filter(|v| v == "Bearer tok2")
        .collect();
    assert_eq!(retried.len(), 3);
}

#[tokio::test]
async fn rejected_refresh_ends_the_session() {
    let h = harness().await;
    let mut events = h.events.subscribe();
    mount_expired_token(&h.server).await;
    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "refresh": ["This field is required."] })),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "detail": "Authentication credentials were not provided." })),
        )
        .mount(&h.server)
        .await;

    let error = h.client.send(ApiRequest::get("payments/")).await.unwrap_err();

    match error {
        ApiError::Status { status, body } => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body.detail.as_deref(), Some(TOKEN_NOT_VALID));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(h.store.access_token(), None);
    assert_eq!(h.store.refresh_token(), None);
    assert!(!h.store.path().exists());
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::Terminated {
            reason: TerminationReason::RefreshFailed
        }
    );

    let later = h.client.send(ApiRequest::get("payments/")).await.unwrap_err();
    assert!(later.is_unauthorized());
    let requests = h.server.received_requests().await.unwrap();
    let last = requests.last().unwrap();
    assert_eq!(last.url.path(), "/api/payments/");
    assert!(last.headers.get("authorization").is_none());
}

#[tokio::test]
async fn list_query_reaches_the_server() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/maintenance/"))
        .and(header("authorization", "Bearer tok1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 0, "next": null, "previous": null, "results": []
        })))
        .mount(&h.server)
        .await;

    let response = h
        .client
        .send(ApiRequest::get("maintenance/").with_query(vec![
            ("status".to_string(), "open".to_string()),
            ("page".to_string(), "2".to_string()),
        ]))
        .await
        .unwrap();

    assert!(response.is_success());
    let requests = h.server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("status=open&page=2"));
    assert!(requests[0].headers.get("x-request-id").is_some());
}
