//! API client request flow: bearer auth, the single 401 retry, and error mapping

use auractl_core::{
    ApiClient, CachedToken, CoreError, Credential, CredentialStore, Credentials, TokenManager,
};
use chrono::{TimeDelta, Utc};
use reqwest::StatusCode;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Fixture {
    _dir: TempDir,
    store: CredentialStore,
    base_url: String,
    auth_url: String,
}

impl Fixture {
    /// Credentials seeded with a cached token that looks valid to the client
    fn new(server: &MockServer) -> Self {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::in_dir(dir.path());
        let mut credential = Credential::new("default", "client", "secret");
        credential.token = Some(CachedToken {
            access_token: "stale-token".to_string(),
            expires_at: Utc::now() + TimeDelta::hours(1),
        });
        let mut creds = Credentials::default();
        creds.add(credential).unwrap();
        store.save(&creds).unwrap();

        Self {
            _dir: dir,
            store,
            base_url: format!("{}/v1", server.uri()),
            auth_url: format!("{}/oauth/token", server.uri()),
        }
    }

    fn client(&self) -> ApiClient {
        let http = ApiClient::build_http_client().unwrap();
        let tokens = TokenManager::new(self.store.clone(), "default", &self.auth_url, http.clone());
        ApiClient::new(&self.base_url, tokens, http)
    }
}

async fn mount_token_endpoint(server: &MockServer, token: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "expires_in": 3600
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn api_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().starts_with("/v1/"))
        .count()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_successful_request_sends_bearer_token() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "unused", 0).await;
    Mock::given(method("GET"))
        .and(path("/v1/tenants"))
        .and(header("authorization", "Bearer stale-token"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "t1", "name": "Personal"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = Fixture::new(&server);
    let response = tokio::task::spawn_blocking(move || fixture.client().get("/tenants"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    let value = response.json_value().unwrap();
    assert_eq!(value["data"][0]["id"], "t1");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_single_401_refreshes_and_retries_once() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "fresh-token", 1).await;
    Mock::given(method("POST"))
        .and(path("/v1/instances/abc/pause"))
        .and(header("authorization", "Bearer stale-token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/instances/abc/pause"))
        .and(header("authorization", "Bearer fresh-token"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "data": {"id": "abc", "status": "pausing"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = Fixture::new(&server);
    let response = tokio::task::spawn_blocking(move || {
        fixture.client().post("/instances/abc/pause", &json!({}))
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.json_value().unwrap()["data"]["status"], "pausing");
    assert_eq!(api_requests(&server).await, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_second_401_is_auth_error_without_third_attempt() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "fresh-token", 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/instances"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let fixture = Fixture::new(&server);
    let err = tokio::task::spawn_blocking(move || fixture.client().get("/instances"))
        .await
        .unwrap()
        .unwrap_err();

    assert!(err.is_auth());
    assert_eq!(api_requests(&server).await, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_structured_error_is_surfaced_verbatim() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "unused", 0).await;
    Mock::given(method("POST"))
        .and(path("/v1/instances"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": [
                {"message": "Memory is not valid for this tier", "reason": "invalid-memory", "field": "memory"},
                {"message": "Region not available", "reason": "invalid-region"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = Fixture::new(&server);
    let err = tokio::task::spawn_blocking(move || {
        fixture
            .client()
            .post("/instances", &json!({"name": "x", "memory": "3GB"}))
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(err.is_bad_request());
    let errors = err.api_errors();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].reason, "invalid-memory");
    assert_eq!(errors[0].field.as_deref(), Some("memory"));
    assert_eq!(errors[1].field, None);
    assert_eq!(
        err.to_string(),
        "API error (HTTP 400): Memory is not valid for this tier (field: memory); Region not available"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unstructured_error_keeps_body() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "unused", 0).await;
    Mock::given(method("GET"))
        .and(path("/v1/instances/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&server)
        .await;

    let fixture = Fixture::new(&server);
    let err = tokio::task::spawn_blocking(move || fixture.client().get("/instances/missing"))
        .await
        .unwrap()
        .unwrap_err();

    assert!(err.is_not_found());
    match err {
        CoreError::Api { errors, body, .. } => {
            assert!(errors.is_empty());
            assert_eq!(body, "not here");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_errors_are_not_retried() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "unused", 0).await;
    Mock::given(method("DELETE"))
        .and(path("/v1/instances/abc"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = Fixture::new(&server);
    let err = tokio::task::spawn_blocking(move || fixture.client().delete("/instances/abc"))
        .await
        .unwrap()
        .unwrap_err();

    assert_eq!(err.status(), Some(503));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connection_failure_is_transport_error() {
    let server = MockServer::start().await;
    let mut fixture = Fixture::new(&server);
    fixture.base_url = "http://127.0.0.1:1/v1".to_string();

    let err = tokio::task::spawn_blocking(move || fixture.client().get("/tenants"))
        .await
        .unwrap()
        .unwrap_err();

    assert!(err.is_transport());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_json_reports_unexpected_shape() {
    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct Tenant {
        id: String,
    }

    let server = MockServer::start().await;
    mount_token_endpoint(&server, "unused", 0).await;
    Mock::given(method("GET"))
        .and(path("/v1/tenants/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;

    let fixture = Fixture::new(&server);
    let err = tokio::task::spawn_blocking(move || {
        fixture.client().get_json::<Tenant>("/tenants/t1")
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(matches!(err, CoreError::UnexpectedResponse { .. }));
}
