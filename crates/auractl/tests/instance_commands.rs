//! End-to-end command runs against a mock Aura API

use assert_cmd::Command;
use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use serde_json::json;
use std::process::Output;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INSTANCE_ID: &str = "2f49c2b3";

struct Fixture {
    server: MockServer,
    dir: TempDir,
}

impl Fixture {
    async fn start() -> Self {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "token-1",
                "token_type": "bearer",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;

        let fixture = Self {
            server,
            dir: TempDir::new().unwrap(),
        };
        fixture
            .run(&[
                "credential",
                "add",
                "--name",
                "default",
                "--client-id",
                "client",
                "--client-secret",
                "secret",
            ])
            .await
            .assert()
            .success();
        fixture
    }

    /// Run the binary on a blocking thread so the mock server keeps serving
    async fn run(&self, args: &[&str]) -> Output {
        let mut cmd = Command::cargo_bin("auractl").unwrap();
        cmd.arg("--config-dir")
            .arg(self.dir.path())
            .arg("--base-url")
            .arg(format!("{}/v1", self.server.uri()))
            .arg("--auth-url")
            .arg(format!("{}/oauth/token", self.server.uri()))
            .args(["--poll-interval", "0"])
            .args(args)
            .env("NO_COLOR", "1")
            .env_remove("AURA_CREDENTIAL")
            .env_remove("AURA_OUTPUT")
            .env_remove("RUST_LOG");

        tokio::task::spawn_blocking(move || cmd.output().unwrap())
            .await
            .unwrap()
    }

    async fn mount_status(&self, status: &str, times: Option<u64>) {
        let mock = Mock::given(method("GET"))
            .and(path(format!("/v1/instances/{INSTANCE_ID}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"id": INSTANCE_ID, "name": "production", "status": status}
            })));
        match times {
            Some(n) => mock.up_to_n_times(n).mount(&self.server).await,
            None => mock.mount(&self.server).await,
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_free_instance_and_await() {
    let fx = Fixture::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/instances"))
        .and(header("authorization", "Bearer token-1"))
        .and(body_partial_json(json!({
            "name": "production",
            "type": "free-db",
            "tenant_id": "tenant-1",
            "region": "europe-west1",
            "memory": "1GB",
            "version": "5",
            "cloud_provider": "gcp"
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "data": {
                "id": INSTANCE_ID,
                "name": "production",
                "connection_url": "neo4j+s://2f49c2b3.databases.neo4j.io",
                "username": "neo4j",
                "password": "generated"
            }
        })))
        .expect(1)
        .mount(&fx.server)
        .await;
    fx.mount_status("creating", Some(1)).await;
    fx.mount_status("running", None).await;

    fx.run(&[
        "instance",
        "create",
        "--name",
        "production",
        "--type",
        "free-db",
        "--cloud-provider",
        "gcp",
        "--tenant-id",
        "tenant-1",
        "--await",
    ])
    .await
    .assert()
    .success()
    .stdout(predicate::str::contains(INSTANCE_ID))
    .stderr(predicate::str::contains("Instance Status: running"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_await_timeout_exits_non_zero() {
    let fx = Fixture::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1/instances/{INSTANCE_ID}/resume")))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "data": {"id": INSTANCE_ID, "status": "resuming"}
        })))
        .mount(&fx.server)
        .await;
    fx.mount_status("resuming", None).await;

    fx.run(&[
        "--poll-max-retries",
        "2",
        "instance",
        "resume",
        INSTANCE_ID,
        "--await",
    ])
    .await
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("Timed out"))
    .stderr(predicate::str::contains("resuming"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_pause_waits_for_paused() {
    let fx = Fixture::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1/instances/{INSTANCE_ID}/pause")))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "data": {"id": INSTANCE_ID, "status": "pausing"}
        })))
        .expect(1)
        .mount(&fx.server)
        .await;
    // "running" is settled for a create but not where a pause is heading
    fx.mount_status("running", Some(1)).await;
    fx.mount_status("paused", None).await;

    fx.run(&["instance", "pause", INSTANCE_ID, "--await"])
        .await
        .assert()
        .success()
        .stderr(predicate::str::contains("Instance Status: paused"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_await_treats_not_found_as_gone() {
    let fx = Fixture::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("/v1/instances/{INSTANCE_ID}")))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "data": {"id": INSTANCE_ID, "status": "destroying"}
        })))
        .expect(1)
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/instances/{INSTANCE_ID}")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{"message": "DB not found", "reason": "db-not-found"}]
        })))
        .mount(&fx.server)
        .await;

    fx.run(&["instance", "delete", INSTANCE_ID, "--await"])
        .await
        .assert()
        .success()
        .stderr(predicate::str::contains("Instance Status: deleted"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_snapshot_reports_detail() {
    let fx = Fixture::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1/instances/{INSTANCE_ID}/snapshots")))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "data": {"snapshot_id": "snap-1"}
        })))
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/instances/{INSTANCE_ID}/snapshots/snap-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "snapshot_id": "snap-1",
                "instance_id": INSTANCE_ID,
                "status": "Failed",
                "error": "disk quota exceeded"
            }
        })))
        .mount(&fx.server)
        .await;

    fx.run(&[
        "instance",
        "snapshot",
        "create",
        "--instance-id",
        INSTANCE_ID,
        "--await",
    ])
    .await
    .assert()
    .failure()
    .stderr(predicate::str::contains("disk quota exceeded"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_as_table_with_tenant_filter() {
    let fx = Fixture::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/instances"))
        .and(query_param("tenantId", "tenant-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "a1", "name": "alpha", "tenant_id": "tenant-1", "cloud_provider": "gcp"},
                {"id": "b2", "name": "beta", "tenant_id": "tenant-1", "cloud_provider": "aws"}
            ]
        })))
        .expect(1)
        .mount(&fx.server)
        .await;

    fx.run(&["-o", "table", "instance", "list", "--tenant-id", "tenant-1"])
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha"))
        .stdout(predicate::str::contains("beta"))
        .stdout(predicate::str::contains("cloud_provider"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_api_error_is_reported() {
    let fx = Fixture::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tenants/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{"message": "Tenant not found", "reason": "tenant-not-found"}]
        })))
        .mount(&fx.server)
        .await;

    fx.run(&["tenant", "get", "missing"])
        .await
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Tenant not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_raw_api_call_refreshes_after_401() {
    let fx = Fixture::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tenants"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/tenants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "tenant-1", "name": "Production"}]
        })))
        .mount(&fx.server)
        .await;

    fx.run(&["api", "get", "tenants"])
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains("Production"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_logout_forces_new_token() {
    let fx = Fixture::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tenants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&fx.server)
        .await;

    fx.run(&["tenant", "list"]).await.assert().success();
    let stored = std::fs::read_to_string(fx.dir.path().join("credentials.json")).unwrap();
    assert!(stored.contains("token-1"));

    fx.run(&["credential", "logout"]).await.assert().success();
    let stored = std::fs::read_to_string(fx.dir.path().join("credentials.json")).unwrap();
    assert!(!stored.contains("token-1"));
    assert!(stored.contains("client"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_snapshot_list_dispatches_through_instance() {
    let fx = Fixture::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/instances/{INSTANCE_ID}/snapshots")))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"snapshot_id": "snap-1", "instance_id": INSTANCE_ID, "status": "Completed"}
            ]
        })))
        .expect(1)
        .mount(&fx.server)
        .await;

    fx.run(&["instance", "snapshot", "list", "--instance-id", INSTANCE_ID])
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains("snap-1"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_graphql_create_rejects_malformed_schema_locally() {
    let fx = Fixture::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1/instances/{INSTANCE_ID}/data-apis/graphql")))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&fx.server)
        .await;

    // base64 of "type Movie {"
    fx.run(&[
        "data-api",
        "graphql",
        "create",
        "--instance-id",
        INSTANCE_ID,
        "--name",
        "movies",
        "--instance-username",
        "neo4j",
        "--instance-password",
        "pw",
        "--type-definitions",
        "dHlwZSBNb3ZpZSB7",
    ])
    .await
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("type definitions are invalid"));
}
