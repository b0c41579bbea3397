//! Integration tests for FHIR delivery against a mock server

use hl7bridge::adapters::fhir::{FhirDeliveryClient, FsDeadLetterStore, RetryPolicy};
use hl7bridge::config::secret_string;
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        backoff_base: Duration::from_millis(5),
        jitter: Duration::ZERO,
    }
}

fn bundle() -> Value {
    json!({
        "resourceType": "Bundle",
        "id": "b-1",
        "type": "transaction",
        "entry": [{"resource": {"resourceType": "Patient", "id": "p-1"}}]
    })
}

#[tokio::test]
async fn test_retry_after_throttle_then_delivered() {
    let mut server = Server::new_async().await;
    let throttled = server
        .mock("POST", "/fhir")
        .with_status(429)
        .expect(1)
        .create_async()
        .await;
    let created = server
        .mock("POST", "/fhir")
        .match_header("content-type", "application/fhir+json")
        .with_status(201)
        .with_body("{\"resourceType\":\"Bundle\"}")
        .expect(1)
        .create_async()
        .await;

    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FsDeadLetterStore::new(temp_dir.path().join("dl")));
    let client = FhirDeliveryClient::new(
        &format!("{}/fhir", server.url()),
        Duration::from_secs(5),
        fast_policy(3),
        store,
    )
    .unwrap();

    let outcome = client.post(&bundle()).await;

    assert!(outcome.delivered);
    assert_eq!(outcome.status_code, 201);
    assert_eq!(outcome.attempts, 2);
    throttled.assert_async().await;
    created.assert_async().await;
    assert!(!temp_dir.path().join("dl").exists());
}

#[tokio::test]
async fn test_server_error_without_retries_dead_letters() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("POST", "/fhir")
        .with_status(500)
        .with_body("{\"issue\":[{\"severity\":\"fatal\"}]}")
        .expect(1)
        .create_async()
        .await;

    let temp_dir = TempDir::new().unwrap();
    let store = FsDeadLetterStore::new(temp_dir.path());
    let (request_path, response_path) = store.paths_for("b-1");
    let client = FhirDeliveryClient::new(
        &format!("{}/fhir", server.url()),
        Duration::from_secs(5),
        fast_policy(0),
        Arc::new(store),
    )
    .unwrap();

    let outcome = client.post(&bundle()).await;

    assert!(!outcome.delivered);
    assert_eq!(outcome.status_code, 500);
    assert_eq!(outcome.attempts, 1);
    failing.assert_async().await;

    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(request_path).unwrap()).unwrap();
    assert_eq!(written, bundle());
    assert_eq!(
        std::fs::read_to_string(response_path).unwrap(),
        "{\"issue\":[{\"severity\":\"fatal\"}]}"
    );
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mut server = Server::new_async().await;
    let bad_request = server
        .mock("POST", "/fhir")
        .with_status(400)
        .expect(1)
        .create_async()
        .await;

    let temp_dir = TempDir::new().unwrap();
    let client = FhirDeliveryClient::new(
        &format!("{}/fhir", server.url()),
        Duration::from_secs(5),
        fast_policy(3),
        Arc::new(FsDeadLetterStore::new(temp_dir.path())),
    )
    .unwrap();

    let outcome = client.post(&bundle()).await;

    assert!(!outcome.delivered);
    assert_eq!(outcome.status_code, 400);
    assert_eq!(outcome.attempts, 1);
    bad_request.assert_async().await;
}

#[tokio::test]
async fn test_retries_exhausted_on_persistent_503() {
    let mut server = Server::new_async().await;
    let unavailable = server
        .mock("POST", "/fhir")
        .with_status(503)
        .expect(3)
        .create_async()
        .await;

    let temp_dir = TempDir::new().unwrap();
    let client = FhirDeliveryClient::new(
        &format!("{}/fhir", server.url()),
        Duration::from_secs(5),
        fast_policy(2),
        Arc::new(FsDeadLetterStore::new(temp_dir.path())),
    )
    .unwrap();

    let outcome = client.post(&bundle()).await;

    assert!(!outcome.delivered);
    assert_eq!(outcome.status_code, 503);
    assert_eq!(outcome.attempts, 3);
    unavailable.assert_async().await;
    assert!(temp_dir.path().join("b-1_request.json").exists());
}

#[tokio::test]
async fn test_bearer_token_and_headers_are_sent() {
    let mut server = Server::new_async().await;
    let created = server
        .mock("POST", "/fhir")
        .match_header("authorization", "Bearer s3cret")
        .match_header("accept", "application/fhir+json")
        .match_header("prefer", "handling=strict")
        .match_body(Matcher::PartialJson(json!({"id": "b-1"})))
        .with_status(200)
        .create_async()
        .await;

    let temp_dir = TempDir::new().unwrap();
    let client = FhirDeliveryClient::new(
        &format!("{}/fhir/", server.url()),
        Duration::from_secs(5),
        fast_policy(0),
        Arc::new(FsDeadLetterStore::new(temp_dir.path())),
    )
    .unwrap()
    .with_token(secret_string("s3cret".to_string()));

    let outcome = client.post(&bundle()).await;

    assert!(outcome.delivered);
    assert_eq!(outcome.status_code, 200);
    created.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_endpoint_reports_status_zero() {
    // Bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let temp_dir = TempDir::new().unwrap();
    let store = FsDeadLetterStore::new(temp_dir.path());
    let (request_path, response_path) = store.paths_for("b-1");
    let client = FhirDeliveryClient::new(
        &format!("http://127.0.0.1:{port}/fhir"),
        Duration::from_secs(2),
        fast_policy(1),
        Arc::new(store),
    )
    .unwrap();

    let outcome = client.post(&bundle()).await;

    assert!(!outcome.delivered);
    assert_eq!(outcome.status_code, 0);
    assert_eq!(outcome.attempts, 2);
    assert!(request_path.exists());
    assert_eq!(std::fs::read_to_string(response_path).unwrap(), "");
}
