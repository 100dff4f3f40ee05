//! Integration tests for the alert source client against a mock API
//!
//! Covers the classification taxonomy (success, API error, offline,
//! malformed body, disabled) and the per-node resolution rules.

use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use node_status::alerts::{AlertSourceClient, AlertStatus, ApiFailure, render};
use node_status::config::AlertSourceConfig;
use node_status::recorder::Recorder;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Recorder that keeps lines in memory so tests can assert on them.
#[derive(Default)]
struct CaptureRecorder {
    trail: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl Recorder for CaptureRecorder {
    fn trail(&self, line: &str) {
        self.trail.lock().unwrap().push(line.to_string());
    }

    fn error(&self, line: &str) {
        self.trail.lock().unwrap().push(line.to_string());
        self.errors.lock().unwrap().push(line.to_string());
    }
}

fn source_config(base_url: &str, enabled: bool) -> AlertSourceConfig {
    AlertSourceConfig {
        enabled,
        base_url: base_url.to_string(),
        ..Default::default()
    }
}

fn client_with_recorder(base_url: &str, enabled: bool) -> (AlertSourceClient, Arc<CaptureRecorder>) {
    let recorder = Arc::new(CaptureRecorder::default());
    let client = AlertSourceClient::new(&source_config(base_url, enabled), recorder.clone());
    (client, recorder)
}

fn nodes(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

#[tokio::test]
async fn success_resolves_per_node_with_global_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .and(query_param("nodes", "100,200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "has_alerts": false,
            "alerts": [],
            "alerts_by_node": {
                "100": {
                    "has_alerts": true,
                    "alerts": [
                        {"event": "Tornado Warning", "severity": "Extreme", "headline": "Take cover"}
                    ]
                }
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, recorder) = client_with_recorder(&mock_server.uri(), true);
    let resolution = client.fetch(&nodes(&["100", "200"])).await;

    // node 100 has its own entry, node 200 falls back to the global set
    assert_matches!(resolution.for_node("100"), AlertStatus::Ready(set) if set.is_active());
    assert_matches!(resolution.for_node("200"), AlertStatus::Ready(set) if !set.is_active());

    let rendered_100 = match resolution.for_node("100") {
        AlertStatus::Ready(set) => render(true, set, None, Some(500)),
        _ => unreachable!(),
    };
    assert!(rendered_100.contains("Tornado Warning"));

    let rendered_200 = match resolution.for_node("200") {
        AlertStatus::Ready(set) => render(true, set, None, Some(500)),
        _ => unreachable!(),
    };
    assert!(rendered_200.contains("No Alerts"));

    // the successful fetch left a trail line with the node keys
    let trail = recorder.trail.lock().unwrap();
    assert!(trail.iter().any(|line| line.contains("ok") && line.contains("100")));
    assert!(recorder.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn http_error_status_classifies_as_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let (client, recorder) = client_with_recorder(&mock_server.uri(), true);
    let resolution = client.fetch(&nodes(&["100", "200"])).await;

    // every requested node degrades to the same error state
    assert_matches!(resolution.for_node("100"), AlertStatus::Failed(ApiFailure::Error));
    assert_matches!(resolution.for_node("200"), AlertStatus::Failed(ApiFailure::Error));

    // exactly one diagnostic line recording the status
    let errors = recorder.errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("503"));
    assert!(errors[0].contains("maintenance"));
}

#[tokio::test]
async fn connection_refused_classifies_as_offline() {
    // grab a port nothing listens on
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let (client, recorder) = client_with_recorder(&format!("http://127.0.0.1:{port}"), true);
    let resolution = client.fetch(&nodes(&["100"])).await;

    assert_matches!(resolution.for_node("100"), AlertStatus::Failed(ApiFailure::Offline));
    assert_eq!(recorder.errors.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn slow_api_classifies_as_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"has_alerts": false}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let recorder = Arc::new(CaptureRecorder::default());
    let client = AlertSourceClient::with_timeout(
        &source_config(&mock_server.uri(), true),
        recorder.clone(),
        Duration::from_millis(100),
    );
    let resolution = client.fetch(&nodes(&["100"])).await;

    assert_matches!(resolution.for_node("100"), AlertStatus::Failed(ApiFailure::Timeout));
    assert_eq!(recorder.errors.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn unusable_base_url_degrades_instead_of_aborting() {
    let (client, recorder) = client_with_recorder("not a url", true);
    let resolution = client.fetch(&nodes(&["100", "200"])).await;

    // every node gets the error placeholder state; the run carries on
    assert_matches!(resolution.for_node("100"), AlertStatus::Failed(ApiFailure::Error));
    assert_matches!(resolution.for_node("200"), AlertStatus::Failed(ApiFailure::Error));

    let errors = recorder.errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("not a url"));
}

#[tokio::test]
async fn disabled_source_with_unusable_url_stays_disabled() {
    let (client, recorder) = client_with_recorder("not a url", false);
    let resolution = client.fetch(&nodes(&["100"])).await;

    assert_matches!(resolution.for_node("100"), AlertStatus::Disabled);
    assert!(recorder.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn non_object_body_classifies_as_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[1, 2, 3]"))
        .mount(&mock_server)
        .await;

    let (client, _recorder) = client_with_recorder(&mock_server.uri(), true);
    let resolution = client.fetch(&nodes(&["100"])).await;

    assert_matches!(resolution.for_node("100"), AlertStatus::Failed(ApiFailure::Error));
}

#[tokio::test]
async fn unparseable_body_classifies_as_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&mock_server)
        .await;

    let (client, recorder) = client_with_recorder(&mock_server.uri(), true);
    let resolution = client.fetch(&nodes(&["100"])).await;

    assert_matches!(resolution.for_node("100"), AlertStatus::Failed(ApiFailure::Error));
    let errors = recorder.errors.lock().unwrap();
    assert!(errors[0].contains("malformed"));
}

#[tokio::test]
async fn disabled_source_never_contacts_the_api() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"has_alerts": true})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (client, recorder) = client_with_recorder(&mock_server.uri(), false);
    let resolution = client.fetch(&nodes(&["100"])).await;

    assert_matches!(resolution.for_node("100"), AlertStatus::Disabled);
    assert!(recorder.errors.lock().unwrap().is_empty());

    // wiremock verifies expect(0) when the server drops
}

#[tokio::test]
async fn empty_node_list_returns_single_global_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "has_alerts": true,
            "alerts": [{"event": "Flood Watch", "severity": "Moderate", "headline": ""}]
        })))
        .mount(&mock_server)
        .await;

    let (client, _recorder) = client_with_recorder(&mock_server.uri(), true);
    let resolution = client.fetch(&[]).await;

    assert_matches!(resolution.global(), AlertStatus::Ready(set) if set.is_active());
    // any node id resolves to the global result when no per-node data exists
    assert_matches!(resolution.for_node("anything"), AlertStatus::Ready(set) if set.is_active());
}

#[tokio::test]
async fn severity_unknown_to_the_client_still_renders() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "has_alerts": true,
            "alerts": [{"event": "Mystery Event", "severity": "Cataclysmic", "headline": ""}]
        })))
        .mount(&mock_server)
        .await;

    let (client, _recorder) = client_with_recorder(&mock_server.uri(), true);
    let resolution = client.fetch(&nodes(&["100"])).await;

    let rendered = match resolution.for_node("100") {
        AlertStatus::Ready(set) => render(true, set, None, Some(500)),
        other => panic!("unexpected status: {other:?}"),
    };
    // unknown severity renders with the Extreme (fail-safe) color
    assert!(rendered.contains("Mystery Event"));
    assert!(rendered.contains(node_status::Severity::Extreme.color()));
}
