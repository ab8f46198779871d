//! Retrying fetcher against a mock vendor: throttling (429 and 403),
//! exhaustion and undecodable payloads.

mod helpers;

use std::time::Duration;

use serde_json::json;
use threat_harvest::EventKind;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::recording_fetcher;

#[tokio::test]
async fn test_throttled_twice_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let (fetcher, sleeper, stats) = recording_fetcher(5);
    let body = fetcher
        .fetch_json(&format!("{}/feed", server.uri()), &[], &[])
        .await;

    assert_eq!(body, Some(json!({"ok": true})));
    let sleeps = sleeper.recorded();
    assert_eq!(sleeps.len(), 2, "one backoff per throttled response");
    assert!(sleeps[0] >= Duration::from_secs(1) && sleeps[0] < Duration::from_millis(1500));
    assert!(sleeps[1] >= Duration::from_secs(2) && sleeps[1] < Duration::from_millis(2500));
    assert_eq!(stats.get(EventKind::ThrottledResponse), 2);
    assert_eq!(stats.get(EventKind::SourceUnavailable), 0);
}

#[tokio::test]
async fn test_forbidden_is_throttling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(403))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let (fetcher, sleeper, stats) = recording_fetcher(5);
    let body = fetcher
        .fetch_json(&format!("{}/feed", server.uri()), &[], &[])
        .await;

    assert_eq!(body, Some(json!({"ok": true})));
    let sleeps = sleeper.recorded();
    assert_eq!(sleeps.len(), 1);
    assert!(sleeps[0] >= Duration::from_secs(1) && sleeps[0] < Duration::from_millis(1500));
    assert_eq!(stats.get(EventKind::ThrottledResponse), 1);
    assert_eq!(stats.get(EventKind::SourceUnavailable), 0);
}

#[tokio::test]
async fn test_exhaustion_returns_none_without_final_sleep() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let (fetcher, sleeper, stats) = recording_fetcher(3);
    let body = fetcher
        .fetch_text(&format!("{}/down", server.uri()), &[], &[])
        .await;

    assert!(body.is_none());
    assert_eq!(sleeper.recorded().len(), 2);
    assert_eq!(stats.get(EventKind::HttpStatusError), 3);
    assert_eq!(stats.get(EventKind::SourceUnavailable), 1);
}

#[tokio::test]
async fn test_undecodable_json_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let (fetcher, sleeper, stats) = recording_fetcher(5);
    let body = fetcher
        .fetch_json(&format!("{}/broken", server.uri()), &[], &[])
        .await;

    assert!(body.is_none());
    assert!(sleeper.recorded().is_empty());
    assert_eq!(stats.get(EventKind::UndecodablePayload), 1);
}

#[tokio::test]
async fn test_connection_refused_counts_transport_errors() {
    // Bind then drop a server so the port is closed.
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let (fetcher, sleeper, stats) = recording_fetcher(2);
    assert!(fetcher.fetch_text(&uri, &[], &[]).await.is_none());
    assert_eq!(sleeper.recorded().len(), 1);
    assert_eq!(stats.get(EventKind::TransportError), 2);
}

#[tokio::test]
async fn test_params_and_pinned_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/q"))
        .and(query_param("outbreak_id", "0"))
        .and(header("user-agent", "pinned-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fine"))
        .expect(1)
        .mount(&server)
        .await;

    let (fetcher, _, _) = recording_fetcher(1);
    let body = fetcher
        .fetch_text(
            &format!("{}/q", server.uri()),
            &[("outbreak_id", "0")],
            &[(reqwest::header::USER_AGENT, "pinned-agent")],
        )
        .await;
    assert_eq!(body.as_deref(), Some("fine"));
}

#[tokio::test]
async fn test_rotated_user_agent_comes_from_pool() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let (fetcher, _, _) = recording_fetcher(1);
    fetcher.fetch_text(&server.uri(), &[], &[]).await;

    let requests = server.received_requests().await.unwrap();
    let agent = requests[0].headers.get("user-agent").unwrap().to_str().unwrap();
    assert!(threat_harvest::config::USER_AGENTS.contains(&agent));
}
