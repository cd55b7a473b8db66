//! Live collection tests against a simulated event-stream backend.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crag_auth::Unauthenticated;
use crag_models::{Boulder, Grade, HoldColor};
use crag_realtime::{BoulderRepository, RtdbClient, RtdbConfig, RtdbError};

fn client_for(server: &MockServer) -> RtdbClient {
    RtdbClient::new(
        RtdbConfig {
            database_url: server.uri(),
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
        },
        Arc::new(Unauthenticated),
    )
    .expect("client")
}

fn sse_body(frames: &[&str]) -> String {
    frames
        .iter()
        .map(|f| format!("{}\n\n", f))
        .collect::<Vec<_>>()
        .join("")
}

#[tokio::test]
async fn watch_emits_the_initial_snapshot_with_keys() {
    let server = MockServer::start().await;
    let body = sse_body(&[&format!(
        "event: put\ndata: {}",
        json!({
            "path": "/",
            "data": {
                "-N1": {
                    "note": "crack problem",
                    "wall": "wall-3",
                    "grade": "6a",
                    "active": true,
                    "color": "red",
                    "setterName": "Mara"
                }
            }
        })
    )]);
    Mock::given(method("GET"))
        .and(path("/boulders.json"))
        .and(header("Accept", "text/event-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let repo = BoulderRepository::new(client_for(&server));
    let mut stream = Box::pin(repo.watch());

    let emission = stream.next().await.expect("emission").expect("snapshot");
    assert_eq!(emission.len(), 1);
    assert_eq!(emission[0].key, "-N1");
    assert_eq!(emission[0].value.note, "crack problem");
    assert_eq!(emission[0].value.wall.as_str(), "wall-3");
    assert_eq!(emission[0].value.grade, Grade::F6a);
    assert!(emission[0].value.active);

    // Simulated server closes the stream after the body: terminal failure.
    assert!(matches!(
        stream.next().await.expect("item"),
        Err(RtdbError::ListenerClosed(_))
    ));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn malformed_snapshot_entries_are_dropped_from_emissions() {
    let server = MockServer::start().await;
    let body = sse_body(&[&format!(
        "event: put\ndata: {}",
        json!({
            "path": "/",
            "data": {
                "-N1": {
                    "note": "good one",
                    "wall": "wall-1",
                    "grade": "5",
                    "active": true,
                    "color": "blue",
                    "setterName": "Jo"
                },
                "-N2": {"note": "missing everything else"},
                "-N3": "not even an object",
                "-N4": {
                    "note": "also good",
                    "wall": "wall-2",
                    "grade": "7a",
                    "active": false,
                    "color": "black",
                    "setterName": "Sam"
                }
            }
        })
    )]);
    Mock::given(method("GET"))
        .and(path("/boulders.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let repo = BoulderRepository::new(client_for(&server));
    let mut stream = Box::pin(repo.watch());

    let emission = stream.next().await.expect("emission").expect("snapshot");
    assert_eq!(emission.len(), 2);
    assert_eq!(emission[0].key, "-N1");
    assert_eq!(emission[1].key, "-N4");
}

#[tokio::test]
async fn each_change_replaces_the_whole_sequence() {
    let server = MockServer::start().await;
    let boulder = |note: &str| {
        json!({
            "note": note,
            "wall": "wall-1",
            "grade": "6b",
            "active": true,
            "color": "green",
            "setterName": "Jo"
        })
    };
    let body = sse_body(&[
        &format!(
            "event: put\ndata: {}",
            json!({"path": "/", "data": {"-N1": boulder("first")}})
        ),
        "event: keep-alive\ndata: null",
        &format!(
            "event: put\ndata: {}",
            json!({"path": "/-N2", "data": boulder("second")})
        ),
        &format!("event: put\ndata: {}", json!({"path": "/-N1", "data": null})),
    ]);
    Mock::given(method("GET"))
        .and(path("/boulders.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let repo = BoulderRepository::new(client_for(&server));
    let mut stream = Box::pin(repo.watch());

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.len(), 1);

    let second = stream.next().await.unwrap().unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(second[1].value.note, "second");

    let third = stream.next().await.unwrap().unwrap();
    assert_eq!(third.len(), 1);
    assert_eq!(third[0].key, "-N2");
}

#[tokio::test]
async fn server_cancel_is_surfaced_as_permission_denied() {
    let server = MockServer::start().await;
    let body = sse_body(&[
        &format!("event: put\ndata: {}", json!({"path": "/", "data": null})),
        "event: cancel\ndata: null",
    ]);
    Mock::given(method("GET"))
        .and(path("/boulders.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let repo = BoulderRepository::new(client_for(&server));
    let mut stream = Box::pin(repo.watch());

    assert!(stream.next().await.unwrap().is_ok());
    assert!(matches!(
        stream.next().await.unwrap(),
        Err(RtdbError::PermissionDenied(_))
    ));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn rejected_subscription_fails_the_stream_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/boulders.json"))
        .respond_with(ResponseTemplate::new(401).set_body_raw("Unauthorized", "text/plain"))
        .mount(&server)
        .await;

    let repo = BoulderRepository::new(client_for(&server));
    let mut stream = Box::pin(repo.watch());

    assert!(matches!(
        stream.next().await.unwrap(),
        Err(RtdbError::AuthError(_))
    ));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn inserted_route_appears_in_the_next_emission_with_its_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/boulders.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "-NInserted"})))
        .mount(&server)
        .await;
    let body = sse_body(&[&format!(
        "event: put\ndata: {}",
        json!({
            "path": "/",
            "data": {
                "-NInserted": {
                    "note": "crack problem",
                    "wall": "wall-3",
                    "grade": "6a",
                    "active": true,
                    "color": "red",
                    "setterName": "Mara"
                }
            }
        })
    )]);
    Mock::given(method("GET"))
        .and(path("/boulders.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let repo = BoulderRepository::new(client_for(&server));
    let boulder = Boulder::new("crack problem", "wall-3", Grade::F6a, HoldColor::Red, "Mara");
    let key = repo.add(&boulder).await.expect("add");

    let mut stream = Box::pin(repo.watch());
    let emission = stream.next().await.unwrap().unwrap();
    assert_eq!(emission.len(), 1);
    assert_eq!(emission[0].key, key);
    assert!(!emission[0].key.is_empty());
    assert_eq!(emission[0].value, boulder);
}
