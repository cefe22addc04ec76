//! End-to-end tests of the HTTP API against an in-process router

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use partycode_core::{is_valid_code, Clock, ManualClock, OsEntropy, CODE_LENGTH};
use partycode_server::{router, MemoryStore, Registry, SqliteStore};

fn app() -> (Router, Arc<Registry>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(
        DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
    ));
    let registry = Arc::new(Registry::with_sources(
        MemoryStore::new(),
        clock.clone(),
        Arc::new(OsEntropy),
    ));
    (router(registry.clone()), registry, clock)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn create_request(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn lookup_request(code: &str) -> Request<Body> {
    Request::get(format!("/api/party-codes/lookup/{}/", code))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_create_then_lookup() {
    let (app, _, clock) = app();

    let (status, body) = send(
        &app,
        create_request("/api/party-codes/create/", json!({ "peer_id": "peer-123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let code = body["code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), CODE_LENGTH);
    assert!(is_valid_code(&code));
    assert_eq!(body["peer_id"], "peer-123");

    let expires_at: DateTime<Utc> = body["expires_at"].as_str().unwrap().parse().unwrap();
    assert_eq!(expires_at, clock.now() + Duration::hours(2));

    let (status, body) = send(&app, lookup_request(&code)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "peer_id": "peer-123" }));

    clock.advance(Duration::hours(2) + Duration::seconds(1));
    let (status, body) = send(&app, lookup_request(&code)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Party code not found");
}

#[tokio::test]
async fn test_lookup_is_case_insensitive() {
    let (app, _, _) = app();

    let (_, body) = send(
        &app,
        create_request("/api/party-codes/create", json!({ "peer_id": "host" })),
    )
    .await;
    let code = body["code"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Request::get(format!("/api/party-codes/lookup/{}", code.to_lowercase()))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["peer_id"], "host");
}

#[tokio::test]
async fn test_lookup_unknown_code() {
    let (app, _, _) = app();

    let (status, body) = send(&app, lookup_request("ZZZZZZ")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Party code not found");
}

#[tokio::test]
async fn test_create_requires_peer_id() {
    let (app, registry, _) = app();

    for body in [json!({}), json!({ "peer_id": "" }), json!({ "peer_id": null })] {
        let (status, body) = send(&app, create_request("/api/party-codes/create/", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "peer_id is required");
    }

    assert_eq!(registry.live_count().unwrap(), 0);
}

#[tokio::test]
async fn test_create_rejects_bad_bodies() {
    let (app, registry, _) = app();

    for peer_id in [json!(42), json!(true), json!(["peer"]), json!({ "id": "peer" })] {
        let (status, body) = send(
            &app,
            create_request("/api/party-codes/create/", json!({ "peer_id": peer_id })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "peer_id is required");
    }

    let (status, body) = send(
        &app,
        create_request("/api/party-codes/create/", json!({ "peer_id": "x".repeat(256) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "peer_id must be at most 255 characters");

    let malformed = Request::post("/api/party-codes/create/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = body["error"].as_str().unwrap();
    assert_ne!(error, "peer_id is required");
    assert!(!error.is_empty());

    assert_eq!(registry.live_count().unwrap(), 0);
}

#[tokio::test]
async fn test_health_reports_stored_codes() {
    let (app, registry, _) = app();
    registry.create("a").unwrap();
    registry.create("b").unwrap();

    let (status, body) = send(
        &app,
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy", "codes": 2 }));
}

#[tokio::test]
async fn test_sqlite_backed_api() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(Registry::new(
        SqliteStore::open(dir.path().join("codes.db")).unwrap(),
    ));
    let app = router(registry);

    let (status, body) = send(
        &app,
        create_request("/api/party-codes/create/", json!({ "peer_id": "peer-123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let code = body["code"].as_str().unwrap();
    let (status, body) = send(&app, lookup_request(code)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["peer_id"], "peer-123");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_are_unique() {
    let (app, registry, _) = app();

    let tasks: Vec<_> = (0..64)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let (status, body) = send(
                    &app,
                    create_request(
                        "/api/party-codes/create/",
                        json!({ "peer_id": format!("peer-{}", i) }),
                    ),
                )
                .await;
                assert_eq!(status, StatusCode::OK);
                body["code"].as_str().unwrap().to_string()
            })
        })
        .collect();

    let mut codes = Vec::new();
    for task in tasks {
        codes.push(task.await.unwrap());
    }
    codes.sort();
    codes.dedup();
    assert_eq!(codes.len(), 64);
    assert_eq!(registry.live_count().unwrap(), 64);
}
