//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle against an in-memory object store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use blob_proxy::{
    api::create_router,
    backend::{BackendError, ObjectStore},
    cache::CacheStore,
    spawn_sweeper, AppState, FetchThrough, SweepConfig, SweeperHandle,
};
use bytes::Bytes;
use serde_json::Value;
use tower::ServiceExt;

// == Test Backend ==

/// Object store double with a fixed set of objects and a call counter.
#[derive(Default)]
struct FakeBucket {
    objects: HashMap<String, Bytes>,
    unavailable: bool,
    calls: AtomicUsize,
}

impl FakeBucket {
    fn with_files(files: &[(&str, &'static [u8])]) -> Self {
        Self {
            objects: files
                .iter()
                .map(|(name, content)| (name.to_string(), Bytes::from_static(content)))
                .collect(),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for FakeBucket {
    async fn get_object(&self, _bucket: &str, key: &str) -> Result<Bytes, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(BackendError::Transient("connection refused".to_string()));
        }
        self.objects
            .get(key)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(key.to_string()))
    }
}

// == Helper Functions ==

struct TestApp {
    router: Router,
    bucket: Arc<FakeBucket>,
    cache: Arc<CacheStore>,
    sweeper: Arc<SweeperHandle>,
}

fn create_test_app_with(bucket: FakeBucket, sweep: SweepConfig) -> TestApp {
    let bucket = Arc::new(bucket);
    let cache = Arc::new(CacheStore::new());
    let sweeper = Arc::new(spawn_sweeper(cache.clone(), sweep));
    let fetcher = FetchThrough::new(cache.clone(), bucket.clone(), "my-first-bucket");
    let router = create_router(AppState::new(fetcher, sweeper.clone()));

    TestApp {
        router,
        bucket,
        cache,
        sweeper,
    }
}

fn create_test_app() -> TestApp {
    create_test_app_with(
        FakeBucket::with_files(&[("hello.txt", b"hello world"), ("image.png", b"\x89PNG")]),
        SweepConfig::new(Duration::from_secs(300)),
    )
}

async fn send(router: &Router, method: &str, uri: &str) -> axum::response::Response {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_bytes(body: Body) -> Bytes {
    axum::body::to_bytes(body, usize::MAX).await.unwrap()
}

async fn body_to_json(body: Body) -> Value {
    serde_json::from_slice(&body_bytes(body).await).unwrap()
}

// == GET /get-file Tests ==

#[tokio::test]
async fn test_get_file_success() {
    let app = create_test_app();

    let response = send(&app.router, "GET", "/get-file/hello.txt").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/octet-stream"
    );
    assert_eq!(body_bytes(response.into_body()).await, Bytes::from_static(b"hello world"));
}

#[tokio::test]
async fn test_get_file_binary_content() {
    let app = create_test_app();

    let response = send(&app.router, "GET", "/get-file/image.png").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response.into_body()).await, Bytes::from_static(b"\x89PNG"));
}

#[tokio::test]
async fn test_second_request_served_from_cache() {
    let app = create_test_app();

    let first = send(&app.router, "GET", "/get-file/hello.txt").await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(app.bucket.calls(), 1);

    let second = send(&app.router, "GET", "/get-file/hello.txt").await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(body_bytes(second.into_body()).await, Bytes::from_static(b"hello world"));
    assert_eq!(app.bucket.calls(), 1, "repeat fetch must not reach the backend");
}

#[tokio::test]
async fn test_get_file_not_found() {
    let app = create_test_app();

    let response = send(&app.router, "GET", "/get-file/missing.txt").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("missing.txt"));
    assert!(app.cache.is_empty(), "not-found must not be cached");
}

#[tokio::test]
async fn test_get_file_backend_unavailable() {
    let app = create_test_app_with(
        FakeBucket {
            unavailable: true,
            ..FakeBucket::default()
        },
        SweepConfig::new(Duration::from_secs(300)),
    );

    let response = send(&app.router, "GET", "/get-file/hello.txt").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(app.cache.is_empty());

    // Not cached, so the next request tries the backend again.
    send(&app.router, "GET", "/get-file/hello.txt").await;
    assert_eq!(app.bucket.calls(), 2);
}

#[tokio::test]
async fn test_get_file_normalizes_name() {
    let app = create_test_app();

    let response = send(&app.router, "GET", "/get-file/.%2Fhello.txt").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app.router, "GET", "/get-file/hello.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.bucket.calls(), 1, "both names map to the same cache key");
}

#[tokio::test]
async fn test_get_file_rejects_escape() {
    let app = create_test_app();

    let response = send(&app.router, "GET", "/get-file/..%2Fsecret").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.bucket.calls(), 0);
}

// == Expiration Tests ==

#[tokio::test(start_paused = true)]
async fn test_idle_file_is_refetched_after_ttl() {
    let app = create_test_app_with(
        FakeBucket::with_files(&[("hello.txt", b"hello world")]),
        SweepConfig::new(Duration::from_secs(2)).with_interval(Duration::from_secs(1)),
    );

    send(&app.router, "GET", "/get-file/hello.txt").await;
    assert_eq!(app.bucket.calls(), 1);

    tokio::time::sleep(Duration::from_millis(4500)).await;
    assert!(app.cache.is_empty());

    send(&app.router, "GET", "/get-file/hello.txt").await;
    assert_eq!(app.bucket.calls(), 2);
}

// == Utility Endpoint Tests ==

#[tokio::test]
async fn test_ping_endpoint() {
    let app = create_test_app();

    let response = send(&app.router, "GET", "/ping").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response.into_body()).await, Bytes::from_static(b"Pong"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = send(&app.router, "GET", "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn test_stats_endpoint() {
    let app = create_test_app();

    send(&app.router, "GET", "/get-file/hello.txt").await; // miss + backend fetch
    send(&app.router, "GET", "/get-file/hello.txt").await; // hit
    send(&app.router, "GET", "/get-file/missing.txt").await; // miss + backend failure

    let response = send(&app.router, "GET", "/stats").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 2);
    assert_eq!(json["backend_fetches"], 2);
    assert_eq!(json["backend_failures"], 1);
    assert_eq!(json["total_entries"], 1);
    assert!(json.get("sweeps").is_some());
}

#[tokio::test]
async fn test_sweep_endpoint() {
    let app = create_test_app();

    let response = send(&app.router, "POST", "/admin/sweep").await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    app.sweeper.shutdown(Duration::from_secs(1)).await;

    let response = send(&app.router, "POST", "/admin/sweep").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    // Lookups keep working after the sweeper is gone.
    let response = send(&app.router, "GET", "/get-file/hello.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_concurrent_requests() {
    let app = create_test_app();

    let mut handles = Vec::new();
    for i in 0..20 {
        let router = app.router.clone();
        let uri = if i % 2 == 0 { "/get-file/hello.txt" } else { "/get-file/image.png" };
        handles.push(tokio::spawn(async move {
            send(&router, "GET", uri).await.status()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }
    assert_eq!(app.cache.len(), 2);
}
