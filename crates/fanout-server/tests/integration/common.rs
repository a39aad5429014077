use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use fanout_core::testutil::{MockExtractor, MockFetcher};
use fanout_core::{CoordinationConfig, Coordinator, WorkerConfig, WorkerService};
use fanout_server::routes;
use fanout_server::state::AppState;
use fanout_store::Store;

pub type TestWorker = WorkerService<Store, MockFetcher, MockExtractor>;

pub struct TestApp {
    pub router: Router,
    pub store: Store,
    pub fetcher: MockFetcher,
    pub worker: TestWorker,
}

/// Router over an in-memory store, plus a worker sharing that store.
pub fn setup_test_app() -> TestApp {
    let store = Store::memory();
    let coordination = CoordinationConfig::default();
    let state = Arc::new(AppState {
        coordinator: Coordinator::new(store.clone(), &coordination),
    });

    let fetcher = MockFetcher::new("<html/>").status("http://x.com/missing", 404);
    let worker = WorkerService::new(
        store.clone(),
        &coordination,
        fetcher.clone(),
        MockExtractor::named("Widget"),
        WorkerConfig::default()
            .with_worker_id("test-worker")
            .with_pop_timeout(std::time::Duration::from_millis(20)),
    );

    TestApp {
        router: routes::router(state),
        store,
        fetcher,
        worker,
    }
}

pub async fn get_json(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read_json(response).await
}

pub async fn post_raw(router: &Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read_json(response).await
}

async fn read_json(response: axum::response::Response) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}
