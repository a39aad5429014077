use std::time::Duration;

use axum::http::StatusCode;
use tokio_util::sync::CancellationToken;

use fanout_core::{
    CoordinationStore, KeySpace, PageResult, ProductRecord, TracingWorkerReporter,
};

use crate::integration::common::{get_json, post_raw, setup_test_app};

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app();

    let (status, json) = get_json(&app.router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["store"], "ok");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = setup_test_app();

    let (status, json) = get_json(&app.router, "/api-docs/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/submit-urls"].is_object());
}

#[tokio::test]
async fn submit_returns_session_and_counts() {
    let app = setup_test_app();

    let (status, json) = post_raw(
        &app.router,
        "/submit-urls",
        r#"{"urls": ["http://x.com/a", "http://x.com/b"]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["urls_added"], 2);
    assert_eq!(json["already_crawled"], serde_json::json!([]));
    assert!(!json["session_id"].as_str().unwrap().is_empty());

    let (_, progress) = get_json(&app.router, "/progress").await;
    assert_eq!(progress["queued"], 2);
}

#[tokio::test]
async fn malformed_submission_is_an_empty_batch() {
    let app = setup_test_app();

    for body in ["not json", "{}", r#"{"urls": "http://x.com/a"}"#] {
        let (status, json) = post_raw(&app.router, "/submit-urls", body).await;
        assert_eq!(status, StatusCode::OK, "body {body}");
        assert_eq!(json["urls_added"], 0);
    }

    let (_, sessions) = get_json(&app.router, "/sessions").await;
    assert_eq!(sessions["sessions"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn oversized_submission_is_an_empty_batch() {
    let app = setup_test_app();
    let huge = format!(r#"{{"urls": ["http://x.com/{}"]}}"#, "a".repeat(3 * 1024 * 1024));

    let (status, json) = post_raw(&app.router, "/submit-urls", &huge).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["urls_added"], 0);
    assert!(!json["session_id"].as_str().unwrap().is_empty());

    let (_, progress) = get_json(&app.router, "/progress").await;
    assert_eq!(progress["queued"], 0);
}

#[tokio::test]
async fn duplicate_urls_in_batch_are_both_enqueued_but_processed_once() {
    let app = setup_test_app();

    let (_, json) = post_raw(
        &app.router,
        "/submit-urls",
        r#"{"urls": ["http://x.com/a", "http://x.com/a"]}"#,
    )
    .await;
    assert_eq!(json["urls_added"], 2);
    let session_id = json["session_id"].as_str().unwrap().to_string();

    app.worker.run_once(&TracingWorkerReporter).await.unwrap();
    app.worker.run_once(&TracingWorkerReporter).await.unwrap();

    let (_, results) = get_json(&app.router, &format!("/results/{session_id}")).await;
    assert_eq!(results["results"].as_object().unwrap().len(), 1);
    assert_eq!(app.fetcher.calls().len(), 1);

    let (_, progress) = get_json(&app.router, "/progress").await;
    assert_eq!(progress["queued"], 0);
    assert_eq!(progress["visited"], 1);
}

#[tokio::test]
async fn round_trip_result_has_all_fields() {
    let app = setup_test_app();
    let token = CancellationToken::new();
    let worker = {
        let token = token.clone();
        let worker = app.worker;
        tokio::spawn(async move { worker.run(token, &TracingWorkerReporter).await })
    };

    let (_, json) = post_raw(
        &app.router,
        "/submit-urls",
        r#"{"urls": ["http://example.com/p1"]}"#,
    )
    .await;
    let session_id = json["session_id"].as_str().unwrap().to_string();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    let record = loop {
        let (_, results) = get_json(&app.router, &format!("/results/{session_id}")).await;
        if let Some(record) = results["results"].get("http://example.com/p1") {
            break record.clone();
        }
        assert!(tokio::time::Instant::now() < deadline, "result never appeared");
        tokio::time::sleep(Duration::from_millis(20)).await;
    };

    token.cancel();
    worker.await.unwrap().unwrap();

    assert_eq!(record["name"], "Widget");
    for field in ["price", "rating", "availability", "image_url", "description"] {
        assert_eq!(record[field], "N/A", "field {field}");
    }

    let (_, workers) = get_json(&app.router, "/workers").await;
    assert_eq!(workers["workers"]["test-worker"], "idle");
}

#[tokio::test]
async fn fetch_failure_is_reported_in_results_and_progress() {
    let app = setup_test_app();

    let (_, json) = post_raw(
        &app.router,
        "/submit-urls",
        r#"{"urls": ["http://x.com/missing", "http://x.com/ok"]}"#,
    )
    .await;
    let session_id = json["session_id"].as_str().unwrap().to_string();
    app.worker.run_once(&TracingWorkerReporter).await.unwrap();
    app.worker.run_once(&TracingWorkerReporter).await.unwrap();

    let (_, results) = get_json(&app.router, &format!("/results/{session_id}")).await;
    assert_eq!(results["results"]["http://x.com/missing"]["error"], "HTTP 404");

    let (_, legacy) = get_json(&app.router, "/results").await;
    assert_eq!(legacy["results"].as_object().unwrap().len(), 2);

    let (_, progress) = get_json(&app.router, "/progress").await;
    assert_eq!(progress["results"], 2);
    assert_eq!(progress["failed"], 1);

    let (_, sessions) = get_json(&app.router, "/sessions").await;
    let row = &sessions["sessions"][0];
    assert_eq!(row["session_id"], session_id.as_str());
    assert_eq!(row["submitted"], 2);
    assert_eq!(row["completed"], 2);
    assert_eq!(row["failed"], 1);
    assert!(row["start_time"].is_string());
}

#[tokio::test]
async fn resubmitted_url_is_already_crawled() {
    let app = setup_test_app();

    post_raw(&app.router, "/submit-urls", r#"{"urls": ["http://x.com/a"]}"#).await;
    app.worker.run_once(&TracingWorkerReporter).await.unwrap();

    let (_, json) = post_raw(
        &app.router,
        "/submit-urls",
        r#"{"urls": ["http://x.com/a", "http://x.com/b"]}"#,
    )
    .await;

    assert_eq!(json["urls_added"], 1);
    assert_eq!(json["already_crawled"], serde_json::json!(["http://x.com/a"]));
}

#[tokio::test]
async fn unknown_session_has_empty_results() {
    let app = setup_test_app();

    let (status, json) = get_json(&app.router, "/results/does-not-exist").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"], serde_json::json!({}));
}

#[tokio::test]
async fn double_encoded_and_garbage_results_still_decode() {
    let app = setup_test_app();
    let keys = KeySpace::default();
    let record = ProductRecord {
        name: "Widget".into(),
        ..ProductRecord::not_available()
    };
    let once = PageResult::Success(record).encode().unwrap();
    let twice = serde_json::to_string(&once).unwrap();

    app.store
        .hash_set(&keys.legacy_results(), "http://x.com/a", &twice)
        .await
        .unwrap();
    app.store
        .hash_set(&keys.legacy_results(), "http://x.com/b", "{not json")
        .await
        .unwrap();

    let (status, json) = get_json(&app.router, "/results").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"]["http://x.com/a"]["name"], "Widget");
    assert_eq!(json["results"]["http://x.com/b"]["error"], "{not json");

    // Undecodable entries are not counted as failures.
    let (_, progress) = get_json(&app.router, "/progress").await;
    assert_eq!(progress["results"], 2);
    assert_eq!(progress["failed"], 0);
}
