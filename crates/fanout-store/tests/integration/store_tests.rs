use std::time::Duration;

use fanout_core::testutil::{MockExtractor, MockFetcher};
use fanout_core::{
    CoordinationConfig, CoordinationStore, Coordinator, KeySpace, PageResult, TracingWorkerReporter,
    WorkerConfig, WorkerService,
};
use tokio_util::sync::CancellationToken;

use crate::integration::common::setup_test_store;

#[tokio::test]
async fn blocking_pop_is_fifo_and_times_out() {
    let (store, _container) = setup_test_store().await;

    store.list_append("q", "a").await.unwrap();
    assert_eq!(store.list_append("q", "b").await.unwrap(), 2);

    let timeout = Duration::from_millis(200);
    assert_eq!(store.pop_blocking("q", timeout).await.unwrap().as_deref(), Some("a"));
    assert_eq!(store.pop_blocking("q", timeout).await.unwrap().as_deref(), Some("b"));
    assert_eq!(store.pop_blocking("q", timeout).await.unwrap(), None);
}

#[tokio::test]
async fn blocking_pop_does_not_stall_other_commands() {
    let (store, _container) = setup_test_store().await;

    let waiter = {
        let store = store.clone();
        tokio::spawn(async move { store.pop_blocking("q", Duration::from_secs(5)).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Served by the command connection while BLPOP is parked.
    let started = tokio::time::Instant::now();
    store.ping().await.unwrap();
    store.list_append("q", "late").await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));

    let popped = waiter.await.unwrap().unwrap();
    assert_eq!(popped.as_deref(), Some("late"));
}

#[tokio::test]
async fn set_add_reports_first_writer_only() {
    let (store, _container) = setup_test_store().await;

    assert!(store.set_add_if_absent("visited", "http://x.com/a").await.unwrap());
    assert!(!store.set_add_if_absent("visited", "http://x.com/a").await.unwrap());
    assert!(store.set_contains("visited", "http://x.com/a").await.unwrap());
    assert!(!store.set_contains("visited", "http://x.com/b").await.unwrap());
    assert_eq!(store.set_len("visited").await.unwrap(), 1);
}

#[tokio::test]
async fn concurrent_claims_have_one_winner() {
    let (store, _container) = setup_test_store().await;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.set_add_if_absent("visited", "http://x.com/a").await.unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn hash_and_list_operations() {
    let (store, _container) = setup_test_store().await;

    store
        .hash_set_many(
            "session",
            &[("status", "active".to_string()), ("submitted", "2".to_string())],
        )
        .await
        .unwrap();
    store.hash_set("session", "status", "done").await.unwrap();

    assert_eq!(store.hash_len("session").await.unwrap(), 2);
    assert_eq!(
        store.hash_get("session", "status").await.unwrap().as_deref(),
        Some("done")
    );
    assert_eq!(store.hash_get("session", "missing").await.unwrap(), None);
    assert!(store.hash_get_all("nope").await.unwrap().is_empty());

    for id in ["s1", "s2", "s3"] {
        store.list_append("history", id).await.unwrap();
    }
    assert_eq!(store.list_range("history", 0, -1).await.unwrap(), vec!["s1", "s2", "s3"]);
    assert_eq!(store.list_range("history", -2, -1).await.unwrap(), vec!["s2", "s3"]);
    assert_eq!(store.list_len("history").await.unwrap(), 3);
}

#[tokio::test]
async fn crawl_round_trip_over_redis() {
    let (store, _container) = setup_test_store().await;
    let coordination = CoordinationConfig::default();
    let coordinator = Coordinator::new(store.clone(), &coordination);

    let fetcher = MockFetcher::new("<html/>").status("http://x.com/missing", 404);
    let token = CancellationToken::new();
    let mut handles = Vec::new();
    for i in 0..3 {
        let worker = WorkerService::new(
            store.clone(),
            &coordination,
            fetcher.clone(),
            MockExtractor::named("Widget"),
            WorkerConfig::default()
                .with_worker_id(format!("w{i}"))
                .with_pop_timeout(Duration::from_millis(100))
                .with_idle_backoff(Duration::from_millis(10)),
        );
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            worker.run(token, &TracingWorkerReporter).await
        }));
    }

    let outcome = coordinator
        .submit(vec![
            "http://x.com/a".into(),
            "http://x.com/a".into(),
            "http://x.com/missing".into(),
        ])
        .await
        .unwrap();
    assert_eq!(outcome.urls_added, 3);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let results = coordinator
            .get_session_results(&outcome.session_id)
            .await
            .unwrap();
        let queued = coordinator.get_progress().await.unwrap().queued;
        if results.len() == 2 && queued == 0 {
            assert_eq!(results["http://x.com/missing"], PageResult::failure("HTTP 404"));
            assert!(!results["http://x.com/a"].is_failure());
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "crawl did not finish");
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    token.cancel();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(fetcher.calls().len(), 2);
    let progress = coordinator.get_progress().await.unwrap();
    assert_eq!((progress.visited, progress.results, progress.failed), (2, 2, 1));

    let sessions = coordinator.list_sessions().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!((sessions[0].submitted, sessions[0].completed), (3, 2));

    let workers = coordinator.get_workers().await.unwrap();
    assert_eq!(workers.len(), 3);
    assert!(workers.values().all(|status| status == "idle"));

    let keys = KeySpace::default();
    assert_eq!(store.list_len(&keys.session_history()).await.unwrap(), 1);
}
