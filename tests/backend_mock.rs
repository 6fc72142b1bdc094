//! End-to-end tests against an in-process mock of the backend API.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use runwatch::api::{ApiError, ExecutionApi, ExecutionStatus, HttpExecutionClient};
use runwatch::config::TrackerConfig;
use runwatch::scheduler::PollOutcome;
use runwatch::tree::{Sentinel, TreeNode};
use runwatch::Tracker;

#[derive(Default)]
struct Backend {
    /// Raw body for `/executions`; `None` answers 500.
    list: Mutex<Option<String>>,
    details: Mutex<HashMap<String, Value>>,
    detail_hits: AtomicUsize,
}

type Shared = Arc<Backend>;

async fn list_executions(State(backend): State<Shared>) -> Response {
    match backend.list.lock().unwrap().clone() {
        Some(body) => (StatusCode::OK, [("content-type", "application/json")], body).into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
    }
}

async fn get_execution(State(backend): State<Shared>, Path(id): Path<String>) -> Response {
    backend.detail_hits.fetch_add(1, Ordering::SeqCst);
    match backend.details.lock().unwrap().get(&id) {
        Some(detail) => Json(detail.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "unknown execution").into_response(),
    }
}

async fn spawn_backend(backend: Shared) -> SocketAddr {
    let app = Router::new()
        .route("/api/executions", get(list_executions))
        .route("/api/executions/{id}", get(get_execution))
        .with_state(backend);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn brief_json(id: &str, status: &str, start: &str) -> Value {
    json!({
        "execution_id": id,
        "status": status,
        "start_time": start,
        "end_time": null,
        "completed_tests": 1,
        "total_tests": 2,
        "failed_tests": 0,
        "source": "regression"
    })
}

fn detail_json(id: &str, status: &str, start: &str) -> Value {
    let mut detail = brief_json(id, status, start);
    let obj = detail.as_object_mut().unwrap();
    obj.insert("test_passed".into(), json!(true));
    obj.insert("test_summary".into(), json!("2 passed"));
    obj.insert(
        "xml_results".into(),
        json!([
            {"test_id": "t1", "test_name": "login", "testsuite_name": "auth", "time": 3.5},
            {"test_id": "t2", "test_name": "logout", "testsuite_name": "auth", "time": 1.0}
        ]),
    );
    detail
}

fn config_for(addr: SocketAddr) -> TrackerConfig {
    let mut config = TrackerConfig::default();
    config.backend.base_url = format!("http://{}/api", addr);
    config.backend.request_timeout_secs = 2;
    config
}

async fn setup() -> (Shared, SocketAddr) {
    let backend = Arc::new(Backend::default());
    let addr = spawn_backend(backend.clone()).await;
    (backend, addr)
}

#[tokio::test]
async fn test_client_lists_and_fetches_detail() {
    let (backend, addr) = setup().await;
    *backend.list.lock().unwrap() = Some(
        json!([brief_json("e1", "running", "2024-05-01T10:00:00")]).to_string(),
    );
    backend
        .details
        .lock()
        .unwrap()
        .insert("e1".into(), detail_json("e1", "completed", "2024-05-01T10:00:00"));

    let client = HttpExecutionClient::new(&format!("http://{}/api", addr), Duration::from_secs(2)).unwrap();

    let list = tokio_test::assert_ok!(client.list_executions().await);
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].status, ExecutionStatus::Running);

    let detail = tokio_test::assert_ok!(client.get_execution_detail("e1").await);
    assert_eq!(detail.xml_results.len(), 2);
    assert_eq!(detail.xml_results[0].test_name, "login");
}

#[tokio::test]
async fn test_client_error_taxonomy() {
    let (backend, addr) = setup().await;
    let client = HttpExecutionClient::new(&format!("http://{}/api", addr), Duration::from_secs(2)).unwrap();

    // 500 on the list endpoint
    let err = client.list_executions().await.unwrap_err();
    assert!(matches!(err, ApiError::Network { .. }));

    // wrong JSON shape
    *backend.list.lock().unwrap() = Some(r#"{"executions": []}"#.to_string());
    let err = client.list_executions().await.unwrap_err();
    assert!(matches!(err, ApiError::MalformedResponse { .. }));

    // unknown id
    let err = tokio_test::assert_err!(client.get_execution_detail("abc").await);
    assert!(matches!(err, ApiError::NotFound { ref execution_id } if execution_id == "abc"));
}

#[tokio::test]
async fn test_tracker_poll_project_and_hydrate() {
    let (backend, addr) = setup().await;
    *backend.list.lock().unwrap() = Some(
        json!([
            brief_json("old", "completed", "2024-05-01T08:00:00"),
            brief_json("new", "running", "2024-05-01T10:00:00"),
            brief_json("mid", "failed", "2024-05-01T09:00:00"),
        ])
        .to_string(),
    );
    backend
        .details
        .lock()
        .unwrap()
        .insert("new".into(), detail_json("new", "running", "2024-05-01T10:00:00"));

    let tracker = Tracker::from_config(&config_for(addr)).unwrap();
    assert_eq!(tracker.poll_once().await, PollOutcome::Changed);
    assert_eq!(tracker.poll_once().await, PollOutcome::Unchanged);

    let roots = tracker.projector().roots();
    let ids: Vec<_> = roots.iter().filter_map(|n| n.execution_id()).collect();
    assert_eq!(ids, vec!["new", "mid", "old"]);

    let children = tracker.projector().children(&roots[0]).await;
    assert_eq!(children.len(), 3);
    tracker.projector().children(&roots[0]).await;
    assert_eq!(backend.detail_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_not_found_evicts_and_next_poll_restores() {
    let (backend, addr) = setup().await;
    *backend.list.lock().unwrap() = Some(
        json!([brief_json("abc", "completed", "2024-05-01T10:00:00")]).to_string(),
    );

    let tracker = Tracker::from_config(&config_for(addr)).unwrap();
    tracker.poll_once().await;

    let err = tracker.cache().hydrate("abc").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!tracker.cache().contains("abc"));
    assert_eq!(
        tracker.projector().roots(),
        vec![TreeNode::Sentinel(Sentinel::NoExecutions)]
    );

    assert_eq!(tracker.poll_once().await, PollOutcome::Changed);
    assert!(tracker.cache().contains("abc"));
}

#[tokio::test]
async fn test_backend_outage_keeps_previous_state() {
    let (backend, addr) = setup().await;
    *backend.list.lock().unwrap() = Some(
        json!([brief_json("e1", "running", "2024-05-01T10:00:00")]).to_string(),
    );

    let tracker = Tracker::from_config(&config_for(addr)).unwrap();
    tracker.poll_once().await;

    *backend.list.lock().unwrap() = None;
    assert_eq!(tracker.poll_once().await, PollOutcome::Skipped);
    assert_eq!(tracker.cache().len(), 1);
    assert_eq!(tracker.notifier().generation(), 1);
}

#[tokio::test]
async fn test_scheduler_start_publishes_change() {
    let (backend, addr) = setup().await;
    *backend.list.lock().unwrap() = Some(
        json!([brief_json("e1", "pending", "2024-05-01T10:00:00")]).to_string(),
    );

    let mut tracker = Tracker::from_config(&config_for(addr)).unwrap();
    let changes = tracker.notifier().subscribe();

    tracker.scheduler_mut().start().await;
    assert!(changes.has_changed());
    assert_eq!(tracker.cache().len(), 1);

    tracker.scheduler_mut().stop();
    assert!(!tracker.scheduler().is_running());
}
