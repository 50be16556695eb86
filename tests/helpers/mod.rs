//! Test support: a scripted in-process mock of the extraction service.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use pdf_extract_client::models::job::SubmissionFile;
use pdf_extract_client::services::api::ExtractionServiceClient;
use pdf_extract_client::services::controller::SubmissionController;
use pdf_extract_client::services::poller::ProgressPoller;
use pdf_extract_client::services::session::Session;

/// Behavior script and call counters for one mock service instance.
#[derive(Default)]
pub struct MockService {
    /// Body returned by POST /extract.
    pub extract_response: Mutex<Value>,
    /// Body returned by POST /extract-images, after `analysis_delay`.
    pub analyze_response: Mutex<Value>,
    /// How long the analysis endpoint holds the request before answering.
    pub analysis_delay: Mutex<Duration>,
    /// Snapshots served by GET /progress/{task_id}, drained in order; the
    /// last one keeps repeating once the script runs out.
    pub snapshots: Mutex<VecDeque<Value>>,
    /// Number of upcoming progress queries to fail with a 500.
    pub progress_failures: AtomicUsize,

    pub extract_calls: AtomicUsize,
    pub analyze_calls: AtomicUsize,
    pub progress_calls: AtomicUsize,
    /// Task ids observed on progress queries, in arrival order.
    pub polled_task_ids: Mutex<Vec<String>>,
    /// Export names requested on GET /download/{name}, percent-decoded.
    pub downloaded_names: Mutex<Vec<String>>,
}

impl MockService {
    pub fn set_extract_response(&self, body: Value) {
        *self.extract_response.lock().unwrap() = body;
    }

    pub fn set_analyze_response(&self, body: Value) {
        *self.analyze_response.lock().unwrap() = body;
    }

    pub fn set_analysis_delay(&self, delay: Duration) {
        *self.analysis_delay.lock().unwrap() = delay;
    }

    pub fn push_snapshot(&self, body: Value) {
        self.snapshots.lock().unwrap().push_back(body);
    }

    pub fn fail_next_progress_calls(&self, count: usize) {
        self.progress_failures.store(count, Ordering::SeqCst);
    }
}

/// Bind the mock service on an ephemeral port and serve it for the rest of
/// the test. Returns the base URL and the script handle.
pub async fn spawn_mock_service() -> (String, Arc<MockService>) {
    let state = Arc::new(MockService::default());
    let app = Router::new()
        .route("/extract", post(extract))
        .route("/extract-images", post(extract_images))
        .route("/progress/{task_id}", get(progress))
        .route("/download/{name}", get(download))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock service");
    let addr = listener.local_addr().expect("mock service has no address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock service died");
    });

    (format!("http://{}", addr), state)
}

/// Controller wired to `base_url` with a fast poll cadence suited to tests.
pub fn test_controller(base_url: &str) -> SubmissionController {
    let api = ExtractionServiceClient::new(base_url).expect("bad mock base URL");
    let poller = ProgressPoller::new(
        api.clone(),
        Duration::from_millis(25),
        Duration::from_secs(10),
    );
    SubmissionController::new(api, poller, Arc::new(Session::new()))
}

pub fn pdf_file(name: &str) -> SubmissionFile {
    SubmissionFile::new(name, b"%PDF-1.4 test fixture".to_vec())
}

async fn extract(State(state): State<Arc<MockService>>) -> Json<Value> {
    state.extract_calls.fetch_add(1, Ordering::SeqCst);
    Json(state.extract_response.lock().unwrap().clone())
}

async fn extract_images(State(state): State<Arc<MockService>>) -> Json<Value> {
    state.analyze_calls.fetch_add(1, Ordering::SeqCst);
    let delay = *state.analysis_delay.lock().unwrap();
    tokio::time::sleep(delay).await;
    Json(state.analyze_response.lock().unwrap().clone())
}

async fn progress(
    State(state): State<Arc<MockService>>,
    Path(task_id): Path<String>,
) -> Response {
    state.progress_calls.fetch_add(1, Ordering::SeqCst);
    state.polled_task_ids.lock().unwrap().push(task_id);

    let failures = &state.progress_failures;
    if failures
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
    {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let mut queue = state.snapshots.lock().unwrap();
    let snapshot = if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    };
    let snapshot = snapshot.unwrap_or_else(|| {
        json!({"percentage": 0, "message": "Waiting", "current": 0, "total": 0})
    });

    Json(snapshot).into_response()
}

async fn download(
    State(state): State<Arc<MockService>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    state.downloaded_names.lock().unwrap().push(name);
    (StatusCode::OK, b"export-bytes".to_vec())
}
