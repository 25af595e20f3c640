use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;
use volum::{
    api::create_router,
    state::{AppState, ExperimentTracker},
    store::StateStore,
};

fn test_app() -> (Router, Arc<AppState>, TempDir) {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path());
    let state = Arc::new(AppState::new(
        ExperimentTracker::new(),
        store,
        0,
        "127.0.0.1".to_string(),
        1000,
    ));
    (create_router(Arc::clone(&state)), state, dir)
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn send_empty(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn start_body() -> Value {
    // 10 L at 1 ml per 100 s
    json!({"volume_liters": 10.0, "flow_volume_ml": 1.0, "interval_seconds": 100.0})
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _state, _dir) = test_app();
    let (status, body) = send_empty(&app, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn estimate_computes_duration_and_end_time() {
    let (app, _state, _dir) = test_app();
    let (status, body) = send_json(&app, "POST", "/estimate", start_body()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_seconds"], 1_000_000.0);
    assert_eq!(body["formatted"], "11 jours 13 h 46 min 40 sec");
    assert_eq!(body["day_line"], "11 jours");
    assert_eq!(body["time_line"], "13 h 46 min 40 sec");
    assert!(body["ends_at"].is_string());
}

#[tokio::test]
async fn estimate_rejects_invalid_numbers() {
    let (app, _state, _dir) = test_app();
    let bad = json!({"volume_liters": 10.0, "flow_volume_ml": 0.0, "interval_seconds": 100.0});
    let (status, _) = send_json(&app, "POST", "/estimate", bad).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn start_rejects_invalid_and_empty_volumes() {
    let (app, _state, _dir) = test_app();

    let negative = json!({"volume_liters": -1.0, "flow_volume_ml": 1.0, "interval_seconds": 1.0});
    let (status, _) = send_json(&app, "POST", "/experiments", negative).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let empty = json!({"volume_liters": 0.0, "flow_volume_ml": 1.0, "interval_seconds": 1.0});
    let (status, _) = send_json(&app, "POST", "/experiments", empty).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, listing) = send_empty(&app, "GET", "/experiments").await;
    assert_eq!(listing["experiments"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn start_creates_a_running_experiment() {
    let (app, _state, _dir) = test_app();
    let (status, body) = send_json(&app, "POST", "/experiments", start_body()).await;
    assert_eq!(status, StatusCode::OK);

    let experiments = body["experiments"].as_array().unwrap();
    assert_eq!(experiments.len(), 1);
    let exp = &experiments[0];
    assert_eq!(exp["is_running"], true);
    assert_eq!(exp["start_liters"], 10.0);
    assert_eq!(exp["ml_per_sec"], 0.01);
    assert!(exp["started_at"].is_string());
    assert!(exp["ends_at"].is_string());

    // Derived live from ends_at; negligible wall-clock time has elapsed
    let remaining_ml = exp["remaining_ml"].as_f64().unwrap();
    assert!(remaining_ml > 9_990.0 && remaining_ml <= 10_000.0);
}

#[tokio::test]
async fn toggle_pauses_then_resumes() {
    let (app, _state, _dir) = test_app();
    let (_, body) = send_json(&app, "POST", "/experiments", start_body()).await;
    let id = body["experiments"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = send_empty(&app, "POST", &format!("/experiments/{}/toggle", id)).await;
    assert_eq!(status, StatusCode::OK);
    let exp = &body["experiments"][0];
    assert_eq!(exp["is_running"], false);
    assert!(exp["started_at"].is_null());
    assert!(exp["ends_at"].is_null());

    let (status, body) = send_empty(&app, "POST", &format!("/experiments/{}/toggle", id)).await;
    assert_eq!(status, StatusCode::OK);
    let exp = &body["experiments"][0];
    assert_eq!(exp["is_running"], true);
    assert!(exp["ends_at"].is_string());
}

#[tokio::test]
async fn toggle_unknown_id_is_not_found() {
    let (app, _state, _dir) = test_app();
    let (status, _) = send_empty(&app, "POST", "/experiments/nope/toggle").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reset_restores_the_full_quantity() {
    let (app, _state, _dir) = test_app();
    let (_, body) = send_json(&app, "POST", "/experiments", start_body()).await;
    let id = body["experiments"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = send_empty(&app, "POST", &format!("/experiments/{}/reset", id)).await;
    assert_eq!(status, StatusCode::OK);
    let exp = &body["experiments"][0];
    assert_eq!(exp["is_running"], false);
    assert_eq!(exp["remaining_ml"], 10_000.0);
    assert_eq!(exp["remaining_liters"], 10.0);

    let (status, _) = send_empty(&app, "POST", "/experiments/missing/reset").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn remove_is_idempotent() {
    let (app, _state, _dir) = test_app();
    let (_, body) = send_json(&app, "POST", "/experiments", start_body()).await;
    let id = body["experiments"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = send_empty(&app, "DELETE", &format!("/experiments/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["experiments"].as_array().unwrap().len(), 0);

    // Deleting again is still a success
    let (status, _) = send_empty(&app, "DELETE", &format!("/experiments/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn status_reflects_tracked_experiments() {
    let (app, _state, _dir) = test_app();
    send_json(&app, "POST", "/experiments", start_body()).await;
    let (_, body) = send_json(&app, "POST", "/experiments", start_body()).await;
    let id = body["experiments"][0]["id"].as_str().unwrap().to_string();
    send_empty(&app, "POST", &format!("/experiments/{}/toggle", id)).await;

    let (status, body) = send_empty(&app, "GET", "/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["experiment_count"], 2);
    assert_eq!(body["running_count"], 1);
    assert_eq!(body["last_action"], "toggle-pause");
    assert!(body["last_action_time"].is_string());
}

#[tokio::test]
async fn mutations_persist_to_the_store() {
    let (app, state, _dir) = test_app();
    let (_, body) = send_json(&app, "POST", "/experiments", start_body()).await;
    let id = body["experiments"][0]["id"].as_str().unwrap().to_string();
    send_empty(&app, "POST", &format!("/experiments/{}/toggle", id)).await;

    let raw = state
        .store
        .read(volum::store::EXPERIMENTS_KEY)
        .unwrap()
        .expect("store should hold the experiment list");
    let persisted: Value = serde_json::from_str(&raw).unwrap();
    let entries = persisted.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], id.as_str());
    assert_eq!(entries[0]["is_running"], false);
}
