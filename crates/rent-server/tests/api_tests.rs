//! Integration tests for the server API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use rent_lib::{
    health::UNHEALTHY_AFTER_FAILURES, predictor::feature_names, RentInputs,
    GENERIC_FAILURE_MESSAGE,
};
use rent_server::{api, build_state, config::ServerConfig};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Linear artifact scoring a constant ln(2), i.e. 1.00 GHS
fn write_artifact(dir: &Path) -> std::path::PathBuf {
    let features: Vec<&str> = feature_names().collect();
    let manifest = json!({
        "name": "ucc_hostel_rent_predictor",
        "version": "test-1",
        "features": features,
        "model": { "kind": "linear", "intercept": std::f64::consts::LN_2 }
    });
    let path = dir.join("model.json");
    std::fs::write(&path, serde_json::to_vec(&manifest).unwrap()).unwrap();
    path
}

async fn setup_test_app() -> (Router, Arc<api::AppState>, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = ServerConfig {
        model_path: write_artifact(dir.path()),
        ..ServerConfig::default()
    };
    let state = build_state(&config).await.unwrap();
    let router = api::create_router(state.clone());
    (router, state, dir)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_predict_returns_formatted_rent() {
    let (app, _state, _dir) = setup_test_app().await;
    let form = serde_json::to_value(RentInputs::default()).unwrap();

    let response = app.oneshot(post_json("/api/v1/predict", &form)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["display"], "Predicted Annual Rent: GHS 1.00");
    assert_eq!(body["annual_rent"], 1.0);
    assert_eq!(body["currency"], "GHS");
    assert_eq!(body["model_version"], "test-1");
}

#[tokio::test]
async fn test_predict_rejects_unknown_field() {
    let (app, _state, _dir) = setup_test_app().await;
    let mut form = serde_json::to_value(RentInputs::default()).unwrap();
    form["swimming_pool"] = json!(true);

    let response = app.oneshot(post_json("/api/v1/predict", &form)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["unexpected"], json!(["swimming_pool"]));
    assert_eq!(body["missing"], json!([]));
}

#[tokio::test]
async fn test_predict_rejects_derived_field() {
    let (app, _state, _dir) = setup_test_app().await;
    let mut form = serde_json::to_value(RentInputs::default()).unwrap();
    form["log_deposit"] = json!(7.82);

    let response = app.oneshot(post_json("/api/v1/predict", &form)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_predict_rejects_missing_field() {
    let (app, _state, _dir) = setup_test_app().await;
    let mut form = serde_json::to_value(RentInputs::default()).unwrap();
    form.as_object_mut().unwrap().remove("deposit");

    let response = app.oneshot(post_json("/api/v1/predict", &form)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["missing"], json!(["deposit"]));
}

#[tokio::test]
async fn test_predict_rejects_out_of_range_slider() {
    let (app, _state, _dir) = setup_test_app().await;
    let mut form = serde_json::to_value(RentInputs::default()).unwrap();
    form["total_amenities"] = json!(12);

    let response = app.oneshot(post_json("/api/v1/predict", &form)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["field"], "total_amenities");
}

/// App whose model overflows the inverse transform on every request
async fn setup_failing_app() -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let features: Vec<&str> = feature_names().collect();
    let manifest = json!({
        "name": "ucc_hostel_rent_predictor",
        "version": "overflow",
        "features": features,
        "model": { "kind": "linear", "coefficients": { "deposit": 1.0e308 }, "intercept": 1.0e308 }
    });
    let path = dir.path().join("model.json");
    std::fs::write(&path, serde_json::to_vec(&manifest).unwrap()).unwrap();
    let config = ServerConfig {
        model_path: path,
        ..ServerConfig::default()
    };
    let state = build_state(&config).await.unwrap();
    (api::create_router(state), dir)
}

#[tokio::test]
async fn test_inference_failure_is_generic() {
    let (app, _dir) = setup_failing_app().await;

    let form = serde_json::to_value(RentInputs::default()).unwrap();
    let response = app.oneshot(post_json("/api/v1/predict", &form)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"], GENERIC_FAILURE_MESSAGE);
}

#[tokio::test]
async fn test_startup_fails_without_artifact() {
    let dir = TempDir::new().unwrap();
    let config = ServerConfig {
        model_path: dir.path().join("missing.json"),
        ..ServerConfig::default()
    };

    let err = build_state(&config).await.err().expect("startup must fail");
    assert!(err.to_string().contains("Cannot start without model artifact"));
}

#[tokio::test]
async fn test_schema_lists_form_fields() {
    let (app, _state, _dir) = setup_test_app().await;

    let response = app.oneshot(get("/api/v1/schema")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let fields = body["fields"].as_array().unwrap();
    assert_eq!(fields.len(), RentInputs::FIELD_NAMES.len());
    assert_eq!(body["derived"], json!(["log_avg_area_rent", "log_deposit"]));
    assert_eq!(body["model_version"], "test-1");

    let room_type = fields.iter().find(|f| f["name"] == "room_type").unwrap();
    assert_eq!(room_type["kind"], "category");
    assert_eq!(room_type["labels"][0], "Private room(1 in a room)");

    let furnishing = fields.iter().find(|f| f["name"] == "furnishing_score").unwrap();
    assert_eq!(furnishing["max"], 3);
    assert_eq!(furnishing["default"], 2);
}

#[tokio::test]
async fn test_sample_contains_assembled_record() {
    let (app, _state, _dir) = setup_test_app().await;

    let response = app.oneshot(get("/api/v1/sample")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["inputs"]["deposit"], 2500.0);
    let features = body["features"].as_object().unwrap();
    assert_eq!(features.len(), feature_names().count());
    let log_deposit = features["log_deposit"].as_f64().unwrap();
    assert!((log_deposit - 2500.0_f64.ln_1p()).abs() < 1e-12);
}

#[tokio::test]
async fn test_healthz_returns_ok_when_healthy() {
    let (app, _state, _dir) = setup_test_app().await;

    let response = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health = body_json(response).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["components"]["artifact"]["status"], "healthy");
}

#[tokio::test]
async fn test_single_inference_failure_degrades_health() {
    let (app, _dir) = setup_failing_app().await;
    let form = serde_json::to_value(RentInputs::default()).unwrap();
    app.clone()
        .oneshot(post_json("/api/v1/predict", &form))
        .await
        .unwrap();

    let response = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health = body_json(response).await;
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["components"]["pipeline"]["status"], "degraded");
}

#[tokio::test]
async fn test_healthz_returns_503_after_repeated_failures() {
    let (app, _dir) = setup_failing_app().await;
    let form = serde_json::to_value(RentInputs::default()).unwrap();
    for _ in 0..UNHEALTHY_AFTER_FAILURES {
        let response = app
            .clone()
            .oneshot(post_json("/api/v1/predict", &form))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    let response = app.clone().oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["status"], "unhealthy");

    let response = app.oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["ready"], false);
}

#[tokio::test]
async fn test_rejected_forms_leave_health_untouched() {
    let (app, _state, _dir) = setup_test_app().await;
    let mut form = serde_json::to_value(RentInputs::default()).unwrap();
    form["swimming_pool"] = json!(true);
    for _ in 0..UNHEALTHY_AFTER_FAILURES {
        let response = app
            .clone()
            .oneshot(post_json("/api/v1/predict", &form))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    let response = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_readyz_reports_model_version() {
    let (app, _state, _dir) = setup_test_app().await;

    let response = app.oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let readiness = body_json(response).await;
    assert_eq!(readiness["ready"], true);
    assert_eq!(readiness["model_version"], "test-1");
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_prediction_counters() {
    let (app, _state, _dir) = setup_test_app().await;
    let form = serde_json::to_value(RentInputs::default()).unwrap();
    let response = app
        .clone()
        .oneshot(post_json("/api/v1/predict", &form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("rent_predictor_predictions_total"));
    assert!(text.contains("rent_predictor_model_info"));
}

#[tokio::test]
async fn test_bundled_demo_artifact_loads_as_demo() {
    let config = ServerConfig {
        model_path: concat!(env!("CARGO_MANIFEST_DIR"), "/../../model/demo_rent_predictor.json").into(),
        ..ServerConfig::default()
    };
    let state = build_state(&config).await.unwrap();
    assert_eq!(state.pipeline.model_version(), "demo-linear");

    let readiness = state.health_registry.readiness().await;
    assert_eq!(readiness.model_version.as_deref(), Some("demo-linear"));
}
