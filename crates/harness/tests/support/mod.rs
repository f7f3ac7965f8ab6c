//! Shared in-process fake of the Paasport backend for integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

/// Knobs for the fake backend's behavior
pub struct FakeBackend {
    pub healthy: bool,
    pub emit_token: bool,
    pub application_hits: AtomicUsize,
}

impl FakeBackend {
    pub fn healthy() -> Arc<Self> {
        Self::with(true, true)
    }

    pub fn with(healthy: bool, emit_token: bool) -> Arc<Self> {
        Arc::new(Self {
            healthy,
            emit_token,
            application_hits: AtomicUsize::new(0),
        })
    }

    pub fn application_hits(&self) -> usize {
        self.application_hits.load(Ordering::SeqCst)
    }
}

pub fn router(state: Arc<FakeBackend>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route(
            "/api/v1/applications",
            get(list_applications).post(create_application),
        )
        .route(
            "/api/v1/applications/:id",
            get(get_application)
                .put(update_application)
                .delete(delete_application),
        )
        .route("/api/v1/deployments", get(list_deployments))
        .route("/api/v1/analytics/usage", get(analytics_usage))
        .route("/api/v1/analytics/performance", get(analytics_performance))
        .route("/graphql", post(graphql))
        .with_state(state)
}

/// Bind an ephemeral port and serve the fake backend in the background
pub async fn serve(state: Arc<FakeBackend>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

async fn health(State(state): State<Arc<FakeBackend>>) -> (StatusCode, Json<Value>) {
    if state.healthy {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "degraded" })),
        )
    }
}

async fn login(State(state): State<Arc<FakeBackend>>, Json(_body): Json<Value>) -> Json<Value> {
    if state.emit_token {
        Json(json!({ "token": "fake-bearer-token" }))
    } else {
        Json(json!({ "message": "logged in" }))
    }
}

async fn create_application(
    State(state): State<Arc<FakeBackend>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.application_hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::CREATED,
        Json(json!({
            "id": "app-1",
            "name": body.get("name").cloned().unwrap_or(Value::Null),
            "status": "created",
        })),
    )
}

async fn list_applications(State(state): State<Arc<FakeBackend>>) -> Json<Value> {
    state.application_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!([{ "id": "app-1", "name": "harness-probe-app" }]))
}

async fn get_application(
    State(state): State<Arc<FakeBackend>>,
    Path(id): Path<String>,
) -> Json<Value> {
    state.application_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "id": id, "name": "harness-probe-app" }))
}

async fn update_application(
    State(state): State<Arc<FakeBackend>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.application_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "id": id, "name": body.get("name").cloned().unwrap_or(Value::Null) }))
}

async fn delete_application(
    State(state): State<Arc<FakeBackend>>,
    Path(_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    state.application_hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::OK, Json(json!({ "deleted": true })))
}

async fn list_deployments() -> Json<Value> {
    Json(json!([
        { "id": "dep-1", "application_id": "app-1", "status": "running" },
    ]))
}

async fn analytics_usage() -> Json<Value> {
    Json(json!({ "requests": 1234, "applications": 3 }))
}

async fn analytics_performance() -> Json<Value> {
    Json(json!({ "p50_ms": 12, "p95_ms": 85 }))
}

async fn graphql(Json(_query): Json<Value>) -> Json<Value> {
    Json(json!({ "data": { "applications": [] } }))
}
