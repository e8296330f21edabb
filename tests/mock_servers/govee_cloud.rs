//! Mock Govee cloud API for testing
//!
//! Serves the device listing and control endpoints under /router/api/v1 and
//! records every control request it receives.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

pub const MOCK_API_KEY: &str = "test-api-key";

/// A control request as seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedControl {
    pub api_key: Option<String>,
    pub body: Value,
}

struct MockCloudState {
    devices: Vec<Value>,
    code: i64,
    message: String,
    /// Forces every endpoint to answer with this HTTP status
    http_status: Option<StatusCode>,
    controls: Vec<RecordedControl>,
    device_requests: usize,
}

impl Default for MockCloudState {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            code: 200,
            message: "success".to_string(),
            http_status: None,
            controls: Vec::new(),
            device_requests: 0,
        }
    }
}

/// Mock Govee cloud server
pub struct MockGoveeCloud {
    addr: SocketAddr,
    state: Arc<RwLock<MockCloudState>>,
    handle: JoinHandle<()>,
}

impl MockGoveeCloud {
    /// Start the mock on a random port
    pub async fn start() -> Self {
        let state = Arc::new(RwLock::new(MockCloudState::default()));

        let app = Router::new()
            .route("/router/api/v1/user/devices", get(handle_devices))
            .route("/router/api/v1/device/control", post(handle_control))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn add_device(&self, device: Value) {
        self.state.write().await.devices.push(device);
    }

    /// Set the `code`/`message` pair returned in response bodies
    pub async fn set_api_result(&self, code: i64, message: &str) {
        let mut state = self.state.write().await;
        state.code = code;
        state.message = message.to_string();
    }

    pub async fn set_http_status(&self, status: StatusCode) {
        self.state.write().await.http_status = Some(status);
    }

    pub async fn controls(&self) -> Vec<RecordedControl> {
        self.state.read().await.controls.clone()
    }

    pub async fn device_requests(&self) -> usize {
        self.state.read().await.device_requests
    }

    pub async fn stop(self) {
        self.handle.abort();
    }
}

fn api_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get("govee-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"code": 401, "message": "Invalid API key"})),
    )
        .into_response()
}

async fn handle_devices(
    State(state): State<Arc<RwLock<MockCloudState>>>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.write().await;
    state.device_requests += 1;

    if let Some(status) = state.http_status {
        return (status, "upstream unavailable").into_response();
    }
    if api_key(&headers).as_deref() != Some(MOCK_API_KEY) {
        return unauthorized();
    }

    Json(json!({
        "code": state.code,
        "message": state.message,
        "data": state.devices,
    }))
    .into_response()
}

async fn handle_control(
    State(state): State<Arc<RwLock<MockCloudState>>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.write().await;
    let key = api_key(&headers);
    state.controls.push(RecordedControl {
        api_key: key.clone(),
        body: body.clone(),
    });

    if let Some(status) = state.http_status {
        return (status, "upstream unavailable").into_response();
    }
    if key.as_deref() != Some(MOCK_API_KEY) {
        return unauthorized();
    }

    // The real API answers control requests with `msg` rather than `message`
    Json(json!({
        "requestId": body["requestId"],
        "code": state.code,
        "msg": state.message,
        "capability": body["payload"]["capability"],
    }))
    .into_response()
}
