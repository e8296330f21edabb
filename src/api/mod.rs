//! HTTP API handlers
//!
//! Every response is JSON. Success bodies carry `success: true`; errors use
//! `{error, description?, code}` with a matching HTTP status.

use crate::cloud::CloudError;
use crate::device::{ControlCapability, Device};
use crate::gateway::{DeviceGateway, GatewayError};
use crate::lan::protocol::Envelope;
use crate::lan::{DeviceStatus, ScanResult};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::Arc;

pub const CONTROL_SUCCESS_MESSAGE: &str = "Device control command sent successfully";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<DeviceGateway>,
}

impl AppState {
    pub fn new(gateway: DeviceGateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status_handler).fallback(get_only))
        .route("/api/v1/devices", get(devices_handler).fallback(get_only))
        .route("/api/v1/devices/lan", get(lan_devices_handler).fallback(get_only))
        .route(
            "/api/v1/devices/lan/{ip}/status",
            get(lan_status_handler).fallback(get_only),
        )
        .route("/api/v1/devices/control", post(control_handler).fallback(post_only))
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub code: u16,
}

/// Error returned by handlers
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    description: Option<String>,
}

impl ApiError {
    pub fn bad_request(description: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            description: Some(description.into()),
        }
    }

    pub fn method_not_allowed(description: impl Into<String>) -> Self {
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            description: Some(description.into()),
        }
    }

    pub fn internal(description: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            description: Some(description.into()),
        }
    }

    /// Map a gateway error, using `fallback` as the description unless the
    /// error came back from the Govee API itself
    fn from_gateway(err: GatewayError, fallback: &str) -> Self {
        match err {
            GatewayError::InvalidRequest(reason) => Self::bad_request(reason),
            GatewayError::Cloud(
                e @ (CloudError::Api { .. } | CloudError::Status { .. }),
            ) => Self::internal(e.to_string()),
            _ => Self::internal(fallback),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = match self.status {
            StatusCode::BAD_REQUEST => "Bad request",
            StatusCode::METHOD_NOT_ALLOWED => "Method not allowed",
            _ => "Internal server error",
        };
        let body = ErrorResponse {
            error: error.to_string(),
            description: self.description,
            code: self.status.as_u16(),
        };
        (self.status, Json(body)).into_response()
    }
}

async fn get_only() -> ApiError {
    ApiError::method_not_allowed("Only GET method is allowed for this endpoint")
}

async fn post_only() -> ApiError {
    ApiError::method_not_allowed("Only POST method is allowed for this endpoint")
}

// =============================================================================
// Status
// =============================================================================

#[derive(Serialize)]
pub struct StatusResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub git_sha: &'static str,
    pub lan_enabled: bool,
}

/// GET /status - Service health check
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        service: "govee-gateway",
        version: env!("GOVEE_GATEWAY_VERSION"),
        git_sha: env!("GOVEE_GATEWAY_GIT_SHA"),
        lan_enabled: state.gateway.lan_enabled(),
    })
}

// =============================================================================
// Devices
// =============================================================================

/// Success envelope for list endpoints
#[derive(Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// GET /api/v1/devices - Devices and capabilities from the Govee cloud
pub async fn devices_handler(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<Vec<Device>>>, ApiError> {
    match state.gateway.list_devices().await {
        Ok(devices) => Ok(DataResponse::ok(devices)),
        Err(e) => {
            tracing::error!("Error fetching devices: {}", e);
            Err(ApiError::from_gateway(
                e,
                "Failed to fetch devices from Govee API",
            ))
        }
    }
}

/// GET /api/v1/devices/lan - Devices answering a LAN scan
///
/// Each entry is the scan reply as the device sent it: `{msg: {cmd, data}}`.
pub async fn lan_devices_handler(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<Vec<Envelope<ScanResult>>>>, ApiError> {
    match state.gateway.discover_lan().await {
        Ok(devices) => Ok(DataResponse::ok(
            devices.into_iter().map(ScanResult::into_envelope).collect(),
        )),
        Err(e) => {
            tracing::error!("Error discovering LAN devices: {}", e);
            Err(ApiError::from_gateway(e, "Failed to discover LAN devices"))
        }
    }
}

/// GET /api/v1/devices/lan/{ip}/status - Live state of a LAN device
pub async fn lan_status_handler(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<Json<DataResponse<DeviceStatus>>, ApiError> {
    let ip: IpAddr = ip
        .parse()
        .map_err(|_| ApiError::bad_request("Device address must be an IP address"))?;

    match state.gateway.lan_status(&ip.to_string()).await {
        Ok(status) => Ok(DataResponse::ok(status)),
        Err(e) => {
            tracing::error!("Error querying LAN device {}: {}", ip, e);
            Err(ApiError::from_gateway(e, "Failed to query LAN device status"))
        }
    }
}

// =============================================================================
// Control
// =============================================================================

/// Control request body
#[derive(Debug, Deserialize)]
pub struct ControlRequest {
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub device: String,
    #[serde(default)]
    pub capability: ControlCapability,
}

impl ControlRequest {
    /// Reject requests missing required fields, before any network call
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.sku.is_empty() || self.device.is_empty() {
            return Err(ApiError::bad_request(
                "Missing required fields: sku and device",
            ));
        }
        if self.capability.kind.is_empty() || self.capability.instance.is_empty() {
            return Err(ApiError::bad_request(
                "Missing required capability fields: type and instance",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ControlResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/v1/devices/control - Set one capability, LAN first when enabled
pub async fn control_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ControlResponse>, ApiError> {
    tracing::debug!(
        "Received control request: {}",
        String::from_utf8_lossy(&body)
    );

    let req: ControlRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!("Error decoding control request: {}", e);
        ApiError::bad_request("Invalid request body format")
    })?;
    req.validate()?;

    match state
        .gateway
        .control(&req.sku, &req.device, &req.capability)
        .await
    {
        Ok(path) => {
            tracing::info!("Control request for {} delivered via {:?}", req.device, path);
            Ok(Json(ControlResponse {
                success: true,
                message: CONTROL_SUCCESS_MESSAGE.to_string(),
            }))
        }
        Err(e) => {
            tracing::error!("Error controlling device: {}", e);
            Err(ApiError::from_gateway(e, "Failed to control device"))
        }
    }
}
