//! Govee cloud (OpenAPI) client
//!
//! Thin request/response forwarding over the vendor REST API:
//! - `GET  /router/api/v1/user/devices`  - device and capability listing
//! - `POST /router/api/v1/device/control` - set one capability
//!
//! Every request carries the `Govee-API-Key` header. Responses wrap their
//! payload in `{code, message, ...}`; anything but `code == 200` is an error.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::device::{ControlCapability, Device};

pub const DEFAULT_BASE_URL: &str = "https://openapi.api.govee.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEVICES_PATH: &str = "/router/api/v1/user/devices";
const CONTROL_PATH: &str = "/router/api/v1/device/control";
const API_KEY_HEADER: &str = "Govee-API-Key";
const API_SUCCESS_CODE: i64 = 200;

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("govee api key is not configured")]
    MissingApiKey,

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("govee api returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse govee api response: {source}")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("govee api error: {message} (code: {code})")]
    Api { code: i64, message: String },
}

/// Cloud operations the gateway depends on
#[async_trait]
pub trait CloudApi: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<Device>, CloudError>;

    async fn control_device(
        &self,
        sku: &str,
        device: &str,
        capability: &ControlCapability,
    ) -> Result<(), CloudError>;
}

#[derive(Debug, Deserialize)]
struct DevicesResponse {
    code: i64,
    #[serde(default, alias = "msg")]
    message: String,
    #[serde(default)]
    data: Vec<Device>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ControlRequest<'a> {
    request_id: String,
    payload: ControlPayload<'a>,
}

#[derive(Debug, Serialize)]
struct ControlPayload<'a> {
    sku: &'a str,
    device: &'a str,
    capability: &'a ControlCapability,
}

#[derive(Debug, Deserialize)]
struct ControlResponse {
    code: i64,
    #[serde(default, alias = "msg")]
    message: String,
}

/// HTTP client for the Govee cloud API
#[derive(Debug, Clone)]
pub struct GoveeCloudClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GoveeCloudClient {
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CloudError> {
        let client = Client::builder()
            .user_agent(concat!("govee-gateway/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(CloudError::Client)?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_key(&self) -> Result<&str, CloudError> {
        self.api_key.as_deref().ok_or(CloudError::MissingApiKey)
    }

    /// Read the body, failing on non-2xx statuses
    async fn read_body(url: &str, response: reqwest::Response) -> Result<String, CloudError> {
        let status = response.status();
        let body = response.text().await.map_err(|source| CloudError::Request {
            url: url.to_string(),
            source,
        })?;

        if !status.is_success() {
            warn!("Govee API error response from {}: {}", url, body);
            return Err(CloudError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    fn parse<T: serde::de::DeserializeOwned>(body: String) -> Result<T, CloudError> {
        serde_json::from_str(&body).map_err(|source| {
            warn!("Failed to parse Govee API response: {}", body);
            CloudError::Decode { body, source }
        })
    }
}

#[async_trait]
impl CloudApi for GoveeCloudClient {
    async fn list_devices(&self) -> Result<Vec<Device>, CloudError> {
        let url = format!("{}{}", self.base_url, DEVICES_PATH);
        debug!("Making request to Govee API: {}", url);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, self.api_key()?)
            .send()
            .await
            .map_err(|source| CloudError::Request {
                url: url.clone(),
                source,
            })?;

        let body = Self::read_body(&url, response).await?;
        let parsed: DevicesResponse = Self::parse(body)?;
        if parsed.code != API_SUCCESS_CODE {
            return Err(CloudError::Api {
                code: parsed.code,
                message: parsed.message,
            });
        }

        info!("Fetched {} device(s) from Govee API", parsed.data.len());
        Ok(parsed.data)
    }

    async fn control_device(
        &self,
        sku: &str,
        device: &str,
        capability: &ControlCapability,
    ) -> Result<(), CloudError> {
        let url = format!("{}{}", self.base_url, CONTROL_PATH);
        let request = ControlRequest {
            request_id: Uuid::new_v4().to_string(),
            payload: ControlPayload {
                sku,
                device,
                capability,
            },
        };
        debug!(
            request_id = %request.request_id,
            sku,
            device,
            capability = ?capability,
            "Making control request to Govee API"
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.api_key()?)
            .json(&request)
            .send()
            .await
            .map_err(|source| CloudError::Request {
                url: url.clone(),
                source,
            })?;

        let body = Self::read_body(&url, response).await?;
        let parsed: ControlResponse = Self::parse(body)?;
        if parsed.code != API_SUCCESS_CODE {
            return Err(CloudError::Api {
                code: parsed.code,
                message: parsed.message,
            });
        }

        info!("Controlled device {} via Govee API", device);
        Ok(())
    }
}
