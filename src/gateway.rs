//! Device gateway: LAN first, cloud fallback
//!
//! ```text
//! control(sku, device, capability)
//!   ├─ LAN disabled ───────────────────────────────┐
//!   ├─ discover ── error ──────────────────────────┤
//!   ├─ first scan result with matching device id   │
//!   │    └─ none ──────────────────────────────────┤
//!   ├─ translate ── unsupported ───────────────────┤
//!   ├─ send over LAN ── error ─────────────────────┤
//!   │    └─ ok → done (cloud never called)         │
//!   └──────────────────────────────────── cloud control
//! ```
//!
//! LAN failures are logged and recovered by the cloud fallback. Cloud failures
//! are returned to the caller. Device listing always comes from the cloud
//! because scan replies carry no capability metadata.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cloud::{CloudApi, CloudError};
use crate::device::{ControlCapability, Device};
use crate::lan::{
    translate, ControlError, DeviceStatus, DiscoveryError, LanApi, LanError, ScanResult,
};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),

    #[error("cloud request failed: {0}")]
    Cloud(#[from] CloudError),

    #[error("LAN discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("LAN control failed: {0}")]
    Control(#[from] ControlError),
}

/// Which path delivered a control command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPath {
    Lan,
    Cloud,
}

/// Routes device requests to the LAN or the cloud
pub struct DeviceGateway {
    cloud: Arc<dyn CloudApi>,
    lan: Arc<dyn LanApi>,
    lan_enabled: bool,
}

impl DeviceGateway {
    pub fn new(cloud: Arc<dyn CloudApi>, lan: Arc<dyn LanApi>, lan_enabled: bool) -> Self {
        Self {
            cloud,
            lan,
            lan_enabled,
        }
    }

    pub fn lan_enabled(&self) -> bool {
        self.lan_enabled
    }

    /// List devices and their capabilities from the cloud
    pub async fn list_devices(&self) -> Result<Vec<Device>, GatewayError> {
        Ok(self.cloud.list_devices().await?)
    }

    /// Scan the LAN, regardless of whether LAN control is enabled
    pub async fn discover_lan(&self) -> Result<Vec<ScanResult>, GatewayError> {
        Ok(self.lan.discover().await?)
    }

    /// Query a device's state directly over LAN
    pub async fn lan_status(&self, ip: &str) -> Result<DeviceStatus, GatewayError> {
        Ok(self.lan.status(ip).await?)
    }

    /// Set one capability on one device
    pub async fn control(
        &self,
        sku: &str,
        device: &str,
        capability: &ControlCapability,
    ) -> Result<ControlPath, GatewayError> {
        validate(sku, device, capability)?;

        if self.lan_enabled {
            match self.try_lan(device, capability).await {
                Ok(()) => {
                    info!("Controlled device {} via LAN", device);
                    return Ok(ControlPath::Lan);
                }
                Err(e @ (LanError::Unsupported { .. } | LanError::NotFound(_))) => {
                    debug!("{}, using cloud API", e);
                }
                Err(e) => {
                    warn!(
                        "Failed to control device {} via LAN, falling back to cloud API: {}",
                        device, e
                    );
                }
            }
        }

        self.cloud.control_device(sku, device, capability).await?;
        Ok(ControlPath::Cloud)
    }

    async fn try_lan(&self, device: &str, capability: &ControlCapability) -> Result<(), LanError> {
        let command = translate(capability).ok_or_else(|| LanError::Unsupported {
            kind: capability.kind.clone(),
            instance: capability.instance.clone(),
        })?;

        let found = self.lan.discover().await?;
        // First reply in receive order wins when a device answers more than once
        let target = found
            .iter()
            .find(|d| d.device == device)
            .ok_or_else(|| LanError::NotFound(device.to_string()))?;

        debug!("Sending {:?} to {} at {}", command, device, target.ip);
        self.lan.execute(&target.ip, command).await?;
        Ok(())
    }
}

fn validate(sku: &str, device: &str, capability: &ControlCapability) -> Result<(), GatewayError> {
    if sku.is_empty() || device.is_empty() {
        return Err(GatewayError::InvalidRequest("sku and device are required"));
    }
    if capability.kind.is_empty() || capability.instance.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "capability type and instance are required",
        ));
    }
    Ok(())
}
