//! Govee LAN API (discovery, direct control, capability translation)
//!
//! Devices must have "LAN Control" enabled in the Govee Home app before they
//! answer scans or accept commands.

pub mod control;
pub mod discovery;
pub mod protocol;
pub mod translate;

pub use control::{ControlError, LanController};
pub use discovery::{discover, DiscoveryError, DiscoveryOptions};
pub use protocol::{DeviceStatus, LanCommand, Rgb, ScanResult};
pub use translate::translate;

use async_trait::async_trait;
use thiserror::Error;

/// Why a control request could not be completed over LAN
#[derive(Debug, Error)]
pub enum LanError {
    #[error("LAN discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("device {0} did not answer the LAN scan")]
    NotFound(String),

    #[error("capability {kind}/{instance} has no LAN equivalent")]
    Unsupported { kind: String, instance: String },

    #[error("LAN control failed: {0}")]
    Control(#[from] ControlError),
}

/// LAN operations the gateway depends on
#[async_trait]
pub trait LanApi: Send + Sync {
    /// Scan the network for devices
    async fn discover(&self) -> Result<Vec<ScanResult>, DiscoveryError>;

    /// Send a fire-and-forget command to the device at `ip`
    async fn execute(&self, ip: &str, command: LanCommand) -> Result<(), ControlError>;

    /// Query the device at `ip` for its current state
    async fn status(&self, ip: &str) -> Result<DeviceStatus, ControlError>;
}

/// Real LAN client backed by UDP sockets
#[derive(Debug, Clone, Default)]
pub struct LanClient {
    discovery: DiscoveryOptions,
    controller: LanController,
}

impl LanClient {
    pub fn new(discovery: DiscoveryOptions, controller: LanController) -> Self {
        Self {
            discovery,
            controller,
        }
    }
}

#[async_trait]
impl LanApi for LanClient {
    async fn discover(&self) -> Result<Vec<ScanResult>, DiscoveryError> {
        discover(&self.discovery).await
    }

    async fn execute(&self, ip: &str, command: LanCommand) -> Result<(), ControlError> {
        match command {
            LanCommand::Turn(true) => self.controller.turn_on(ip).await,
            LanCommand::Turn(false) => self.controller.turn_off(ip).await,
            LanCommand::Brightness(percent) => {
                self.controller.set_brightness(ip, i64::from(percent)).await
            }
            LanCommand::Color(Rgb { r, g, b }) => {
                self.controller
                    .set_color(ip, i64::from(r), i64::from(g), i64::from(b))
                    .await
            }
            LanCommand::ColorTemperature(kelvin) => {
                self.controller
                    .set_color_temperature(ip, i64::from(kelvin))
                    .await
            }
            LanCommand::Status => self.controller.get_status(ip).await.map(|_| ()),
        }
    }

    async fn status(&self, ip: &str) -> Result<DeviceStatus, ControlError> {
        self.controller.get_status(ip).await
    }
}
