//! Direct device control over the Govee LAN API
//!
//! Each operation opens a fresh UDP socket, connects it to `<device ip>:4003`,
//! sends a single command and drops the socket. Only `devStatus` gets a
//! reply; the read is bounded by the controller's status timeout.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::timeout;
use tracing::debug;

use super::protocol::{
    decode_status_response, DeviceStatus, LanCommand, CONTROL_PORT, MAX_DATAGRAM_SIZE,
};

/// How long `devStatus` waits for a reply
pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("failed to resolve device address {addr}: {source}")]
    Resolve {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("device address {0} did not resolve to any socket address")]
    Unresolved(String),

    #[error("failed to create UDP socket: {0}")]
    Bind(#[source] io::Error),

    #[error("failed to connect to device {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode {cmd} request: {source}")]
    Encode {
        cmd: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to send {cmd} request to {addr}: {source}")]
    Send {
        cmd: &'static str,
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to read response from {addr}: {source}")]
    Receive {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("no response from {addr} within {timeout:?}")]
    Timeout { addr: SocketAddr, timeout: Duration },

    #[error("failed to decode response from {addr}: {source}")]
    Decode {
        addr: SocketAddr,
        #[source]
        source: serde_json::Error,
    },
}

/// Sends one-shot LAN commands to devices
#[derive(Debug, Clone)]
pub struct LanController {
    port: u16,
    status_timeout: Duration,
}

impl Default for LanController {
    fn default() -> Self {
        Self::new()
    }
}

impl LanController {
    pub fn new() -> Self {
        Self {
            port: CONTROL_PORT,
            status_timeout: DEFAULT_STATUS_TIMEOUT,
        }
    }

    /// Override the device control port (4003 on real hardware)
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_status_timeout(mut self, status_timeout: Duration) -> Self {
        self.status_timeout = status_timeout;
        self
    }

    pub async fn turn_on(&self, ip: &str) -> Result<(), ControlError> {
        self.send(ip, LanCommand::Turn(true)).await.map(|_| ())
    }

    pub async fn turn_off(&self, ip: &str) -> Result<(), ControlError> {
        self.send(ip, LanCommand::Turn(false)).await.map(|_| ())
    }

    /// Set brightness in percent; values outside 1-100 are clamped
    pub async fn set_brightness(&self, ip: &str, percent: i64) -> Result<(), ControlError> {
        self.send(ip, LanCommand::brightness(percent)).await.map(|_| ())
    }

    /// Set an RGB color; each channel is clamped to 0-255
    pub async fn set_color(&self, ip: &str, r: i64, g: i64, b: i64) -> Result<(), ControlError> {
        self.send(ip, LanCommand::color(r, g, b)).await.map(|_| ())
    }

    /// Set a white color temperature; clamped to 2000-9000K
    pub async fn set_color_temperature(&self, ip: &str, kelvin: i64) -> Result<(), ControlError> {
        self.send(ip, LanCommand::color_temperature(kelvin))
            .await
            .map(|_| ())
    }

    pub async fn get_status(&self, ip: &str) -> Result<DeviceStatus, ControlError> {
        let status = self.send(ip, LanCommand::Status).await?;
        Ok(status.unwrap_or_default())
    }

    /// Send a command, returning the decoded reply for commands that have one
    pub async fn send(
        &self,
        ip: &str,
        command: LanCommand,
    ) -> Result<Option<DeviceStatus>, ControlError> {
        let cmd = command.cmd();
        let (socket, addr) = self.connect(ip).await?;

        let request = command
            .encode()
            .map_err(|source| ControlError::Encode { cmd, source })?;

        socket
            .send(&request)
            .await
            .map_err(|source| ControlError::Send { cmd, addr, source })?;
        debug!("Sent LAN {} to {}: {:?}", cmd, addr, command);

        if !command.expects_reply() {
            return Ok(None);
        }

        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        let len = match timeout(self.status_timeout, socket.recv(&mut buf)).await {
            Ok(Ok(len)) => len,
            Ok(Err(source)) => return Err(ControlError::Receive { addr, source }),
            Err(_) => {
                return Err(ControlError::Timeout {
                    addr,
                    timeout: self.status_timeout,
                })
            }
        };

        let status = decode_status_response(&buf[..len])
            .map_err(|source| ControlError::Decode { addr, source })?;
        debug!("LAN status from {}: {:?}", addr, status);
        Ok(Some(status))
    }

    async fn connect(&self, ip: &str) -> Result<(UdpSocket, SocketAddr), ControlError> {
        let addr = lookup_host((ip, self.port))
            .await
            .map_err(|source| ControlError::Resolve {
                addr: format!("{}:{}", ip, self.port),
                source,
            })?
            .next()
            .ok_or_else(|| ControlError::Unresolved(format!("{}:{}", ip, self.port)))?;

        let local = match addr {
            SocketAddr::V4(_) => SocketAddr::from(([0, 0, 0, 0], 0)),
            SocketAddr::V6(_) => SocketAddr::from(([0u16; 8], 0)),
        };
        let socket = UdpSocket::bind(local).await.map_err(ControlError::Bind)?;
        socket
            .connect(addr)
            .await
            .map_err(|source| ControlError::Connect { addr, source })?;

        Ok((socket, addr))
    }
}
