//! Govee LAN discovery via UDP multicast
//!
//! Sends one `scan` request to 239.255.255.250:4001 and listens on port 4002
//! for replies until the timeout elapses. Devices reply to the fixed port, not
//! to the socket the request came from, so discovery needs two sockets.
//!
//! Every call is a fresh scan: results are neither cached nor deduplicated, so
//! a device that answers twice shows up twice.
//!
//! Example usage with socat:
//! ```bash
//! echo -n '{"msg":{"cmd":"scan","data":{"account_topic":"reserve"}}}' | socat - udp-datagram:239.255.255.250:4001
//! ```

use std::io;
use std::net::{SocketAddr, SocketAddrV4};
use std::time::Duration;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use super::protocol::{
    decode_scan_response, encode_scan_request, ScanResult, LISTEN_PORT, MAX_DATAGRAM_SIZE,
    MULTICAST_GROUP, SCAN_PORT,
};

/// Default scan window
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to bind {role} socket on {addr}: {source}")]
    Bind {
        role: &'static str,
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode scan request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to send scan request to {target}: {source}")]
    Send {
        target: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// A non-timeout read error ended the scan early.
    ///
    /// The scan fails as a whole, but the replies received before the error
    /// are kept here for callers that want them.
    #[error("failed to read scan response after {} device(s): {source}", .collected.len())]
    Receive {
        collected: Vec<ScanResult>,
        #[source]
        source: io::Error,
    },
}

/// Where to send the scan and where to listen for replies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    pub scan_target: SocketAddr,
    pub listen_addr: SocketAddr,
    pub timeout: Duration,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            scan_target: SocketAddr::V4(SocketAddrV4::new(MULTICAST_GROUP, SCAN_PORT)),
            listen_addr: SocketAddr::from(([0, 0, 0, 0], LISTEN_PORT)),
            timeout: DEFAULT_DISCOVERY_TIMEOUT,
        }
    }
}

impl DiscoveryOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Scan the local network for Govee devices
///
/// A read timeout is the normal way a scan ends. Malformed replies are logged
/// and skipped. Any other read error aborts the scan with
/// [`DiscoveryError::Receive`].
pub async fn discover(options: &DiscoveryOptions) -> Result<Vec<ScanResult>, DiscoveryError> {
    let send_addr = match options.scan_target {
        SocketAddr::V4(_) => SocketAddr::from(([0, 0, 0, 0], 0)),
        SocketAddr::V6(_) => SocketAddr::from(([0u16; 8], 0)),
    };
    let sender = bind("send", send_addr).await?;
    let listener = bind("listen", options.listen_addr).await?;

    let request = encode_scan_request()?;
    sender
        .send_to(&request, options.scan_target)
        .await
        .map_err(|source| DiscoveryError::Send {
            target: options.scan_target,
            source,
        })?;

    debug!(
        "Sent LAN scan request to {}, listening on {} for {:?}",
        options.scan_target, options.listen_addr, options.timeout
    );

    let devices = collect_responses(&listener, Instant::now() + options.timeout).await?;
    info!("LAN discovery found {} device(s)", devices.len());
    Ok(devices)
}

async fn bind(role: &'static str, addr: SocketAddr) -> Result<UdpSocket, DiscoveryError> {
    UdpSocket::bind(addr)
        .await
        .map_err(|source| DiscoveryError::Bind { role, addr, source })
}

/// Read scan responses from `socket` until `deadline`
pub(crate) async fn collect_responses(
    socket: &UdpSocket,
    deadline: Instant,
) -> Result<Vec<ScanResult>, DiscoveryError> {
    let mut devices = Vec::new();
    let mut buf = [0u8; MAX_DATAGRAM_SIZE];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }

        match timeout(remaining, socket.recv_from(&mut buf)).await {
            Ok(Ok((len, from))) => match decode_scan_response(&buf[..len]) {
                Ok(device) => {
                    debug!(
                        "LAN scan response from {}: {} ({}) at {}",
                        from, device.device, device.sku, device.ip
                    );
                    devices.push(device);
                }
                Err(e) => {
                    warn!("Skipping malformed LAN scan response from {}: {}", from, e);
                }
            },
            Ok(Err(source)) => {
                return Err(DiscoveryError::Receive {
                    collected: devices,
                    source,
                });
            }
            // Deadline reached
            Err(_) => break,
        }
    }

    Ok(devices)
}
