//! Mock Govee LAN device for testing
//!
//! Listens on two loopback UDP sockets: one standing in for the multicast scan
//! port and one for the control port. Scan requests are answered by sending a
//! scan reply to `reply_to`; `devStatus` requests are answered to the sender.

use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub struct MockLanDevice {
    scan_addr: SocketAddr,
    control_addr: SocketAddr,
    received: Arc<Mutex<Vec<Value>>>,
    handles: Vec<JoinHandle<()>>,
}

impl MockLanDevice {
    /// Start a device that announces itself as `device`/`sku` on 127.0.0.1
    pub async fn start(device: &str, sku: &str, reply_to: SocketAddr) -> Self {
        let scan_socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let control_socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let scan_addr = scan_socket.local_addr().unwrap();
        let control_addr = control_socket.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));

        let scan_reply = json!({
            "msg": {
                "cmd": "scan",
                "data": {
                    "ip": "127.0.0.1",
                    "device": device,
                    "sku": sku,
                    "bleVersionHard": "3.01.01",
                    "bleVersionSoft": "1.03.01",
                    "wifiVersionHard": "1.00.10",
                    "wifiVersionSoft": "1.02.03"
                }
            }
        })
        .to_string();

        let scan_handle = tokio::spawn(async move {
            let mut buf = [0u8; 1024];
            while let Ok((len, _)) = scan_socket.recv_from(&mut buf).await {
                let Ok(request) = serde_json::from_slice::<Value>(&buf[..len]) else {
                    continue;
                };
                if request["msg"]["cmd"] == "scan" {
                    let _ = scan_socket.send_to(scan_reply.as_bytes(), reply_to).await;
                }
            }
        });

        let log = received.clone();
        let control_handle = tokio::spawn(async move {
            let mut buf = [0u8; 1024];
            while let Ok((len, peer)) = control_socket.recv_from(&mut buf).await {
                let Ok(request) = serde_json::from_slice::<Value>(&buf[..len]) else {
                    continue;
                };
                let is_status = request["msg"]["cmd"] == "devStatus";
                log.lock().await.push(request);

                if is_status {
                    let reply = json!({
                        "msg": {
                            "cmd": "devStatus",
                            "data": {
                                "onOff": 1,
                                "brightness": 80,
                                "color": {"r": 255, "g": 128, "b": 0},
                                "colorTemInKelvin": 0
                            }
                        }
                    });
                    let _ = control_socket
                        .send_to(reply.to_string().as_bytes(), peer)
                        .await;
                }
            }
        });

        Self {
            scan_addr,
            control_addr,
            received,
            handles: vec![scan_handle, control_handle],
        }
    }

    /// Address to use as the discovery scan target
    pub fn scan_addr(&self) -> SocketAddr {
        self.scan_addr
    }

    /// Port to configure on the LAN controller
    pub fn control_port(&self) -> u16 {
        self.control_addr.port()
    }

    /// Wait until at least `count` control messages arrived, then return all of them
    pub async fn wait_for_commands(&self, count: usize) -> Vec<Value> {
        for _ in 0..50 {
            {
                let received = self.received.lock().await;
                if received.len() >= count {
                    return received.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.received.lock().await.clone()
    }

    pub async fn commands(&self) -> Vec<Value> {
        self.received.lock().await.clone()
    }

    pub async fn stop(self) {
        for handle in self.handles {
            handle.abort();
        }
    }
}

/// Reserve a free loopback UDP port for the discovery listener
pub fn free_udp_port() -> SocketAddr {
    let probe = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
    probe.local_addr().unwrap()
}
