//! In-process fakes for the gateway's cloud and LAN dependencies
//!
//! Both record every call so tests can assert which path handled a request.

#![allow(dead_code)]

use async_trait::async_trait;
use govee_gateway::cloud::{CloudApi, CloudError};
use govee_gateway::device::{ControlCapability, Device};
use govee_gateway::lan::{
    ControlError, DeviceStatus, DiscoveryError, LanApi, LanCommand, ScanResult,
};
use std::io;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

/// A recorded cloud control call
#[derive(Debug, Clone, PartialEq)]
pub struct CloudCall {
    pub sku: String,
    pub device: String,
    pub capability: ControlCapability,
}

/// Cloud fake that records control calls and returns canned results
#[derive(Default)]
pub struct SpyCloud {
    devices: Vec<Device>,
    fail_with: Mutex<Option<CloudError>>,
    calls: Mutex<Vec<CloudCall>>,
    list_calls: Mutex<usize>,
}

impl SpyCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices(mut self, devices: Vec<Device>) -> Self {
        self.devices = devices;
        self
    }

    /// Fail the next call with `err`
    pub fn failing(self, err: CloudError) -> Self {
        *self.fail_with.lock().unwrap() = Some(err);
        self
    }

    pub fn calls(&self) -> Vec<CloudCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }
}

#[async_trait]
impl CloudApi for SpyCloud {
    async fn list_devices(&self) -> Result<Vec<Device>, CloudError> {
        *self.list_calls.lock().unwrap() += 1;
        if let Some(err) = self.fail_with.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.devices.clone())
    }

    async fn control_device(
        &self,
        sku: &str,
        device: &str,
        capability: &ControlCapability,
    ) -> Result<(), CloudError> {
        self.calls.lock().unwrap().push(CloudCall {
            sku: sku.to_string(),
            device: device.to_string(),
            capability: capability.clone(),
        });
        if let Some(err) = self.fail_with.lock().unwrap().take() {
            return Err(err);
        }
        Ok(())
    }
}

/// How the fake LAN answers a scan
pub enum ScanBehavior {
    Found(Vec<ScanResult>),
    SendFails,
    ReadFails(Vec<ScanResult>),
}

/// LAN fake with scripted discovery and recorded commands
pub struct FakeLan {
    scan: ScanBehavior,
    execute_fails: bool,
    status: Option<DeviceStatus>,
    scans: Mutex<usize>,
    executed: Mutex<Vec<(String, LanCommand)>>,
}

impl FakeLan {
    pub fn with_devices(devices: Vec<ScanResult>) -> Self {
        Self::new(ScanBehavior::Found(devices))
    }

    pub fn new(scan: ScanBehavior) -> Self {
        Self {
            scan,
            execute_fails: false,
            status: None,
            scans: Mutex::new(0),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn execute_fails(mut self) -> Self {
        self.execute_fails = true;
        self
    }

    pub fn with_status(mut self, status: DeviceStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn scans(&self) -> usize {
        *self.scans.lock().unwrap()
    }

    pub fn executed(&self) -> Vec<(String, LanCommand)> {
        self.executed.lock().unwrap().clone()
    }
}

fn device_addr(ip: &str) -> SocketAddr {
    format!("{ip}:4003")
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 4003)))
}

#[async_trait]
impl LanApi for FakeLan {
    async fn discover(&self) -> Result<Vec<ScanResult>, DiscoveryError> {
        *self.scans.lock().unwrap() += 1;
        match &self.scan {
            ScanBehavior::Found(devices) => Ok(devices.clone()),
            ScanBehavior::SendFails => Err(DiscoveryError::Send {
                target: SocketAddr::from(([239, 255, 255, 250], 4001)),
                source: io::Error::new(io::ErrorKind::Other, "network unreachable"),
            }),
            ScanBehavior::ReadFails(collected) => Err(DiscoveryError::Receive {
                collected: collected.clone(),
                source: io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"),
            }),
        }
    }

    async fn execute(&self, ip: &str, command: LanCommand) -> Result<(), ControlError> {
        self.executed
            .lock()
            .unwrap()
            .push((ip.to_string(), command));
        if self.execute_fails {
            return Err(ControlError::Send {
                cmd: command.cmd(),
                addr: device_addr(ip),
                source: io::Error::new(io::ErrorKind::Other, "host unreachable"),
            });
        }
        Ok(())
    }

    async fn status(&self, ip: &str) -> Result<DeviceStatus, ControlError> {
        self.status.clone().ok_or(ControlError::Timeout {
            addr: device_addr(ip),
            timeout: Duration::from_secs(2),
        })
    }
}

/// A scan reply for `device` at `ip`
pub fn scan_result(ip: &str, device: &str, sku: &str) -> ScanResult {
    serde_json::from_value(serde_json::json!({
        "ip": ip,
        "device": device,
        "sku": sku,
    }))
    .unwrap()
}
