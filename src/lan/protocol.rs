//! Govee LAN API wire format
//!
//! Every datagram is a JSON object with a single `msg` envelope:
//!
//! ```text
//! {"msg": {"cmd": "<command>", "data": { ... }}}
//! ```
//!
//! Reference: https://app-h5.govee.com/user-manual/wlan-guide
//!
//! Optional response fields are omitted (not zeroed) when absent, and decoding
//! tolerates any of them being missing. Device firmware is picky about extra
//! fields, so request payloads only ever carry what the command needs.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Multicast group devices listen on for scan requests
pub const MULTICAST_GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// Port devices receive scan requests on
pub const SCAN_PORT: u16 = 4001;

/// Port devices send scan responses to
pub const LISTEN_PORT: u16 = 4002;

/// Port devices accept control commands on
pub const CONTROL_PORT: u16 = 4003;

/// Receive buffer size for a single datagram
pub const MAX_DATAGRAM_SIZE: usize = 1024;

const SCAN_CMD: &str = "scan";
const SCAN_ACCOUNT_TOPIC: &str = "reserve";

/// Outer `{"msg": ...}` wrapper shared by every LAN message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub msg: Message<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message<T> {
    pub cmd: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(cmd: impl Into<String>, data: T) -> Self {
        Self {
            msg: Message {
                cmd: cmd.into(),
                data,
            },
        }
    }
}

// =============================================================================
// Discovery
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ScanRequestData {
    account_topic: String,
}

/// Encode the multicast scan request
pub fn encode_scan_request() -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(&Envelope::new(
        SCAN_CMD,
        ScanRequestData {
            account_topic: SCAN_ACCOUNT_TOPIC.to_string(),
        },
    ))
}

/// A device that answered a scan request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    /// Device IP address on the local network
    pub ip: String,
    /// Vendor device id (MAC-like, matches the cloud `device` field)
    pub device: String,
    pub sku: String,
    #[serde(default)]
    pub ble_version_hard: String,
    #[serde(default)]
    pub ble_version_soft: String,
    #[serde(default)]
    pub wifi_version_hard: String,
    #[serde(default)]
    pub wifi_version_soft: String,
}

/// Decode a scan response datagram
///
/// `ip`, `device` and `sku` are required; version strings default to empty.
pub fn decode_scan_response(datagram: &[u8]) -> serde_json::Result<ScanResult> {
    let envelope: Envelope<ScanResult> = serde_json::from_slice(datagram)?;
    Ok(envelope.msg.data)
}

impl ScanResult {
    /// Wrap as the `{"msg":{"cmd":"scan","data":...}}` message the device sent
    pub fn into_envelope(self) -> Envelope<ScanResult> {
        Envelope::new(SCAN_CMD, self)
    }
}

// =============================================================================
// Control
// =============================================================================

/// RGB color triple as sent on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Build a color from arbitrary integers, clamping each channel to 0-255
    pub fn clamped(r: i64, g: i64, b: i64) -> Self {
        Self {
            r: r.clamp(0, 255) as u8,
            g: g.clamp(0, 255) as u8,
            b: b.clamp(0, 255) as u8,
        }
    }

    /// Unpack a `0xRRGGBB` integer
    pub fn from_packed(packed: u32) -> Self {
        Self {
            r: ((packed >> 16) & 0xFF) as u8,
            g: ((packed >> 8) & 0xFF) as u8,
            b: (packed & 0xFF) as u8,
        }
    }
}

pub const MIN_BRIGHTNESS: u8 = 1;
pub const MAX_BRIGHTNESS: u8 = 100;
pub const MIN_COLOR_TEMPERATURE_K: u32 = 2000;
pub const MAX_COLOR_TEMPERATURE_K: u32 = 9000;

/// A command the device firmware understands
///
/// Values are already clamped to the ranges the firmware accepts; use the
/// constructors rather than building variants from raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanCommand {
    /// `turn` with value 1 (on) or 0 (off)
    Turn(bool),
    /// `brightness` percentage, 1-100
    Brightness(u8),
    /// `colorwc` with an RGB color and `colorTemInKelvin = 0`
    Color(Rgb),
    /// `colorwc` with a white color temperature in kelvin
    ColorTemperature(u32),
    /// `devStatus` query; the only command that gets a reply
    Status,
}

impl LanCommand {
    pub fn brightness(percent: i64) -> Self {
        LanCommand::Brightness(percent.clamp(MIN_BRIGHTNESS as i64, MAX_BRIGHTNESS as i64) as u8)
    }

    pub fn color(r: i64, g: i64, b: i64) -> Self {
        LanCommand::Color(Rgb::clamped(r, g, b))
    }

    pub fn color_temperature(kelvin: i64) -> Self {
        LanCommand::ColorTemperature(kelvin.clamp(
            MIN_COLOR_TEMPERATURE_K as i64,
            MAX_COLOR_TEMPERATURE_K as i64,
        ) as u32)
    }

    /// Wire name of the command
    pub fn cmd(&self) -> &'static str {
        match self {
            LanCommand::Turn(_) => "turn",
            LanCommand::Brightness(_) => "brightness",
            LanCommand::Color(_) | LanCommand::ColorTemperature(_) => "colorwc",
            LanCommand::Status => "devStatus",
        }
    }

    /// Whether the device answers this command with a datagram
    pub fn expects_reply(&self) -> bool {
        matches!(self, LanCommand::Status)
    }

    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        let cmd = self.cmd();
        match *self {
            LanCommand::Turn(on) => serde_json::to_vec(&Envelope::new(
                cmd,
                ValueData {
                    value: u32::from(on),
                },
            )),
            LanCommand::Brightness(percent) => serde_json::to_vec(&Envelope::new(
                cmd,
                ValueData {
                    value: u32::from(percent),
                },
            )),
            LanCommand::Color(color) => serde_json::to_vec(&Envelope::new(
                cmd,
                ColorData {
                    color,
                    // 0 tells the firmware to use the RGB values
                    color_tem_in_kelvin: 0,
                },
            )),
            LanCommand::ColorTemperature(kelvin) => serde_json::to_vec(&Envelope::new(
                cmd,
                ColorData {
                    color: Rgb::default(),
                    color_tem_in_kelvin: kelvin,
                },
            )),
            LanCommand::Status => serde_json::to_vec(&Envelope::new(cmd, EmptyData {})),
        }
    }
}

#[derive(Serialize)]
struct ValueData {
    value: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ColorData {
    color: Rgb,
    color_tem_in_kelvin: u32,
}

#[derive(Serialize)]
struct EmptyData {}

/// Reply to a `devStatus` query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_off: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_tem_in_kelvin: Option<u32>,
}

impl DeviceStatus {
    pub fn is_on(&self) -> Option<bool> {
        self.on_off.map(|v| v == 1)
    }
}

/// Decode a `devStatus` reply datagram
pub fn decode_status_response(datagram: &[u8]) -> serde_json::Result<DeviceStatus> {
    let envelope: Envelope<DeviceStatus> = serde_json::from_slice(datagram)?;
    Ok(envelope.msg.data)
}
