//! Device and capability model shared by the cloud client, the gateway and the API
//!
//! Shapes follow the Govee OpenAPI device listing:
//! <https://developer.govee.com/reference/get-you-devices>

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Capability type tags used by the LAN translator
pub mod capability_types {
    pub const ON_OFF: &str = "devices.capabilities.on_off";
    pub const TOGGLE: &str = "devices.capabilities.toggle";
    pub const RANGE: &str = "devices.capabilities.range";
    pub const MODE: &str = "devices.capabilities.mode";
    pub const COLOR_SETTING: &str = "devices.capabilities.color_setting";
    pub const SEGMENT_COLOR_SETTING: &str = "devices.capabilities.segment_color_setting";
}

/// Device type tags reported by the cloud listing
pub mod device_types {
    pub const LIGHT: &str = "devices.types.light";
    pub const AIR_PURIFIER: &str = "devices.types.air_purifier";
    pub const THERMOMETER: &str = "devices.types.thermometer";
    pub const SOCKET: &str = "devices.types.socket";
    pub const SENSOR: &str = "devices.types.sensor";
    pub const HEATER: &str = "devices.types.heater";
    pub const HUMIDIFIER: &str = "devices.types.humidifier";
    pub const DEHUMIDIFIER: &str = "devices.types.dehumidifier";
    pub const ICE_MAKER: &str = "devices.types.ice_maker";
    pub const AROMA_DIFFUSER: &str = "devices.types.aroma_diffuser";
    pub const BOX: &str = "devices.types.box";
}

/// A device as reported by the cloud API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub sku: String,
    pub device: String,
    #[serde(default)]
    pub device_name: String,
    #[serde(rename = "type", default)]
    pub device_type: String,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

impl Device {
    pub fn capability(&self, kind: &str, instance: &str) -> Option<&Capability> {
        self.capabilities
            .iter()
            .find(|c| c.kind == kind && c.instance == instance)
    }
}

/// A control point on a device, with its descriptive parameter schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    #[serde(rename = "type")]
    pub kind: String,
    pub instance: String,
    #[serde(default)]
    pub parameters: CapabilityParameters,
}

/// Parameter schema for a capability
///
/// Passed back to callers as-is; the gateway never validates values against it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<EnumOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<IntegerRange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<StructField>,
}

/// One field of a STRUCT capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructField {
    pub field_name: String,
    #[serde(default)]
    pub data_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Bounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_range: Option<Bounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<EnumOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<IntegerRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumOption {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegerRange {
    pub min: i64,
    pub max: i64,
    #[serde(default = "default_precision")]
    pub precision: i64,
}

fn default_precision() -> i64 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: i64,
    pub max: i64,
}

/// The capability part of a control command
///
/// `value` keeps whatever JSON the caller sent so unknown capabilities can be
/// forwarded to the cloud untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlCapability {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub instance: String,
    #[serde(default)]
    pub value: Value,
}

impl ControlCapability {
    pub fn new(kind: impl Into<String>, instance: impl Into<String>, value: Value) -> Self {
        Self {
            kind: kind.into(),
            instance: instance.into(),
            value,
        }
    }
}
