//! Translate cloud-style capabilities into LAN commands
//!
//! | type            | instance            | value              | command            |
//! |-----------------|---------------------|--------------------|--------------------|
//! | `on_off`        | any                 | number             | `turn` (1 = on)    |
//! | `range`         | `brightness`        | number             | `brightness`       |
//! | `color_setting` | `colorTemperatureK` | number             | `colorwc` (kelvin) |
//! | `color_setting` | any other           | packed `0xRRGGBB`  | `colorwc` (rgb)    |
//! | `color_setting` | any other           | `{"r","g","b"}`    | `colorwc` (rgb)    |
//!
//! Anything else has no LAN equivalent. A value of the wrong JSON type is also
//! treated as "no LAN equivalent" rather than an error, so the request can
//! still go to the cloud.

use serde_json::Value;

use super::protocol::{LanCommand, Rgb};
use crate::device::{capability_types, ControlCapability};

pub const BRIGHTNESS_INSTANCE: &str = "brightness";
pub const COLOR_TEMPERATURE_INSTANCE: &str = "colorTemperatureK";

/// Map a capability to a LAN command, or `None` when there is no LAN equivalent
pub fn translate(capability: &ControlCapability) -> Option<LanCommand> {
    match capability.kind.as_str() {
        capability_types::ON_OFF => {
            let value = capability.value.as_f64()?;
            Some(LanCommand::Turn(value == 1.0))
        }
        capability_types::RANGE if capability.instance == BRIGHTNESS_INSTANCE => {
            let value = capability.value.as_f64()?;
            Some(LanCommand::brightness(value as i64))
        }
        capability_types::COLOR_SETTING if capability.instance == COLOR_TEMPERATURE_INSTANCE => {
            let kelvin = capability.value.as_f64()?;
            Some(LanCommand::color_temperature(kelvin as i64))
        }
        capability_types::COLOR_SETTING => color_from_value(&capability.value).map(LanCommand::Color),
        _ => None,
    }
}

fn color_from_value(value: &Value) -> Option<Rgb> {
    match value {
        Value::Number(n) => n.as_f64().map(|packed| Rgb::from_packed(packed as u32)),
        Value::Object(fields) => {
            let channel = |name: &str| fields.get(name).and_then(Value::as_f64).map(|v| v as i64);
            Some(Rgb::clamped(channel("r")?, channel("g")?, channel("b")?))
        }
        _ => None,
    }
}
