//! Mock servers for integration testing
//!
//! These simulate the Govee cloud API and Govee LAN devices so the gateway can
//! be exercised end to end without an account or real lights.

#![allow(dead_code, unused_imports)]

pub mod govee_cloud;
pub mod lan_device;

pub use govee_cloud::{MockGoveeCloud, MOCK_API_KEY};
pub use lan_device::{free_udp_port, MockLanDevice};
