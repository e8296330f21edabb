//! Govee Gateway
//!
//! A small REST gateway for Govee smart lights.
//!
//! This library provides:
//! - LAN discovery and direct UDP control of devices
//! - Translation of cloud capabilities into LAN commands
//! - A Govee cloud API client
//! - A device gateway that tries LAN first and falls back to the cloud
//! - The HTTP API exposing all of the above

pub mod api;
pub mod cloud;
pub mod config;
pub mod device;
pub mod gateway;
pub mod lan;
