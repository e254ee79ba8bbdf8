//! PulseMeter firmware library.
//!
//! Pulse-counting measurement instrument: four interrupt-fed BNC counters
//! and a UART measurement input feed a coordinator that fans every
//! measurement out to the SD card log and the WiFi companion link.
//!
//! Exposes the pure-logic modules for integration testing and the host
//! simulator. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod device;
pub mod error;
pub mod lifecycle;
pub mod link;
pub mod measurement;
pub mod pins;

pub mod adapters;
pub mod drivers;
