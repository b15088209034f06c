//! # Controller Module
//!
//! Gamepad input handling.
//!
//! This module handles:
//! - Gamepad detection and connection via evdev
//! - Raw input identifiers (`button_<n>`, `axis_<n>`)
//! - On-demand, unbuffered device snapshots

pub mod gamepad;
pub mod snapshot;

pub use gamepad::GamepadDevice;
pub use snapshot::{ButtonReading, DeviceSnapshot, InputKind, RawIndex, SnapshotSource};
