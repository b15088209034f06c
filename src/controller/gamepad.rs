//! # evdev Gamepad Module
//!
//! This module handles gamepad detection, connection, and on-demand state reads
//! using the Linux evdev interface.
//!
//! ## Controller Detection
//!
//! Any event device that reports `BTN_SOUTH` (gamepads) or `BTN_TRIGGER`
//! (joysticks) is treated as a controller. The first match in sorted
//! `/dev/input/event*` order wins.
//!
//! ## Raw Indices
//!
//! - Buttons: every supported key with a code at or above `BTN_MISC` (0x100),
//!   numbered in ascending key-code order
//! - Axes: every supported absolute axis, numbered in ascending axis-code order
//!
//! State is queried with `EVIOCGKEY`/`EVIOCGABS` on every read, so nothing is
//! buffered between snapshots.

use evdev::{AbsoluteAxisType, Device, Key};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::snapshot::{ButtonReading, DeviceSnapshot, RawIndex, SnapshotSource};
use crate::error::{PadlinkError, Result};

/// Lowest key code that belongs to the button range (`BTN_MISC`).
const BTN_CODE_MIN: u16 = 0x100;

/// Directory scanned for event devices.
const INPUT_DIR: &str = "/dev/input";

/// An opened evdev gamepad.
///
/// The button and axis tables are fixed when the device is opened; they define
/// the raw ordinals for the rest of the session.
pub struct GamepadDevice {
    device: Device,
    device_path: String,
    buttons: Vec<Key>,
    axes: Vec<AbsoluteAxisType>,
}

impl std::fmt::Debug for GamepadDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GamepadDevice")
            .field("device_path", &self.device_path)
            .field("buttons", &self.buttons.len())
            .field("axes", &self.axes.len())
            .finish_non_exhaustive()
    }
}

impl GamepadDevice {
    /// Detect and open the first available gamepad
    ///
    /// Scans all `/dev/input/event*` devices in sorted order.
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: No gamepad found on the system
    /// - `Controller`: `/dev/input` missing or unreadable
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use padlink::controller::gamepad::GamepadDevice;
    ///
    /// let gamepad = GamepadDevice::open()?;
    /// println!("Connected to gamepad at: {}", gamepad.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open() -> Result<Self> {
        let input_dir = Path::new(INPUT_DIR);

        if !input_dir.exists() {
            return Err(PadlinkError::Controller(format!(
                "{} directory not found",
                INPUT_DIR
            )));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| PadlinkError::Controller(format!("Failed to read {}: {}", INPUT_DIR, e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| PadlinkError::Controller(format!("Failed to read directory entry: {}", e)))?;

        // Deterministic selection when several controllers are connected
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            match path.file_name() {
                Some(name) if name.to_string_lossy().starts_with("event") => {}
                _ => continue,
            }

            match Device::open(&path) {
                Ok(device) => {
                    debug!(
                        "Found input device: {} ({})",
                        path.display(),
                        device.name().unwrap_or("unnamed")
                    );

                    if is_gamepad(&device) {
                        return Ok(Self::from_device(device, path.to_string_lossy().to_string()));
                    }
                }
                Err(e) => {
                    // Permission denied or other errors - skip device
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(PadlinkError::ControllerNotFound)
    }

    /// Open a specific event device
    ///
    /// No capability check is made; the operator chose this device explicitly.
    ///
    /// # Errors
    ///
    /// Returns `Controller` if the device cannot be opened.
    pub fn open_path(path: &str) -> Result<Self> {
        let device = Device::open(path)
            .map_err(|e| PadlinkError::Controller(format!("Failed to open {}: {}", path, e)))?;
        Ok(Self::from_device(device, path.to_string()))
    }

    /// Wait until a gamepad is available, retrying every `retry_interval`
    ///
    /// An empty `device_path` means auto-detect. This is the connect
    /// notification: it resolves once a device has been opened.
    pub async fn wait_for(device_path: &str, retry_interval: Duration) -> Self {
        let mut attempts: u64 = 0;
        loop {
            let result = if device_path.is_empty() {
                Self::open()
            } else {
                Self::open_path(device_path)
            };

            match result {
                Ok(gamepad) => return gamepad,
                Err(e) => {
                    if attempts == 0 {
                        info!("Waiting for a gamepad ({})", e);
                    } else {
                        debug!("Gamepad not available yet: {}", e);
                    }
                    attempts += 1;
                    tokio::time::sleep(retry_interval).await;
                }
            }
        }
    }

    fn from_device(device: Device, device_path: String) -> Self {
        let mut buttons: Vec<Key> = device
            .supported_keys()
            .map(|keys| keys.iter().filter(|key| key.code() >= BTN_CODE_MIN).collect())
            .unwrap_or_default();
        buttons.sort_by_key(|key| key.code());

        let mut axes: Vec<AbsoluteAxisType> = device
            .supported_absolute_axes()
            .map(|axes| axes.iter().collect())
            .unwrap_or_default();
        axes.sort_by_key(|axis| axis.0);

        info!(
            "Opened gamepad at {}: {} ({} buttons, {} axes)",
            device_path,
            device.name().unwrap_or("unnamed"),
            buttons.len(),
            axes.len()
        );

        Self {
            device,
            device_path,
            buttons,
            axes,
        }
    }

    /// Get the device path of this gamepad
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Get the gamepad name reported by evdev
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }
}

impl SnapshotSource for GamepadDevice {
    fn read(&mut self) -> Option<DeviceSnapshot> {
        let keys = match self.device.get_key_state() {
            Ok(keys) => keys,
            Err(e) => {
                debug!("Key state read failed on {}: {}", self.device_path, e);
                return None;
            }
        };
        let abs = match self.device.get_abs_state() {
            Ok(abs) => abs,
            Err(e) => {
                debug!("Axis state read failed on {}: {}", self.device_path, e);
                return None;
            }
        };

        let buttons = self
            .buttons
            .iter()
            .map(|&key| ButtonReading::from(keys.contains(key)))
            .collect();

        let axes = self
            .axes
            .iter()
            .map(|axis| {
                let info = &abs[axis.0 as usize];
                normalize_axis(info.value, info.minimum, info.maximum)
            })
            .collect();

        Some(DeviceSnapshot::new(buttons, axes))
    }

    fn layout(&self) -> Vec<RawIndex> {
        (0..self.buttons.len())
            .map(RawIndex::button)
            .chain((0..self.axes.len()).map(RawIndex::axis))
            .collect()
    }

    fn describe(&self) -> String {
        format!(
            "{} ({})",
            self.name().unwrap_or("unnamed gamepad"),
            self.device_path
        )
    }
}

/// Whether an event device looks like a gamepad or joystick.
fn is_gamepad(device: &Device) -> bool {
    device
        .supported_keys()
        .map_or(false, |keys| keys.contains(Key::BTN_SOUTH) || keys.contains(Key::BTN_TRIGGER))
}

/// Scales a raw absolute value from `[minimum, maximum]` to `[-1, 1]`.
///
/// A degenerate range reads as centered.
fn normalize_axis(value: i32, minimum: i32, maximum: i32) -> f32 {
    if maximum <= minimum {
        return 0.0;
    }
    let span = (maximum as f64) - (minimum as f64);
    let offset = (value as f64) - (minimum as f64);
    ((offset / span) * 2.0 - 1.0).clamp(-1.0, 1.0) as f32
}
