//! # Device Snapshots
//!
//! Raw input identifiers and the immutable per-tick view of a device.
//!
//! A [`RawIndex`] names one button or axis by the ordinal the hardware layer
//! assigned when the device connected. Ordinals are only stable for the lifetime
//! of one connection; a reconnect may renumber them.
//!
//! ## Usage
//!
//! ```
//! use padlink::controller::snapshot::{DeviceSnapshot, RawIndex};
//!
//! let snapshot = DeviceSnapshot::new(vec![true.into(), false.into()], vec![0.25]);
//! assert_eq!(snapshot.button_count(), 2);
//! assert_eq!(RawIndex::axis(0).to_string(), "axis_0");
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::PadlinkError;

/// Kind of a raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InputKind {
    /// Digital (or analog-capable) button.
    Button,
    /// Absolute axis in `[-1, 1]`.
    Axis,
}

impl InputKind {
    /// Key prefix used in field names and payload keys.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            InputKind::Button => "button",
            InputKind::Axis => "axis",
        }
    }
}

/// Hardware-assigned identifier of one button or axis.
///
/// Ordering is buttons before axes, then ascending ordinal, which is the
/// iteration order used when building frames.
///
/// The text form (`button_3`, `axis_0`) is the fallback semantic name and the
/// persistence payload key.
///
/// # Examples
///
/// ```
/// use padlink::controller::snapshot::{InputKind, RawIndex};
///
/// let index: RawIndex = "button_3".parse()?;
/// assert_eq!(index.kind, InputKind::Button);
/// assert_eq!(index.ordinal, 3);
/// assert_eq!(index.to_string(), "button_3");
/// # Ok::<(), padlink::error::PadlinkError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawIndex {
    pub kind: InputKind,
    pub ordinal: usize,
}

impl RawIndex {
    /// Button at `ordinal`.
    #[must_use]
    pub const fn button(ordinal: usize) -> Self {
        Self {
            kind: InputKind::Button,
            ordinal,
        }
    }

    /// Axis at `ordinal`.
    #[must_use]
    pub const fn axis(ordinal: usize) -> Self {
        Self {
            kind: InputKind::Axis,
            ordinal,
        }
    }
}

impl fmt::Display for RawIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind.prefix(), self.ordinal)
    }
}

impl FromStr for RawIndex {
    type Err = PadlinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PadlinkError::InvalidRawIndex(s.to_string());

        let (prefix, ordinal) = s.trim().rsplit_once('_').ok_or_else(invalid)?;
        let kind = match prefix {
            "button" => InputKind::Button,
            "axis" => InputKind::Axis,
            _ => return Err(invalid()),
        };
        // Reject signs and whitespace that usize parsing would otherwise accept
        if ordinal.is_empty() || !ordinal.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let ordinal = ordinal.parse().map_err(|_| invalid())?;

        Ok(Self { kind, ordinal })
    }
}

/// State of one button at snapshot time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ButtonReading {
    pub pressed: bool,
    /// Analog value in `[0, 1]`; digital buttons report 0.0 or 1.0.
    pub value: f32,
}

impl From<bool> for ButtonReading {
    fn from(pressed: bool) -> Self {
        Self {
            pressed,
            value: if pressed { 1.0 } else { 0.0 },
        }
    }
}

/// Immutable read of every button and axis of a device.
///
/// Produced once per tick and dropped after the frame is built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceSnapshot {
    buttons: Vec<ButtonReading>,
    axes: Vec<f32>,
}

impl DeviceSnapshot {
    /// Creates a snapshot. Axis values are clamped to `[-1, 1]`.
    #[must_use]
    pub fn new(buttons: Vec<ButtonReading>, axes: Vec<f32>) -> Self {
        let axes = axes.into_iter().map(|v| v.clamp(-1.0, 1.0)).collect();
        Self { buttons, axes }
    }

    /// Buttons in ordinal order.
    #[must_use]
    pub fn buttons(&self) -> &[ButtonReading] {
        &self.buttons
    }

    /// Axes in ordinal order.
    #[must_use]
    pub fn axes(&self) -> &[f32] {
        &self.axes
    }

    #[must_use]
    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }

    #[must_use]
    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    /// Every raw index present in this snapshot, buttons first.
    pub fn indices(&self) -> impl Iterator<Item = RawIndex> + '_ {
        (0..self.buttons.len())
            .map(RawIndex::button)
            .chain((0..self.axes.len()).map(RawIndex::axis))
    }
}

/// A live device that can be sampled on demand.
///
/// Implementations must not buffer between calls: each `read` reflects the
/// hardware state at call time. `None` means the device is gone and the caller
/// should skip this tick.
pub trait SnapshotSource: Send {
    /// Reads the current state, or `None` if the device no longer resolves.
    fn read(&mut self) -> Option<DeviceSnapshot>;

    /// Ordered list of raw indices this device exposes, buttons first.
    fn layout(&self) -> Vec<RawIndex>;

    /// Human-readable device name for logs.
    fn describe(&self) -> String {
        "gamepad".to_string()
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Snapshot source that replays a script of reads.
    ///
    /// Once the script is exhausted it keeps returning the last entry.
    #[derive(Clone)]
    pub struct ScriptedSource {
        pub script: Arc<Mutex<VecDeque<Option<DeviceSnapshot>>>>,
        pub last: Arc<Mutex<Option<DeviceSnapshot>>>,
        pub reads: Arc<Mutex<usize>>,
        pub buttons: usize,
        pub axes: usize,
    }

    impl ScriptedSource {
        pub fn new(buttons: usize, axes: usize) -> Self {
            Self {
                script: Arc::new(Mutex::new(VecDeque::new())),
                last: Arc::new(Mutex::new(None)),
                reads: Arc::new(Mutex::new(0)),
                buttons,
                axes,
            }
        }

        /// A source that always reports all buttons released and axes centered.
        pub fn idle(buttons: usize, axes: usize) -> Self {
            let source = Self::new(buttons, axes);
            *source.last.lock().unwrap() = Some(DeviceSnapshot::new(
                vec![ButtonReading::default(); buttons],
                vec![0.0; axes],
            ));
            source
        }

        pub fn push(&self, read: Option<DeviceSnapshot>) {
            self.script.lock().unwrap().push_back(read);
        }

        pub fn read_count(&self) -> usize {
            *self.reads.lock().unwrap()
        }
    }

    impl SnapshotSource for ScriptedSource {
        fn read(&mut self) -> Option<DeviceSnapshot> {
            *self.reads.lock().unwrap() += 1;
            match self.script.lock().unwrap().pop_front() {
                Some(read) => {
                    *self.last.lock().unwrap() = read.clone();
                    read
                }
                None => self.last.lock().unwrap().clone(),
            }
        }

        fn layout(&self) -> Vec<RawIndex> {
            (0..self.buttons)
                .map(RawIndex::button)
                .chain((0..self.axes).map(RawIndex::axis))
                .collect()
        }
    }
}
