//! # Semantic Frames
//!
//! Applies a [`MappingTable`] to a [`DeviceSnapshot`].
//!
//! Inputs are visited in a fixed order: buttons before axes, ascending ordinal.
//! When two inputs of the same kind resolve to the same name, the later one
//! overwrites the earlier one in the frame.
//!
//! ## Usage
//!
//! ```
//! use padlink::controller::DeviceSnapshot;
//! use padlink::mapping::{MappingTable, SemanticFrame};
//!
//! let snapshot = DeviceSnapshot::new(vec![false.into(), false.into()], vec![0.0]);
//! let frame = SemanticFrame::build(&MappingTable::identity(), &snapshot);
//!
//! assert_eq!(frame.buttons["button_0"], false);
//! assert_eq!(frame.axes["axis_0"], 0.0);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::table::MappingTable;
use crate::controller::{DeviceSnapshot, RawIndex};

/// One resolved input value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputValue {
    Button(bool),
    Axis(f32),
}

/// Per-tick payload keyed by semantic name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticFrame {
    pub buttons: BTreeMap<String, bool>,
    pub axes: BTreeMap<String, f32>,
}

impl SemanticFrame {
    /// Resolves every input of `snapshot` through `table`.
    #[must_use]
    pub fn build(table: &MappingTable, snapshot: &DeviceSnapshot) -> Self {
        let mut frame = Self::default();
        for (_, name, value) in resolve_inputs(table, snapshot) {
            match value {
                InputValue::Button(pressed) => {
                    frame.buttons.insert(name, pressed);
                }
                InputValue::Axis(value) => {
                    frame.axes.insert(name, value);
                }
            }
        }
        frame
    }

    /// Number of distinct keys across buttons and axes.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.buttons.len() + self.axes.len()
    }
}

/// Resolved `(index, name, value)` for every input, in frame iteration order.
///
/// Always yields exactly `buttons + axes` items; collisions are merged only
/// when the items are folded into a [`SemanticFrame`].
pub fn resolve_inputs(
    table: &MappingTable,
    snapshot: &DeviceSnapshot,
) -> Vec<(RawIndex, String, InputValue)> {
    let values = snapshot
        .buttons()
        .iter()
        .map(|button| InputValue::Button(button.pressed))
        .chain(snapshot.axes().iter().map(|&value| InputValue::Axis(value)));

    snapshot
        .indices()
        .zip(values)
        .map(|(index, value)| (index, table.resolve(index).into_owned(), value))
        .collect()
}
