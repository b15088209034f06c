//! # Mapping Module
//!
//! Operator-assigned semantic names for raw inputs.
//!
//! This module handles:
//! - The raw index to semantic name table and its atomic replacement
//! - Building per-tick semantic frames from device snapshots
//! - Applying and persisting operator edits

pub mod editor;
pub mod frame;
pub mod table;

pub use editor::{FormValues, MappingEditor, MappingPayload, MappingStore, SaveOutcome};
pub use frame::SemanticFrame;
pub use table::{MappingEntry, MappingSlot, MappingTable, MappingView};
