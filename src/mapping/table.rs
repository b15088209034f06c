//! # Mapping Table
//!
//! Raw index to semantic name assignments.
//!
//! The table itself is an immutable value. Edits build a new table and swap it
//! into a [`MappingSlot`] in one step, so the sampler holding a [`MappingView`]
//! sees either the old table or the new one, never a mix.
//!
//! ## Usage
//!
//! ```
//! use padlink::controller::RawIndex;
//! use padlink::mapping::table::{MappingEntry, MappingSlot};
//!
//! let slot = MappingSlot::new();
//! let view = slot.view();
//!
//! slot.replace_all(vec![MappingEntry::new(RawIndex::button(0), "jump")]);
//! assert_eq!(view.current().resolve(RawIndex::button(0)), "jump");
//! assert_eq!(view.current().resolve(RawIndex::button(1)), "button_1");
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::controller::RawIndex;

/// One operator assignment of a name to a raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub index: RawIndex,
    pub name: String,
}

impl MappingEntry {
    pub fn new(index: RawIndex, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

/// Immutable raw index to semantic name table.
///
/// Unmapped indices resolve to their own text form, so every input always has
/// a name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    names: BTreeMap<RawIndex, String>,
}

impl MappingTable {
    /// Identity table: every index resolves to its fallback name.
    #[must_use]
    pub fn identity() -> Self {
        Self::default()
    }

    /// Builds a table from entries.
    ///
    /// Names are trimmed and blank names are dropped. If an index appears more
    /// than once, the last entry wins.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = MappingEntry>,
    {
        let mut names = BTreeMap::new();
        for entry in entries {
            let name = entry.name.trim();
            if name.is_empty() {
                continue;
            }
            names.insert(entry.index, name.to_string());
        }
        Self { names }
    }

    /// Semantic name for `index`, or its fallback text form.
    #[must_use]
    pub fn resolve(&self, index: RawIndex) -> Cow<'_, str> {
        match self.names.get(&index) {
            Some(name) => Cow::Borrowed(name.as_str()),
            None => Cow::Owned(index.to_string()),
        }
    }

    /// Explicitly mapped name for `index`, if any.
    #[must_use]
    pub fn get(&self, index: RawIndex) -> Option<&str> {
        self.names.get(&index).map(String::as_str)
    }

    /// Number of explicit entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Single-writer slot holding the table in effect.
///
/// Replacement swaps the whole `Arc<MappingTable>`; there is no field-level
/// mutation.
#[derive(Debug)]
pub struct MappingSlot {
    tx: watch::Sender<Arc<MappingTable>>,
}

impl Default for MappingSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingSlot {
    /// Creates a slot holding the identity table.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(MappingTable::identity()));
        Self { tx }
    }

    /// Read handle for the sampler (or anyone else).
    #[must_use]
    pub fn view(&self) -> MappingView {
        MappingView {
            rx: self.tx.subscribe(),
        }
    }

    /// Atomically replaces the whole table.
    ///
    /// Blank names are dropped silently. Returns the table now in effect.
    pub fn replace_all<I>(&self, entries: I) -> Arc<MappingTable>
    where
        I: IntoIterator<Item = MappingEntry>,
    {
        let table = Arc::new(MappingTable::from_entries(entries));
        debug!("Mapping table replaced ({} entries)", table.len());
        self.tx.send_replace(Arc::clone(&table));
        table
    }

    /// Table currently in effect.
    #[must_use]
    pub fn current(&self) -> Arc<MappingTable> {
        Arc::clone(&self.tx.borrow())
    }
}

/// Read-only handle to a [`MappingSlot`].
#[derive(Debug, Clone)]
pub struct MappingView {
    rx: watch::Receiver<Arc<MappingTable>>,
}

impl MappingView {
    /// Table currently in effect.
    ///
    /// Take this once per tick and resolve every input against it.
    #[must_use]
    pub fn current(&self) -> Arc<MappingTable> {
        Arc::clone(&self.rx.borrow())
    }
}
