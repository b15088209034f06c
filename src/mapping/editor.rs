//! # Mapping Editor
//!
//! Turns operator form input into a new [`MappingTable`] and persists it.
//!
//! A save applies the new table to the slot first, then hands the payload to
//! the [`MappingStore`]. A failed save is reported to the caller but the table
//! stays applied; the sampler picks up the new names on its next tick whatever
//! the store says.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::table::{MappingEntry, MappingSlot, MappingTable, MappingView};
use crate::controller::RawIndex;
use crate::error::{PadlinkError, Result};

/// Operator-entered strings keyed by raw index.
pub type FormValues = BTreeMap<RawIndex, String>;

/// Flat persistence payload: `"button_<n>"`/`"axis_<n>"` to trimmed name.
pub type MappingPayload = BTreeMap<String, String>;

/// Remote persistence of a complete mapping.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Stores the full mapping. Any error means the save was not acknowledged.
    async fn save(&self, payload: &MappingPayload) -> Result<()>;
}

/// Result of a save, for the operator.
#[derive(Debug)]
pub enum SaveOutcome {
    /// Applied locally and acknowledged by the store.
    Saved { entries: usize },
    /// Applied locally, but the store reported an error.
    PersistFailed { entries: usize, error: PadlinkError },
}

impl SaveOutcome {
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }

    /// Number of non-blank entries now in the table.
    #[must_use]
    pub fn entries(&self) -> usize {
        match self {
            SaveOutcome::Saved { entries } | SaveOutcome::PersistFailed { entries, .. } => *entries,
        }
    }
}

/// Owns the write side of the mapping slot.
pub struct MappingEditor<S> {
    slot: MappingSlot,
    store: S,
    layout: Vec<RawIndex>,
}

impl<S: MappingStore> MappingEditor<S> {
    pub fn new(slot: MappingSlot, store: S) -> Self {
        Self {
            slot,
            store,
            layout: Vec::new(),
        }
    }

    /// Binds the editor to a newly connected device and resets to identity.
    pub fn seed(&mut self, layout: Vec<RawIndex>) {
        info!("Mapping editor seeded with {} inputs", layout.len());
        self.layout = layout;
        self.slot.replace_all(Vec::new());
    }

    /// Raw indices of the connected device, buttons first.
    #[must_use]
    pub fn layout(&self) -> &[RawIndex] {
        &self.layout
    }

    /// Read handle for the sampler.
    #[must_use]
    pub fn view(&self) -> MappingView {
        self.slot.view()
    }

    /// Table currently in effect.
    #[must_use]
    pub fn current(&self) -> Arc<MappingTable> {
        self.slot.current()
    }

    /// Builds entries and payload for every layout index with a non-blank value.
    ///
    /// Values for indices outside the layout are ignored.
    #[must_use]
    pub fn build(&self, form: &FormValues) -> (Vec<MappingEntry>, MappingPayload) {
        let mut entries = Vec::new();
        let mut payload = MappingPayload::new();

        for &index in &self.layout {
            let Some(value) = form.get(&index) else {
                continue;
            };
            let name = value.trim();
            if name.is_empty() {
                continue;
            }
            entries.push(MappingEntry::new(index, name));
            payload.insert(index.to_string(), name.to_string());
        }

        (entries, payload)
    }

    /// Applies the form to the table, then persists it.
    ///
    /// Resolves once the store answers. The table is never rolled back.
    pub async fn save(&self, form: &FormValues) -> SaveOutcome {
        let (entries, payload) = self.build(form);
        let table = self.slot.replace_all(entries);
        let entries = table.len();

        match self.store.save(&payload).await {
            Ok(()) => {
                info!("Input mapping saved ({} entries)", entries);
                SaveOutcome::Saved { entries }
            }
            Err(error) => {
                warn!("Input mapping applied locally but not saved: {}", error);
                SaveOutcome::PersistFailed { entries, error }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Vec<RawIndex> {
        vec![RawIndex::button(0), RawIndex::button(1), RawIndex::axis(0)]
    }

    fn form(values: &[(RawIndex, &str)]) -> FormValues {
        values.iter().map(|(i, v)| (*i, v.to_string())).collect()
    }

    fn editor(store: MockMappingStore) -> MappingEditor<MockMappingStore> {
        let mut editor = MappingEditor::new(MappingSlot::new(), store);
        editor.seed(layout());
        editor
    }

    #[test]
    fn test_seed_resets_to_identity() {
        let slot = MappingSlot::new();
        slot.replace_all(vec![MappingEntry::new(RawIndex::button(0), "jump")]);

        let mut editor = MappingEditor::new(slot, MockMappingStore::new());
        editor.seed(layout());

        assert!(editor.current().is_empty());
        assert_eq!(editor.layout(), layout().as_slice());
    }

    #[test]
    fn test_build_drops_blanks_and_trims() {
        let editor = editor(MockMappingStore::new());
        let (entries, payload) = editor.build(&form(&[
            (RawIndex::button(0), " jump "),
            (RawIndex::button(1), "   "),
            (RawIndex::axis(0), "steer"),
        ]));

        assert_eq!(
            entries,
            vec![
                MappingEntry::new(RawIndex::button(0), "jump"),
                MappingEntry::new(RawIndex::axis(0), "steer"),
            ]
        );
        assert_eq!(
            payload,
            MappingPayload::from([
                ("button_0".to_string(), "jump".to_string()),
                ("axis_0".to_string(), "steer".to_string()),
            ])
        );
    }

    #[test]
    fn test_build_ignores_indices_outside_layout() {
        let editor = editor(MockMappingStore::new());
        let (entries, payload) = editor.build(&form(&[(RawIndex::button(5), "ghost")]));
        assert!(entries.is_empty());
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn test_save_success() {
        let mut store = MockMappingStore::new();
        store
            .expect_save()
            .withf(|payload| payload.get("button_0").map(String::as_str) == Some("jump"))
            .times(1)
            .returning(|_| Ok(()));

        let editor = editor(store);
        let outcome = editor.save(&form(&[(RawIndex::button(0), "jump")])).await;

        assert!(outcome.is_saved());
        assert_eq!(outcome.entries(), 1);
        assert_eq!(editor.current().resolve(RawIndex::button(0)), "jump");
    }

    #[tokio::test]
    async fn test_save_failure_keeps_new_table() {
        let mut store = MockMappingStore::new();
        store
            .expect_save()
            .times(1)
            .returning(|_| Err(PadlinkError::Persistence("network unreachable".to_string())));

        let editor = editor(store);
        let view = editor.view();
        let outcome = editor
            .save(&form(&[
                (RawIndex::button(0), "jump"),
                (RawIndex::button(1), ""),
                (RawIndex::axis(0), "steer"),
            ]))
            .await;

        match outcome {
            SaveOutcome::PersistFailed { entries, error } => {
                assert_eq!(entries, 2);
                assert!(matches!(error, PadlinkError::Persistence(_)));
            }
            other => panic!("Expected PersistFailed, got: {:?}", other),
        }

        let table = view.current();
        assert_eq!(table.resolve(RawIndex::button(0)), "jump");
        assert_eq!(table.resolve(RawIndex::button(1)), "button_1");
        assert_eq!(table.resolve(RawIndex::axis(0)), "steer");
    }

    #[tokio::test]
    async fn test_save_blank_form_sends_empty_payload() {
        let mut store = MockMappingStore::new();
        store
            .expect_save()
            .withf(|payload| payload.is_empty())
            .times(1)
            .returning(|_| Ok(()));

        let editor = editor(store);
        let outcome = editor
            .save(&form(&[(RawIndex::button(0), " "), (RawIndex::axis(0), "")]))
            .await;

        assert!(outcome.is_saved());
        assert!(editor.current().is_empty());
    }

    #[tokio::test]
    async fn test_save_twice_is_idempotent() {
        let mut store = MockMappingStore::new();
        store.expect_save().times(2).returning(|_| Ok(()));

        let editor = editor(store);
        let values = form(&[(RawIndex::button(1), "fire")]);

        editor.save(&values).await;
        let first = editor.current();
        editor.save(&values).await;

        assert_eq!(*first, *editor.current());
    }
}
