//! # Console Form
//!
//! Line-oriented mapping form on stdin.
//!
//! One text field per input of the connected device, keyed `button_<n>` /
//! `axis_<n>`. Edits stay local to the form until `save` hands the whole form
//! to the [`MappingEditor`].
//!
//! ## Commands
//!
//! | Command | Effect |
//! |---------|--------|
//! | `<field> = <name>` | Set a field |
//! | `<field> =` | Clear a field |
//! | `list` | Show every field with its value and the name now in effect |
//! | `save` | Apply and persist the form |
//! | `help` | Show this table |
//! | `quit` | Stop the bridge |

use std::fmt::Write as _;

use crate::controller::RawIndex;
use crate::error::{PadlinkError, Result};
use crate::mapping::{FormValues, MappingEditor, MappingStore, SaveOutcome};

const HELP: &str = "\
Commands:
  <field> = <name>   set a field (e.g. button_0 = jump)
  <field> =          clear a field
  list               show fields and names in effect
  save               apply and save the mapping
  help               show this help
  quit               stop the bridge";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Blank line
    Empty,
    /// Set `field` to `value`; an empty value clears it.
    Set { field: RawIndex, value: String },
    List,
    Save,
    Help,
    Quit,
}

impl Command {
    /// Parses one console line.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRawIndex` for a malformed field name and
    /// `InvalidCommand` for anything else that is not a known command.
    ///
    /// # Examples
    ///
    /// ```
    /// use padlink::controller::RawIndex;
    /// use padlink::ui::Command;
    ///
    /// let cmd = Command::parse("button_0 = jump")?;
    /// assert_eq!(cmd, Command::Set { field: RawIndex::button(0), value: "jump".to_string() });
    /// # Ok::<(), padlink::error::PadlinkError>(())
    /// ```
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();

        if let Some((field, value)) = line.split_once('=') {
            let field: RawIndex = field.trim().parse()?;
            return Ok(Command::Set {
                field,
                value: value.trim().to_string(),
            });
        }

        match line.to_ascii_lowercase().as_str() {
            "" => Ok(Command::Empty),
            "list" | "ls" => Ok(Command::List),
            "save" => Ok(Command::Save),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            _ => Err(PadlinkError::InvalidCommand(line.to_string())),
        }
    }
}

/// What the caller should do after a line was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Nothing to print.
    Silent,
    /// Print this text to the operator.
    Text(String),
    /// The operator asked to stop.
    Quit,
}

/// Form state for the connected device.
#[derive(Debug, Default)]
pub struct ConsoleForm {
    layout: Vec<RawIndex>,
    values: FormValues,
}

impl ConsoleForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the fields with those of a newly connected device.
    ///
    /// Values typed for the previous device are discarded.
    pub fn reset(&mut self, layout: &[RawIndex]) {
        self.layout = layout.to_vec();
        self.values.clear();
    }

    #[must_use]
    pub fn values(&self) -> &FormValues {
        &self.values
    }

    /// Field listing printed when a device connects.
    #[must_use]
    pub fn banner(&self) -> String {
        if self.layout.is_empty() {
            return "Connected device has no inputs".to_string();
        }

        let fields: Vec<String> = self.layout.iter().map(ToString::to_string).collect();
        format!(
            "Mapping fields: {}\nType 'help' for commands.",
            fields.join(", ")
        )
    }

    /// Applies one command that does not need the editor.
    ///
    /// `Save` is left to [`ConsoleForm::handle`].
    pub fn apply<S: MappingStore>(&mut self, command: Command, editor: &MappingEditor<S>) -> Reply {
        match command {
            Command::Empty | Command::Save => Reply::Silent,
            Command::Help => Reply::Text(HELP.to_string()),
            Command::Quit => Reply::Quit,
            Command::Set { field, value } => {
                if !self.layout.contains(&field) {
                    return Reply::Text(format!("Unknown field {} on this device", field));
                }
                if value.is_empty() {
                    self.values.remove(&field);
                    Reply::Text(format!("{} cleared", field))
                } else {
                    let reply = format!("{} = {}", field, value);
                    self.values.insert(field, value);
                    Reply::Text(reply)
                }
            }
            Command::List => Reply::Text(self.render(editor)),
        }
    }

    /// Handles one raw console line.
    pub async fn handle<S: MappingStore>(&mut self, line: &str, editor: &MappingEditor<S>) -> Reply {
        match Command::parse(line) {
            Ok(Command::Save) => Reply::Text(describe_outcome(&editor.save(&self.values).await)),
            Ok(command) => self.apply(command, editor),
            Err(e) => Reply::Text(format!("{} (type 'help' for commands)", e)),
        }
    }

    fn render<S: MappingStore>(&self, editor: &MappingEditor<S>) -> String {
        let table = editor.current();
        let mut out = String::new();

        for &index in &self.layout {
            let value = self.values.get(&index).map(String::as_str).unwrap_or("");
            let name = match table.get(index) {
                Some(name) => name.to_string(),
                None => format!("{} (default)", index),
            };
            let _ = writeln!(out, "  {:<10} = {:<16} -> {}", index.to_string(), value, name);
        }
        if out.is_empty() {
            out.push_str("  (no fields)");
        }
        out.trim_end().to_string()
    }
}

fn describe_outcome(outcome: &SaveOutcome) -> String {
    match outcome {
        SaveOutcome::Saved { entries } => format!("Mapping saved ({} entries)", entries),
        SaveOutcome::PersistFailed { entries, error } => format!(
            "Mapping applied ({} entries) but not saved: {}",
            entries, error
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::editor::MockMappingStore;
    use crate::mapping::MappingSlot;

    fn layout() -> Vec<RawIndex> {
        vec![RawIndex::button(0), RawIndex::button(1), RawIndex::axis(0)]
    }

    fn editor(store: MockMappingStore) -> MappingEditor<MockMappingStore> {
        let mut editor = MappingEditor::new(MappingSlot::new(), store);
        editor.seed(layout());
        editor
    }

    fn form() -> ConsoleForm {
        let mut form = ConsoleForm::new();
        form.reset(&layout());
        form
    }

    #[test]
    fn test_parse_set_and_clear() {
        assert_eq!(
            Command::parse("  axis_0 =  steer left ").unwrap(),
            Command::Set {
                field: RawIndex::axis(0),
                value: "steer left".to_string()
            }
        );
        assert_eq!(
            Command::parse("button_1 =").unwrap(),
            Command::Set {
                field: RawIndex::button(1),
                value: String::new()
            }
        );
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(Command::parse("").unwrap(), Command::Empty);
        assert_eq!(Command::parse("LIST").unwrap(), Command::List);
        assert_eq!(Command::parse("save").unwrap(), Command::Save);
        assert_eq!(Command::parse("?").unwrap(), Command::Help);
        assert_eq!(Command::parse("quit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Command::parse("trigger_0 = fire"),
            Err(PadlinkError::InvalidRawIndex(_))
        ));
        assert!(matches!(Command::parse("jump"), Err(PadlinkError::InvalidCommand(_))));
    }

    #[test]
    fn test_set_unknown_field_is_rejected() {
        let editor = editor(MockMappingStore::new());
        let mut form = form();

        let reply = form.apply(
            Command::Set {
                field: RawIndex::button(9),
                value: "ghost".to_string(),
            },
            &editor,
        );

        assert!(matches!(reply, Reply::Text(text) if text.contains("Unknown field")));
        assert!(form.values().is_empty());
    }

    #[test]
    fn test_set_then_clear() {
        let editor = editor(MockMappingStore::new());
        let mut form = form();

        form.apply(
            Command::Set {
                field: RawIndex::button(0),
                value: "jump".to_string(),
            },
            &editor,
        );
        assert_eq!(form.values().get(&RawIndex::button(0)).unwrap(), "jump");

        form.apply(
            Command::Set {
                field: RawIndex::button(0),
                value: String::new(),
            },
            &editor,
        );
        assert!(form.values().is_empty());
    }

    #[test]
    fn test_edits_do_not_touch_table_until_save() {
        let editor = editor(MockMappingStore::new());
        let mut form = form();

        form.apply(
            Command::Set {
                field: RawIndex::button(0),
                value: "jump".to_string(),
            },
            &editor,
        );

        assert!(editor.current().is_empty());
    }

    #[test]
    fn test_list_shows_resolved_names() {
        let editor = editor(MockMappingStore::new());
        let mut form = form();

        let Reply::Text(text) = form.apply(Command::List, &editor) else {
            panic!("list should print");
        };
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("-> button_0 (default)"));
        assert!(text.contains("-> axis_0 (default)"));
    }

    #[test]
    fn test_reset_discards_values() {
        let editor = editor(MockMappingStore::new());
        let mut form = form();
        form.apply(
            Command::Set {
                field: RawIndex::axis(0),
                value: "steer".to_string(),
            },
            &editor,
        );

        form.reset(&[RawIndex::button(0)]);
        assert!(form.values().is_empty());
        assert!(form.banner().contains("button_0"));
        assert!(!form.banner().contains("axis_0"));
    }

    #[tokio::test]
    async fn test_save_applies_and_reports() {
        let mut store = MockMappingStore::new();
        store
            .expect_save()
            .withf(|payload| payload.get("axis_0").map(String::as_str) == Some("steer"))
            .times(1)
            .returning(|_| Ok(()));

        let editor = editor(store);
        let mut form = form();

        form.handle("axis_0 = steer", &editor).await;
        let reply = form.handle("save", &editor).await;

        assert_eq!(reply, Reply::Text("Mapping saved (1 entries)".to_string()));
        assert_eq!(editor.current().resolve(RawIndex::axis(0)), "steer");

        let Reply::Text(listing) = form.handle("list", &editor).await else {
            panic!("list should print");
        };
        assert!(listing.contains("-> steer"));
        assert!(!listing.contains("axis_0 (default)"));
    }

    #[tokio::test]
    async fn test_save_failure_is_reported() {
        let mut store = MockMappingStore::new();
        store
            .expect_save()
            .times(1)
            .returning(|_| Err(PadlinkError::Persistence("Server returned 500".to_string())));

        let editor = editor(store);
        let mut form = form();

        form.handle("button_0 = jump", &editor).await;
        let Reply::Text(text) = form.handle("save", &editor).await else {
            panic!("save should print");
        };

        assert!(text.contains("not saved"));
        assert!(text.contains("500"));
        assert_eq!(editor.current().resolve(RawIndex::button(0)), "jump");
    }

    #[tokio::test]
    async fn test_quit_and_bad_input() {
        let editor = editor(MockMappingStore::new());
        let mut form = form();

        assert_eq!(form.handle("quit", &editor).await, Reply::Quit);
        assert!(matches!(
            form.handle("frobnicate", &editor).await,
            Reply::Text(text) if text.contains("help")
        ));
    }
}
