//! Notifications coming from the host editor.

use std::fmt;

/// An event emitted by the host editor.
///
/// Cursor moves go to the active mode's `update`; the other two are
/// forwarded to `on_host_event` for modes that care about them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The primary cursor moved. Both coordinates are zero-based.
    CursorMoved { line: usize, column: usize },
    /// Text was inserted and/or removed on `line`, which is now
    /// `line_length` characters long.
    DocumentChanged {
        line: usize,
        line_length: usize,
        inserted: usize,
        removed: usize,
    },
    /// A different editor became active (`None` when no editor is focused).
    EditorChanged { name: Option<String> },
}

impl HostEvent {
    /// Net number of characters added by a document change (negative when
    /// text was removed). Zero for every other event.
    pub fn char_delta(&self) -> i64 {
        match self {
            HostEvent::DocumentChanged {
                inserted, removed, ..
            } => *inserted as i64 - *removed as i64,
            _ => 0,
        }
    }
}

impl fmt::Display for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostEvent::CursorMoved { line, column } => write!(f, "cursor {} {}", line, column),
            HostEvent::DocumentChanged {
                line,
                line_length,
                inserted,
                removed,
            } => write!(f, "edit {} {} {} {}", line, line_length, inserted, removed),
            HostEvent::EditorChanged { name: Some(name) } => write!(f, "editor {}", name),
            HostEvent::EditorChanged { name: None } => write!(f, "editor"),
        }
    }
}
