//! Routes host events to the registry.

use crate::host::HostEvent;
use crate::registry::ModeRegistry;
use std::rc::Rc;

/// Forwards host events to whichever mode is active.
///
/// Holds no state of its own: every event is forwarded as it arrives, with
/// no batching. Modes that need debouncing do it themselves.
#[derive(Clone)]
pub struct PositionDispatcher {
    registry: Rc<ModeRegistry>,
}

impl PositionDispatcher {
    pub fn new(registry: Rc<ModeRegistry>) -> Self {
        Self { registry }
    }

    pub fn cursor_moved(&self, line: usize, column: usize) {
        self.registry.dispatch(line, column);
    }

    pub fn handle(&self, event: &HostEvent) {
        match event {
            HostEvent::CursorMoved { line, column } => self.cursor_moved(*line, *column),
            other => self.registry.notify(other),
        }
    }
}
