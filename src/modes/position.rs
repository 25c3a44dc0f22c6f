//! Position HUD: cursor line/column plus characters typed.

use crate::host::{HostEvent, StatusBar, StatusItem};
use crate::mode::{Mode, ModeEnv};
use crate::registry::ModeCommand;
use crate::session::SELECT_MODE_COMMAND;
use std::cell::Cell;
use std::rc::Rc;

pub struct PositionMode {
    item: StatusItem,
    typed: Rc<Cell<i64>>,
    position: Option<(usize, usize)>,
}

impl PositionMode {
    pub const ID: &'static str = "position";
    pub const RESET_COMMAND: &'static str = "position.resetCounter";

    pub fn new(status_bar: &StatusBar) -> Self {
        let item = status_bar.create_item(100);
        item.set_tooltip("Position HUD - click to change mode");
        item.set_command(SELECT_MODE_COMMAND);
        Self {
            item,
            typed: Rc::new(Cell::new(0)),
            position: None,
        }
    }

    fn render(&self) {
        let text = match self.position {
            Some((line, column)) => format!(
                "Ln {}, Col {} | {:+} chars",
                line + 1,
                column + 1,
                self.typed.get()
            ),
            None => format!("Ln -, Col - | {:+} chars", self.typed.get()),
        };
        self.item.set_text(text);
    }
}

impl Mode for PositionMode {
    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        "Position HUD"
    }

    fn description(&self) -> Option<&str> {
        Some("Cursor position and characters typed since activation")
    }

    fn commands(&self) -> Vec<ModeCommand> {
        let typed = self.typed.clone();
        // The new count shows up on the next cursor move.
        vec![ModeCommand::new(Self::RESET_COMMAND, move |_| {
            typed.set(0);
            Ok(())
        })]
    }

    fn activate(&mut self, _env: &mut ModeEnv<'_>) -> anyhow::Result<()> {
        self.typed.set(0);
        self.render();
        self.item.show();
        Ok(())
    }

    fn deactivate(&mut self) {
        self.item.hide();
        self.position = None;
    }

    fn update(&mut self, line: usize, column: usize) {
        self.position = Some((line, column));
        self.render();
    }

    fn on_host_event(&mut self, event: &HostEvent) {
        match event {
            HostEvent::DocumentChanged { .. } => {
                self.typed.set(self.typed.get() + event.char_delta());
                self.render();
            }
            // No editor, nothing to point at.
            HostEvent::EditorChanged { name: None } => self.item.hide(),
            HostEvent::EditorChanged { name: Some(_) } => self.item.show(),
            HostEvent::CursorMoved { .. } => {}
        }
    }
}
