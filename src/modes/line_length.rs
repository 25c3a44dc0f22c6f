//! Warns when the line under the cursor gets too long.

use crate::host::{HostEvent, Notifications, StatusBar, StatusItem, StatusTone};
use crate::mode::{Mode, ModeEnv};
use crate::session::SELECT_MODE_COMMAND;
use crate::store::ScopedStore;
use anyhow::Context;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

/// How a line length compares to the configured limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthLevel {
    Fine,
    /// At least 90% of the limit.
    Approaching,
    OverLimit,
    OverThreshold,
}

impl LengthLevel {
    pub fn classify(length: usize, limit: usize, threshold: usize) -> Self {
        let threshold = threshold.max(limit);
        if length > threshold {
            LengthLevel::OverThreshold
        } else if length > limit {
            LengthLevel::OverLimit
        } else if length * 10 >= limit * 9 {
            LengthLevel::Approaching
        } else {
            LengthLevel::Fine
        }
    }

    fn tone(self) -> StatusTone {
        match self {
            LengthLevel::Fine | LengthLevel::Approaching => StatusTone::Normal,
            LengthLevel::OverLimit => StatusTone::Warning,
            LengthLevel::OverThreshold => StatusTone::Error,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            LengthLevel::Fine => "",
            LengthLevel::Approaching => " (approaching)",
            LengthLevel::OverLimit => " (too long)",
            LengthLevel::OverThreshold => " (way too long)",
        }
    }
}

pub struct LineLengthMode {
    item: StatusItem,
    notifications: Notifications,
    default_limit: usize,
    threshold: usize,
    limit: Rc<Cell<usize>>,
    /// Known lengths, fed by document changes. Lines we have not seen yet are
    /// measured by the cursor column.
    line_lengths: HashMap<usize, usize>,
    store: Option<ScopedStore>,
}

impl LineLengthMode {
    pub const ID: &'static str = "line-length";
    pub const SET_LIMIT_COMMAND: &'static str = "line-length.setLimit";

    pub fn new(
        status_bar: &StatusBar,
        notifications: &Notifications,
        limit: usize,
        threshold: usize,
    ) -> Self {
        let item = status_bar.create_item(93);
        item.set_tooltip("Line length - click to change mode");
        item.set_command(SELECT_MODE_COMMAND);
        Self {
            item,
            notifications: notifications.clone(),
            default_limit: limit,
            threshold,
            limit: Rc::new(Cell::new(limit)),
            line_lengths: HashMap::new(),
            store: None,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit.get()
    }
}

impl Mode for LineLengthMode {
    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        "Line Length"
    }

    fn description(&self) -> Option<&str> {
        Some("Warns when the current line exceeds the preferred length")
    }

    fn activate(&mut self, env: &mut ModeEnv<'_>) -> anyhow::Result<()> {
        let store = env.store();
        self.limit
            .set(store.get::<usize>("limit").unwrap_or(self.default_limit));

        let limit = self.limit.clone();
        let command_store = store.clone();
        let notifications = self.notifications.clone();
        env.register_command(Self::SET_LIMIT_COMMAND, move |args| {
            let raw = args
                .first()
                .ok_or_else(|| anyhow::anyhow!("usage: line-length.setLimit <columns>"))?;
            let value: usize = raw
                .parse()
                .with_context(|| format!("'{}' is not a column count", raw))?;
            if value == 0 {
                anyhow::bail!("the line length limit must be at least 1");
            }
            limit.set(value);
            command_store.set("limit", &value)?;
            notifications.info(format!("Line length limit set to {}", value));
            Ok(())
        });

        self.store = Some(store);
        self.item.set_tone(StatusTone::Normal);
        self.item.set_text(format!("Line length: -/{}", self.limit.get()));
        self.item.show();
        Ok(())
    }

    fn deactivate(&mut self) {
        self.item.hide();
        self.line_lengths.clear();
        self.store = None;
    }

    fn update(&mut self, line: usize, column: usize) {
        let length = self.line_lengths.get(&line).copied().unwrap_or(column);
        let limit = self.limit.get();
        let level = LengthLevel::classify(length, limit, self.threshold);
        self.item.set_tone(level.tone());
        self.item.set_text(format!(
            "Line {}: {}/{}{}",
            line + 1,
            length,
            limit,
            level.suffix()
        ));
    }

    fn on_host_event(&mut self, event: &HostEvent) {
        match event {
            HostEvent::DocumentChanged {
                line, line_length, ..
            } => {
                self.line_lengths.insert(*line, *line_length);
            }
            HostEvent::EditorChanged { .. } => self.line_lengths.clear(),
            HostEvent::CursorMoved { .. } => {}
        }
    }
}
