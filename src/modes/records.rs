//! Personal records: the furthest line and column the cursor has reached.

use crate::host::{Notifications, StatusBar, StatusItem};
use crate::mode::{Disposable, Mode, ModeEnv};
use crate::session::SELECT_MODE_COMMAND;
use crate::store::ScopedStore;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

const RECORDS_KEY: &str = "records";

/// One-based line and column maxima.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Records {
    pub max_line: usize,
    pub max_column: usize,
}

impl Records {
    /// Folds a zero-based position in. Returns true if either record moved.
    pub fn observe(&mut self, line: usize, column: usize) -> bool {
        let (line, column) = (line.saturating_add(1), column.saturating_add(1));
        let mut changed = false;
        if line > self.max_line {
            self.max_line = line;
            changed = true;
        }
        if column > self.max_column {
            self.max_column = column;
            changed = true;
        }
        changed
    }
}

pub struct RecordsMode {
    item: StatusItem,
    notifications: Notifications,
    records: Rc<RefCell<Records>>,
    store: Option<ScopedStore>,
}

impl RecordsMode {
    pub const ID: &'static str = "records";
    pub const RESET_COMMAND: &'static str = "records.reset";

    pub fn new(status_bar: &StatusBar, notifications: &Notifications) -> Self {
        let item = status_bar.create_item(97);
        item.set_tooltip("Coding records - click to change mode");
        item.set_command(SELECT_MODE_COMMAND);
        Self {
            item,
            notifications: notifications.clone(),
            records: Rc::new(RefCell::new(Records::default())),
            store: None,
        }
    }

    pub fn records(&self) -> Records {
        *self.records.borrow()
    }

    fn render(&self) {
        let records = self.records.borrow();
        self.item
            .set_text(format!("Max: L{}, C{}", records.max_line, records.max_column));
    }
}

impl Mode for RecordsMode {
    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        "Records"
    }

    fn description(&self) -> Option<&str> {
        Some("Tracks the furthest line and column reached")
    }

    fn activate(&mut self, env: &mut ModeEnv<'_>) -> anyhow::Result<()> {
        let store = env.store();
        *self.records.borrow_mut() = store.get(RECORDS_KEY).unwrap_or_default();

        let records = self.records.clone();
        let reset_store = store.clone();
        let notifications = self.notifications.clone();
        env.register_command(Self::RESET_COMMAND, move |_| {
            *records.borrow_mut() = Records::default();
            reset_store.set(RECORDS_KEY, &Records::default())?;
            notifications.info("Records reset");
            Ok(())
        });

        // Flush whatever was reached this time round when the mode goes away.
        let records = self.records.clone();
        let flush_store = store.clone();
        env.track(Disposable::new(move || {
            if let Err(err) = flush_store.set(RECORDS_KEY, &*records.borrow()) {
                log::warn!("could not save records: {:#}", err);
            }
        }));

        self.store = Some(store);
        self.render();
        self.item.show();
        Ok(())
    }

    fn deactivate(&mut self) {
        self.item.hide();
        self.store = None;
    }

    fn update(&mut self, line: usize, column: usize) {
        if self.records.borrow_mut().observe(line, column) {
            self.render();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_tracks_maxima_independently() {
        let mut records = Records::default();
        assert!(records.observe(9, 2));
        assert!(records.observe(3, 40));
        assert!(!records.observe(5, 5));
        assert_eq!(
            records,
            Records {
                max_line: 10,
                max_column: 41
            }
        );
    }

    #[test]
    fn test_observe_saturates_at_the_end_of_the_range() {
        let mut records = Records::default();
        assert!(records.observe(usize::MAX, usize::MAX));
        assert_eq!(records.max_line, usize::MAX);
        assert_eq!(records.max_column, usize::MAX);
        assert!(!records.observe(usize::MAX, 0));
    }
}
