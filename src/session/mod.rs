//! The host session: one owned object tying the registry, the persisted
//! store and the host UI together.
//!
//! A `Session` is built once at startup and passed to whatever needs it.
//! It registers the host-owned selection commands, restores the last active
//! mode on [`start`](Session::start), routes host events through the
//! [`PositionDispatcher`], and tears everything down on
//! [`shutdown`](Session::shutdown).
//!
//! # Example
//!
//! ```
//! use modeswitch::config::Config;
//! use modeswitch::modes;
//! use modeswitch::session::{BootOutcome, Session};
//! use modeswitch::store::{self, MemoryStore};
//!
//! let session = Session::new(Config::default(), store::shared(MemoryStore::new()));
//! for mode in modes::builtin_modes(session.config(), session.status_bar(), session.notifications()) {
//!     session.register(mode).unwrap();
//! }
//!
//! assert_eq!(session.start(), BootOutcome::Defaulted("position".to_string()));
//! session.cursor_moved(9, 3);
//! assert!(session.status_line(60).contains("Ln 10, Col 4"));
//! session.shutdown();
//! ```

pub mod bootstrap;
pub mod dispatcher;
pub mod selection;

pub use bootstrap::{bootstrap, BootOutcome, FALLBACK_MODE};
pub use dispatcher::PositionDispatcher;
pub use selection::{select, selection_items, SelectionItem, SelectionTarget};

use crate::config::Config;
use crate::host::{HostEvent, Notifications, StatusBar, StatusItem};
use crate::mode::Mode;
use crate::registry::{ModeError, ModeRegistry, ShutdownOutcome};
use crate::store::SharedStore;
use std::rc::Rc;

/// Host command opening the mode picker (or, with an argument, picking).
pub const SELECT_MODE_COMMAND: &str = "modeswitch.selectMode";
/// Host command turning every mode off.
pub const DISABLE_ALL_COMMAND: &str = "modeswitch.disableAll";

const INDICATOR_PRIORITY: i32 = 1000;

pub struct Session {
    config: Config,
    registry: Rc<ModeRegistry>,
    store: SharedStore,
    status_bar: StatusBar,
    notifications: Notifications,
    indicator: StatusItem,
    dispatcher: PositionDispatcher,
}

impl Session {
    pub fn new(config: Config, store: SharedStore) -> Self {
        let registry = Rc::new(ModeRegistry::new(store.clone()));
        let status_bar = StatusBar::new();
        let notifications = Notifications::new();

        let indicator = status_bar.create_item(INDICATOR_PRIORITY);
        indicator.set_tooltip("Click to change mode");
        indicator.set_command(SELECT_MODE_COMMAND);
        indicator.show();

        register_host_commands(&registry, &notifications);

        let session = Self {
            config,
            dispatcher: PositionDispatcher::new(registry.clone()),
            registry,
            store,
            status_bar,
            notifications,
            indicator,
        };
        session.refresh_indicator();
        session
    }

    pub fn register(&self, mode: Box<dyn Mode>) -> Result<(), ModeError> {
        self.registry.register(mode)
    }

    /// Restores the last active mode (or a default).
    pub fn start(&self) -> BootOutcome {
        let outcome = bootstrap(
            &self.registry,
            self.config.default_mode.as_deref(),
            &self.notifications,
        );
        log::info!("session started: {:?}", outcome);
        self.refresh_indicator();
        outcome
    }

    pub fn cursor_moved(&self, line: usize, column: usize) {
        self.dispatcher.cursor_moved(line, column);
    }

    pub fn handle_event(&self, event: &HostEvent) {
        self.dispatcher.handle(event);
    }

    pub fn selection_items(&self) -> Vec<SelectionItem> {
        selection_items(&self.registry)
    }

    pub fn select(&self, target: &SelectionTarget) -> Result<(), ModeError> {
        let result = select(&self.registry, target, &self.notifications);
        self.refresh_indicator();
        result
    }

    /// Runs a bound command. A failure is reported to the user once.
    pub fn execute_command(&self, id: &str, args: &[String]) -> Result<(), ModeError> {
        let result = self.registry.execute_command(id, args);
        if let Err(err) = &result {
            self.notifications.error(err.to_string());
        }
        self.refresh_indicator();
        result
    }

    /// The status bar rendered `width` cells wide.
    pub fn status_line(&self, width: u16) -> String {
        self.refresh_indicator();
        self.status_bar.render_line(width)
    }

    pub fn shutdown(&self) -> ShutdownOutcome {
        let outcome = self.registry.shutdown();
        if outcome == ShutdownOutcome::Completed {
            self.indicator.hide();
        }
        outcome
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Rc<ModeRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn status_bar(&self) -> &StatusBar {
        &self.status_bar
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    fn refresh_indicator(&self) {
        let text = match self.registry.get_active() {
            Some(mode) => format!("[{}]", mode.name),
            None => "[no mode]".to_string(),
        };
        self.indicator.set_text(text);
    }
}

fn register_host_commands(registry: &Rc<ModeRegistry>, notifications: &Notifications) {
    let weak = Rc::downgrade(registry);
    let notes = notifications.clone();
    registry.register_host_command(SELECT_MODE_COMMAND, move |args| {
        let registry = weak
            .upgrade()
            .ok_or_else(|| anyhow::anyhow!("session has ended"))?;
        let Some(target) = args.first() else {
            anyhow::bail!("usage: {} <mode id|none>", SELECT_MODE_COMMAND);
        };
        // `select` already told the user about a failure.
        let _ = select(&registry, &SelectionTarget::parse(target), &notes);
        Ok(())
    });

    let weak = Rc::downgrade(registry);
    let notes = notifications.clone();
    registry.register_host_command(DISABLE_ALL_COMMAND, move |_| {
        let registry = weak
            .upgrade()
            .ok_or_else(|| anyhow::anyhow!("session has ended"))?;
        let _ = select(&registry, &SelectionTarget::DisableAll, &notes);
        Ok(())
    });
}
