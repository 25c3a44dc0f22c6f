#![allow(dead_code)]

use modeswitch::host::HostEvent;
use modeswitch::mode::{Disposable, Mode, ModeEnv};
use modeswitch::registry::{ModeCommand, ModeRegistry};
use modeswitch::store::{self, MemoryStore, SharedStore};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub type CallLog = Rc<RefCell<Vec<String>>>;

pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn memory_store() -> SharedStore {
    store::shared(MemoryStore::new())
}

pub fn registry() -> Rc<ModeRegistry> {
    Rc::new(ModeRegistry::new(memory_store()))
}

/// Counts log entries equal to `entry`.
pub fn count(log: &CallLog, entry: &str) -> usize {
    log.borrow().iter().filter(|e| e.as_str() == entry).count()
}

/// A mode that records every call made to it.
pub struct TestMode {
    id: String,
    name: String,
    log: CallLog,
    commands: Vec<String>,
    env_commands: Vec<String>,
    subscriptions: bool,
    panicking_subscription: bool,
    fail: Rc<Cell<bool>>,
    panics: bool,
    on_activate: Option<Box<dyn Fn()>>,
    active: Rc<Cell<bool>>,
}

impl TestMode {
    pub fn new(id: &str, log: &CallLog) -> Self {
        Self {
            id: id.to_string(),
            name: format!("{} mode", id),
            log: log.clone(),
            commands: Vec::new(),
            env_commands: Vec::new(),
            subscriptions: false,
            panicking_subscription: false,
            fail: Rc::new(Cell::new(false)),
            panics: false,
            on_activate: None,
            active: Rc::new(Cell::new(false)),
        }
    }

    /// Commands declared through `Mode::commands`.
    pub fn with_commands(mut self, ids: &[&str]) -> Self {
        self.commands = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    /// Commands registered through the env during `activate`.
    pub fn with_env_commands(mut self, ids: &[&str]) -> Self {
        self.env_commands = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn with_subscriptions(mut self) -> Self {
        self.subscriptions = true;
        self
    }

    /// Tracks a subscription whose cleanup panics.
    pub fn with_panicking_subscription(mut self) -> Self {
        self.panicking_subscription = true;
        self
    }

    /// `activate` fails while the returned flag is set.
    pub fn failing(self, fail: bool) -> (Self, Rc<Cell<bool>>) {
        self.fail.set(fail);
        let flag = self.fail.clone();
        (self, flag)
    }

    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    /// Runs `hook` in the middle of `activate`.
    pub fn on_activate(mut self, hook: impl Fn() + 'static) -> Self {
        self.on_activate = Some(Box::new(hook));
        self
    }

    /// Flag mirroring whether the mode believes it is active.
    pub fn active_flag(&self) -> Rc<Cell<bool>> {
        self.active.clone()
    }

    fn record(&self, what: &str) {
        self.log.borrow_mut().push(format!("{}:{}", self.id, what));
    }
}

impl Mode for TestMode {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn commands(&self) -> Vec<ModeCommand> {
        self.commands
            .iter()
            .map(|id| {
                let log = self.log.clone();
                let id = id.clone();
                ModeCommand::new(id.clone(), move |args| {
                    log.borrow_mut().push(format!("run:{}{:?}", id, args));
                    Ok(())
                })
            })
            .collect()
    }

    fn activate(&mut self, env: &mut ModeEnv<'_>) -> anyhow::Result<()> {
        self.record("activate");

        for id in &self.env_commands {
            let log = self.log.clone();
            let command = id.clone();
            env.register_command(id, move |_| {
                log.borrow_mut().push(format!("run:{}", command));
                Ok(())
            });
        }

        if self.subscriptions {
            let log = self.log.clone();
            let id = self.id.clone();
            env.track(Disposable::new(move || {
                log.borrow_mut().push(format!("{}:disposed", id))
            }));
            let log = self.log.clone();
            let id = self.id.clone();
            env.track_for_session(Disposable::new(move || {
                log.borrow_mut().push(format!("{}:session-disposed", id))
            }));
        }

        if self.panicking_subscription {
            let id = self.id.clone();
            env.track(Disposable::new(move || panic!("{} cleanup exploded", id)));
        }

        if let Some(hook) = &self.on_activate {
            hook();
        }
        if self.panics {
            panic!("{} exploded", self.id);
        }
        if self.fail.get() {
            anyhow::bail!("{} refused to start", self.id);
        }

        self.active.set(true);
        Ok(())
    }

    fn deactivate(&mut self) {
        self.record("deactivate");
        self.active.set(false);
    }

    fn update(&mut self, line: usize, column: usize) {
        self.record(&format!("update({},{})", line, column));
    }

    fn on_host_event(&mut self, event: &HostEvent) {
        self.record(&format!("event({})", event));
    }
}
