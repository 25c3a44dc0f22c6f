//! Mode registry and activation state machine.
//!
//! The registry owns every registered mode, knows which one (if any) is
//! active, and is the only thing that ever calls a mode's `activate` or
//! `deactivate`. Transitions are serialized:
//!
//! ```text
//! Idle      --activate(Y)-->        Busy --ok--> Active(Y)
//! Active(X) --activate(Y), Y != X--> Busy --ok--> Active(Y)
//! Active(X) --activate(X)-->        Active(X)        (no-op)
//! Active(X) --deactivate_all-->     Busy --> Idle
//! Busy      --failure-->            previous stable state
//! ```
//!
//! A request that arrives while a transition (or a call into the active
//! mode) is in flight is refused with [`ModeError::TransitionBusy`]. It is
//! never queued. Everything runs on one thread; the only way to observe the
//! registry mid-transition is re-entrantly, from code the transition itself
//! calls (a mode's `activate`, a disposed subscription, a command handler).
//!
//! # Example
//!
//! ```
//! use modeswitch::mode::{Mode, ModeEnv};
//! use modeswitch::registry::{Activation, ModeRegistry};
//! use modeswitch::store::{self, MemoryStore};
//!
//! struct Quiet(&'static str);
//!
//! impl Mode for Quiet {
//!     fn id(&self) -> &str { self.0 }
//!     fn name(&self) -> &str { self.0 }
//!     fn activate(&mut self, _env: &mut ModeEnv<'_>) -> anyhow::Result<()> { Ok(()) }
//!     fn deactivate(&mut self) {}
//!     fn update(&mut self, _line: usize, _column: usize) {}
//! }
//!
//! let registry = ModeRegistry::new(store::shared(MemoryStore::new()));
//! registry.register(Box::new(Quiet("a"))).unwrap();
//! registry.register(Box::new(Quiet("b"))).unwrap();
//!
//! assert_eq!(registry.activate("a").unwrap(), Activation::Activated);
//! assert_eq!(registry.activate("a").unwrap(), Activation::AlreadyActive);
//! assert!(registry.activate("missing").is_err());
//! assert_eq!(registry.active_id().as_deref(), Some("a"));
//! ```

pub mod commands;
pub mod error;

pub use commands::{
    CommandHandle, CommandHandler, CommandOwner, CommandRegistrar, CommandTable, ModeCommand,
};
pub use error::ModeError;

use crate::host::HostEvent;
use crate::mode::{Mode, ModeDescriptor, ModeEnv, Subscriptions};
use crate::store::{PersistedActiveMode, SharedStore, DISABLED_SENTINEL};
use indexmap::IndexMap;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

/// Externally observable activation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationState {
    NoModeActive,
    ModeActive(String),
    TransitionInProgress,
}

/// Successful outcome of [`ModeRegistry::activate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The mode was switched on.
    Activated,
    /// The mode was already the active one; nothing happened.
    AlreadyActive,
}

/// Outcome of [`ModeRegistry::shutdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    Completed,
    /// A transition was in flight; shutdown runs as soon as it settles.
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Settled,
    /// Switching modes.
    Transition,
    /// Inside the active mode's `update` / `on_host_event`.
    Callback,
}

/// Holds the registry in a non-settled phase. Dropping it (also during
/// unwinding) settles the registry again.
struct PhaseGuard<'a> {
    phase: &'a Cell<Phase>,
}

impl<'a> PhaseGuard<'a> {
    fn try_enter(phase: &'a Cell<Phase>, next: Phase) -> Option<Self> {
        if phase.get() != Phase::Settled {
            return None;
        }
        phase.set(next);
        Some(Self { phase })
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.phase.set(Phase::Settled);
    }
}

struct ModeEntry {
    descriptor: ModeDescriptor,
    mode: RefCell<Box<dyn Mode>>,
    subscriptions: RefCell<Subscriptions>,
}

/// The single authority over which mode is active.
pub struct ModeRegistry {
    modes: RefCell<IndexMap<String, Rc<ModeEntry>>>,
    active: RefCell<Option<String>>,
    phase: Cell<Phase>,
    shutdown_pending: Cell<bool>,
    registrar: RefCell<CommandRegistrar>,
    session_subscriptions: RefCell<Subscriptions>,
    store: SharedStore,
}

impl ModeRegistry {
    /// Creates an empty registry persisting to `store`.
    pub fn new(store: SharedStore) -> Self {
        Self::with_command_table(store, CommandTable::new())
    }

    /// Creates an empty registry on top of an existing host command table.
    pub fn with_command_table(store: SharedStore, table: CommandTable) -> Self {
        Self {
            modes: RefCell::new(IndexMap::new()),
            active: RefCell::new(None),
            phase: Cell::new(Phase::Settled),
            shutdown_pending: Cell::new(false),
            registrar: RefCell::new(CommandRegistrar::new(table)),
            session_subscriptions: RefCell::new(Subscriptions::new()),
            store,
        }
    }

    /// Adds a mode. Meant to be called at startup, before any activation.
    pub fn register(&self, mode: Box<dyn Mode>) -> Result<(), ModeError> {
        let descriptor = ModeDescriptor::of(mode.as_ref());
        let id = descriptor.id.clone();

        if id.trim().is_empty() || id == DISABLED_SENTINEL {
            return Err(ModeError::InvalidModeId(id));
        }
        if self.phase.get() == Phase::Transition {
            return Err(ModeError::TransitionBusy { requested: id });
        }

        let mut modes = self.modes.borrow_mut();
        if modes.contains_key(&id) {
            return Err(ModeError::DuplicateMode(id));
        }

        log::debug!("registered mode '{}' ({})", id, descriptor.name);
        modes.insert(
            id,
            Rc::new(ModeEntry {
                descriptor,
                mode: RefCell::new(mode),
                subscriptions: RefCell::new(Subscriptions::new()),
            }),
        );
        Ok(())
    }

    /// Makes `id` the active mode.
    ///
    /// Deactivates the current mode first, binds the target's commands,
    /// activates it and persists its id. If the target fails to activate,
    /// whatever was active before is brought back.
    pub fn activate(&self, id: &str) -> Result<Activation, ModeError> {
        if self.phase.get() != Phase::Settled {
            log::warn!("refusing to activate '{}': a transition is in progress", id);
            return Err(ModeError::TransitionBusy {
                requested: id.to_string(),
            });
        }

        let entry = self.entry(id).ok_or_else(|| {
            log::warn!("refusing to activate unknown mode '{}'", id);
            ModeError::UnknownMode(id.to_string())
        })?;

        if self.active.borrow().as_deref() == Some(id) {
            log::debug!("mode '{}' is already active", id);
            return Ok(Activation::AlreadyActive);
        }

        self.transition(id, || self.switch_to(&entry))
    }

    /// Turns the active mode off and persists "no mode".
    ///
    /// Returns whether a mode was active. Calling it with nothing active is
    /// fine and only rewrites the persisted sentinel.
    pub fn deactivate_all(&self) -> Result<bool, ModeError> {
        if self.phase.get() != Phase::Settled {
            log::warn!("refusing to deactivate modes: a transition is in progress");
            return Err(ModeError::TransitionBusy {
                requested: DISABLED_SENTINEL.to_string(),
            });
        }

        self.transition(DISABLED_SENTINEL, || {
            let previous = self.active.borrow_mut().take();
            let was_active = match previous.as_deref().and_then(|id| self.entry(id)) {
                Some(entry) => {
                    self.tear_down(&entry);
                    log::info!("deactivated mode '{}'", entry.descriptor.id);
                    true
                }
                None => false,
            };
            self.persist(PersistedActiveMode::Disabled);
            Ok(was_active)
        })
    }

    /// Forwards a cursor position to the active mode. Does nothing when no
    /// mode is active or a transition is in flight.
    pub fn dispatch(&self, line: usize, column: usize) {
        self.call_active("update", |mode| mode.update(line, column));
    }

    /// Forwards a document/editor notification to the active mode.
    pub fn notify(&self, event: &HostEvent) {
        self.call_active("on_host_event", |mode| mode.on_host_event(event));
    }

    /// Runs a bound command.
    pub fn execute_command(&self, id: &str, args: &[String]) -> Result<(), ModeError> {
        if self.phase.get() == Phase::Transition {
            return Err(ModeError::TransitionBusy {
                requested: id.to_string(),
            });
        }

        let handler = self
            .registrar
            .borrow()
            .handler(id)
            .ok_or_else(|| ModeError::UnknownCommand(id.to_string()))?;

        log::debug!("executing command '{}' {:?}", id, args);
        handler(args).map_err(|source| ModeError::CommandFailed {
            id: id.to_string(),
            source,
        })
    }

    /// Binds a host-owned command. Host commands survive mode switches and
    /// are released by [`shutdown`](Self::shutdown).
    pub fn register_host_command<F>(&self, id: &str, handler: F) -> Option<CommandHandle>
    where
        F: Fn(&[String]) -> anyhow::Result<()> + 'static,
    {
        if self.phase.get() == Phase::Transition {
            log::warn!("cannot register host command '{}' during a transition", id);
            return None;
        }
        self.registrar
            .borrow_mut()
            .register_once(CommandOwner::Host, id, Rc::new(handler))
    }

    /// Deactivates the active mode and releases every command and session
    /// subscription. The persisted active mode is kept so the next session
    /// can restore it.
    ///
    /// Called mid-transition, the shutdown is deferred until the transition
    /// settles.
    pub fn shutdown(&self) -> ShutdownOutcome {
        let Some(guard) = PhaseGuard::try_enter(&self.phase, Phase::Transition) else {
            log::info!("shutdown requested while busy, deferring");
            self.shutdown_pending.set(true);
            return ShutdownOutcome::Deferred;
        };
        self.shutdown_pending.set(false);

        let previous = self.active.borrow_mut().take();
        if let Some(entry) = previous.as_deref().and_then(|id| self.entry(id)) {
            self.tear_down(&entry);
        }

        let released = self.registrar.borrow_mut().release_all();
        let mut subscriptions = std::mem::take(&mut *self.session_subscriptions.borrow_mut());
        let disposed = subscriptions.dispose_all();
        drop(guard);

        log::info!(
            "registry shut down ({} command(s) released, {} subscription(s) disposed)",
            released,
            disposed
        );
        ShutdownOutcome::Completed
    }

    /// Descriptor of the active mode.
    pub fn get_active(&self) -> Option<ModeDescriptor> {
        let active = self.active.borrow().clone()?;
        self.entry(&active).map(|entry| entry.descriptor.clone())
    }

    pub fn active_id(&self) -> Option<String> {
        self.active.borrow().clone()
    }

    /// Every registered mode, in registration order.
    pub fn list_all(&self) -> Vec<ModeDescriptor> {
        self.modes
            .borrow()
            .values()
            .map(|entry| entry.descriptor.clone())
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modes.borrow().contains_key(id)
    }

    pub fn state(&self) -> ActivationState {
        if self.phase.get() == Phase::Transition {
            return ActivationState::TransitionInProgress;
        }
        match self.active_id() {
            Some(id) => ActivationState::ModeActive(id),
            None => ActivationState::NoModeActive,
        }
    }

    /// What the store currently holds for the active mode.
    pub fn persisted(&self) -> PersistedActiveMode {
        PersistedActiveMode::read(&*self.store.borrow())
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Every command bound in the table. Empty while a transition holds the
    /// registrar.
    pub fn command_ids(&self) -> Vec<String> {
        self.registrar
            .try_borrow()
            .map(|registrar| registrar.table_ids())
            .unwrap_or_default()
    }

    /// Commands bound on behalf of modes (host commands excluded).
    pub fn mode_command_ids(&self) -> Vec<String> {
        self.registrar
            .try_borrow()
            .map(|registrar| registrar.mode_ids())
            .unwrap_or_default()
    }

    /// How many command registrations were skipped as collisions.
    pub fn command_collisions(&self) -> usize {
        self.registrar
            .try_borrow()
            .map(|registrar| registrar.collisions())
            .unwrap_or(0)
    }

    fn entry(&self, id: &str) -> Option<Rc<ModeEntry>> {
        self.modes.borrow().get(id).cloned()
    }

    fn transition<T>(
        &self,
        requested: &str,
        f: impl FnOnce() -> Result<T, ModeError>,
    ) -> Result<T, ModeError> {
        let guard = PhaseGuard::try_enter(&self.phase, Phase::Transition).ok_or_else(|| {
            ModeError::TransitionBusy {
                requested: requested.to_string(),
            }
        })?;
        let result = f();
        drop(guard);
        self.run_deferred_shutdown();
        result
    }

    fn switch_to(&self, entry: &Rc<ModeEntry>) -> Result<Activation, ModeError> {
        let target = entry.descriptor.id.clone();
        let previous = self.active.borrow_mut().take();
        let previous_entry = previous.as_deref().and_then(|id| self.entry(id));

        if let Some(prev) = &previous_entry {
            log::debug!("deactivating '{}' before '{}'", prev.descriptor.id, target);
            self.tear_down(prev);
        }

        match self.bring_up(entry) {
            Ok(()) => {
                *self.active.borrow_mut() = Some(target.clone());
                self.persist(PersistedActiveMode::Mode(target.clone()));
                log::info!("activated mode '{}'", target);
                Ok(Activation::Activated)
            }
            Err(err) => {
                log::error!("{}", err);
                if let Some(prev) = previous_entry {
                    self.restore(&prev);
                }
                Err(err)
            }
        }
    }

    /// Brings back the mode that was active before a failed switch.
    fn restore(&self, entry: &Rc<ModeEntry>) {
        match self.bring_up(entry) {
            Ok(()) => {
                *self.active.borrow_mut() = Some(entry.descriptor.id.clone());
                log::info!("restored mode '{}'", entry.descriptor.id);
            }
            Err(err) => {
                log::error!("could not restore previous mode: {}", err);
                self.persist(PersistedActiveMode::Disabled);
            }
        }
    }

    /// Binds the mode's commands and runs its `activate`. On failure every
    /// trace of the attempt is torn down again.
    fn bring_up(&self, entry: &ModeEntry) -> Result<(), ModeError> {
        let id = entry.descriptor.id.as_str();

        // Session subscriptions only join the registry-wide bag once the
        // activation has succeeded.
        let mut session_subscriptions = Subscriptions::new();
        let outcome = {
            let mut mode = entry.mode.borrow_mut();
            let mut registrar = self.registrar.borrow_mut();
            let mut subscriptions = entry.subscriptions.borrow_mut();

            panic::catch_unwind(AssertUnwindSafe(|| {
                let owner = CommandOwner::Mode(id.to_string());
                for command in mode.commands() {
                    registrar.register_once(owner.clone(), &command.id, command.handler);
                }

                let mut env = ModeEnv::new(
                    id,
                    &self.store,
                    &mut registrar,
                    &mut subscriptions,
                    &mut session_subscriptions,
                );
                mode.activate(&mut env)
            }))
        };

        let source = match outcome {
            Ok(Ok(())) => {
                self.session_subscriptions
                    .borrow_mut()
                    .append(&mut session_subscriptions);
                return Ok(());
            }
            Ok(Err(err)) => err,
            Err(payload) => anyhow::anyhow!("panicked: {}", panic_message(payload.as_ref())),
        };

        self.tear_down(entry);
        session_subscriptions.dispose_all();
        Err(ModeError::ModeActivationFailed {
            id: id.to_string(),
            source,
        })
    }

    /// Deactivates the mode and releases its commands and subscriptions.
    /// Safe on a mode that holds nothing.
    fn tear_down(&self, entry: &ModeEntry) {
        let id = &entry.descriptor.id;

        match entry.mode.try_borrow_mut() {
            Ok(mut mode) => {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| mode.deactivate())) {
                    log::error!(
                        "mode '{}' panicked while deactivating: {}",
                        id,
                        panic_message(payload.as_ref())
                    );
                }
            }
            Err(_) => log::error!("mode '{}' is in use and cannot be deactivated", id),
        }

        self.registrar
            .borrow_mut()
            .release_owner(&CommandOwner::Mode(id.clone()));

        let mut subscriptions = std::mem::take(&mut *entry.subscriptions.borrow_mut());
        let disposed = subscriptions.dispose_all();
        if disposed > 0 {
            log::debug!("disposed {} subscription(s) of '{}'", disposed, id);
        }
    }

    fn call_active(&self, what: &str, f: impl FnOnce(&mut dyn Mode)) {
        let Some(guard) = PhaseGuard::try_enter(&self.phase, Phase::Callback) else {
            log::trace!("ignoring {} while busy", what);
            return;
        };

        let active = self.active_id();
        if let Some(entry) = active.as_deref().and_then(|id| self.entry(id)) {
            match entry.mode.try_borrow_mut() {
                Ok(mut mode) => {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| f(&mut **mode)));
                    if let Err(payload) = result {
                        log::error!(
                            "mode '{}' panicked in {}: {}",
                            entry.descriptor.id,
                            what,
                            panic_message(payload.as_ref())
                        );
                    }
                }
                Err(_) => log::debug!("mode '{}' re-entered {}", entry.descriptor.id, what),
            }
        }

        drop(guard);
        self.run_deferred_shutdown();
    }

    fn run_deferred_shutdown(&self) {
        if self.shutdown_pending.get() && self.phase.get() == Phase::Settled {
            self.shutdown();
        }
    }

    fn persist(&self, value: PersistedActiveMode) {
        let result = match self.store.try_borrow_mut() {
            Ok(mut store) => value.write(&mut *store),
            Err(_) => Err(anyhow::anyhow!("state store is in use")),
        };
        if let Err(err) = result {
            log::warn!("could not persist active mode {:?}: {:#}", value, err);
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
