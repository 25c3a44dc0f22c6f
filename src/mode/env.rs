//! The environment handed to a mode while it activates.

use super::subscription::{Disposable, Subscriptions};
use crate::registry::commands::{CommandHandle, CommandOwner, CommandRegistrar};
use crate::store::{ScopedStore, SharedStore};
use std::rc::Rc;

/// What a mode can reach during `activate`.
///
/// - a [`ScopedStore`] for its own persisted data,
/// - subscriptions released when it deactivates ([`ModeEnv::track`]) or when
///   the session shuts down ([`ModeEnv::track_for_session`]),
/// - command registration, routed through the registrar so ids are never
///   bound twice.
///
/// Everything registered here belongs to the mode being activated. If that
/// activation fails it is all rolled back again.
pub struct ModeEnv<'a> {
    mode_id: &'a str,
    store: &'a SharedStore,
    registrar: &'a mut CommandRegistrar,
    subscriptions: &'a mut Subscriptions,
    session_subscriptions: &'a mut Subscriptions,
}

impl<'a> ModeEnv<'a> {
    pub(crate) fn new(
        mode_id: &'a str,
        store: &'a SharedStore,
        registrar: &'a mut CommandRegistrar,
        subscriptions: &'a mut Subscriptions,
        session_subscriptions: &'a mut Subscriptions,
    ) -> Self {
        Self {
            mode_id,
            store,
            registrar,
            subscriptions,
            session_subscriptions,
        }
    }

    /// Id of the mode being activated.
    pub fn mode_id(&self) -> &str {
        self.mode_id
    }

    /// The mode's private store namespace. May be kept until `deactivate`.
    pub fn store(&self) -> ScopedStore {
        ScopedStore::new(self.store.clone(), self.mode_id)
    }

    /// Binds a command for as long as the mode stays active.
    ///
    /// Returns `None` when the id is already bound; the mode carries on
    /// without it.
    pub fn register_command<F>(&mut self, id: &str, handler: F) -> Option<CommandHandle>
    where
        F: Fn(&[String]) -> anyhow::Result<()> + 'static,
    {
        self.registrar.register_once(
            CommandOwner::Mode(self.mode_id.to_string()),
            id,
            Rc::new(handler),
        )
    }

    /// Keeps `disposable` until the mode deactivates.
    pub fn track(&mut self, disposable: Disposable) {
        self.subscriptions.push(disposable);
    }

    /// Keeps `disposable` until the session shuts down.
    pub fn track_for_session(&mut self, disposable: Disposable) {
        self.session_subscriptions.push(disposable);
    }
}
