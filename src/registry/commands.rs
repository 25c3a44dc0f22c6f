//! Command table and the de-duplicating registrar layered over it.
//!
//! The host's [`CommandTable`] refuses to bind the same id twice. Modes come
//! and go, so the [`CommandRegistrar`] keeps track of which ids it has bound
//! and on whose behalf, and hands them back to the table when the owning mode
//! deactivates (or everything at shutdown).

use super::error::ModeError;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// A command callback. Arguments are passed through untouched; validating
/// them is the handler's business.
pub type CommandHandler = Rc<dyn Fn(&[String]) -> anyhow::Result<()>>;

/// Who a registered command belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommandOwner {
    /// Host commands (mode selection and friends), released only at shutdown.
    Host,
    /// Commands owned by a mode, released when that mode deactivates.
    Mode(String),
}

impl fmt::Display for CommandOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOwner::Host => write!(f, "host"),
            CommandOwner::Mode(id) => write!(f, "mode '{}'", id),
        }
    }
}

/// Receipt for a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandHandle {
    id: String,
    owner: CommandOwner,
}

impl CommandHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner(&self) -> &CommandOwner {
        &self.owner
    }
}

/// A command a mode wants bound while it is active.
#[derive(Clone)]
pub struct ModeCommand {
    pub id: String,
    pub handler: CommandHandler,
}

impl ModeCommand {
    pub fn new<F>(id: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&[String]) -> anyhow::Result<()> + 'static,
    {
        Self {
            id: id.into(),
            handler: Rc::new(handler),
        }
    }
}

impl fmt::Debug for ModeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeCommand").field("id", &self.id).finish()
    }
}

/// The host's global command table.
///
/// Binding an id that is already present is rejected with
/// [`ModeError::CommandCollision`].
#[derive(Default)]
pub struct CommandTable {
    handlers: IndexMap<String, CommandHandler>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `id` to `handler`.
    pub fn register(&mut self, id: &str, handler: CommandHandler) -> Result<(), ModeError> {
        if self.handlers.contains_key(id) {
            return Err(ModeError::CommandCollision(id.to_string()));
        }
        self.handlers.insert(id.to_string(), handler);
        Ok(())
    }

    /// Removes the binding for `id`. Returns false if nothing was bound.
    pub fn unregister(&mut self, id: &str) -> bool {
        self.handlers.shift_remove(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<CommandHandler> {
        self.handlers.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    /// Bound ids in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// De-duplicating layer over a [`CommandTable`].
pub struct CommandRegistrar {
    table: CommandTable,
    registered: HashSet<String>,
    owned: IndexMap<CommandOwner, Vec<CommandHandle>>,
    collisions: usize,
}

impl CommandRegistrar {
    /// Wraps a host table. The table may already contain bindings the
    /// registrar does not know about; those still count as collisions.
    pub fn new(table: CommandTable) -> Self {
        Self {
            table,
            registered: HashSet::new(),
            owned: IndexMap::new(),
            collisions: 0,
        }
    }

    /// Binds `id` unless it is already bound.
    ///
    /// A collision is logged and counted, and `None` is returned; the caller
    /// carries on without that command.
    pub fn register_once(
        &mut self,
        owner: CommandOwner,
        id: &str,
        handler: CommandHandler,
    ) -> Option<CommandHandle> {
        if self.registered.contains(id) {
            self.collisions += 1;
            log::warn!(
                "command '{}' requested by {} is already registered, skipping",
                id,
                owner
            );
            return None;
        }

        if let Err(err) = self.table.register(id, handler) {
            self.collisions += 1;
            log::warn!("{} (requested by {}), skipping", err, owner);
            return None;
        }

        let handle = CommandHandle {
            id: id.to_string(),
            owner: owner.clone(),
        };
        self.registered.insert(id.to_string());
        self.owned.entry(owner).or_default().push(handle.clone());
        log::debug!("registered command '{}'", id);
        Some(handle)
    }

    /// Unbinds every command held for `owner`. Returns how many were released.
    pub fn release_owner(&mut self, owner: &CommandOwner) -> usize {
        let handles = self.owned.shift_remove(owner).unwrap_or_default();
        for handle in &handles {
            self.release_handle(handle);
        }
        if !handles.is_empty() {
            log::debug!("released {} command(s) of {}", handles.len(), owner);
        }
        handles.len()
    }

    /// Unbinds everything the registrar bound, host commands included.
    pub fn release_all(&mut self) -> usize {
        let owners: Vec<CommandOwner> = self.owned.keys().cloned().collect();
        owners.iter().map(|owner| self.release_owner(owner)).sum()
    }

    fn release_handle(&mut self, handle: &CommandHandle) {
        self.registered.remove(&handle.id);
        self.table.unregister(&handle.id);
    }

    /// Handler bound to `id`, whether or not the registrar bound it.
    pub fn handler(&self, id: &str) -> Option<CommandHandler> {
        self.table.get(id)
    }

    /// Whether the registrar currently tracks `id`.
    pub fn is_registered(&self, id: &str) -> bool {
        self.registered.contains(id)
    }

    /// Ids tracked for `owner`, in registration order.
    pub fn ids_for(&self, owner: &CommandOwner) -> Vec<String> {
        self.owned
            .get(owner)
            .map(|handles| handles.iter().map(|h| h.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Ids tracked for any mode owner.
    pub fn mode_ids(&self) -> Vec<String> {
        self.owned
            .iter()
            .filter(|(owner, _)| matches!(owner, CommandOwner::Mode(_)))
            .flat_map(|(_, handles)| handles.iter().map(|h| h.id.clone()))
            .collect()
    }

    /// Every id bound in the underlying table.
    pub fn table_ids(&self) -> Vec<String> {
        self.table.ids()
    }

    /// Number of registrations skipped because of a collision.
    pub fn collisions(&self) -> usize {
        self.collisions
    }
}

impl Default for CommandRegistrar {
    fn default() -> Self {
        Self::new(CommandTable::new())
    }
}
