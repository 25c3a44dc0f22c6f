//! Persisted key-value state.
//!
//! The store holds small JSON values that survive restarts: the id of the
//! last active mode under [`ACTIVE_MODE_KEY`], and one namespace per mode for
//! whatever that mode wants to keep (see [`ScopedStore`]).
//!
//! # Example
//!
//! ```
//! use modeswitch::store::{MemoryStore, PersistedActiveMode, StateStore};
//!
//! let mut store = MemoryStore::new();
//! assert_eq!(PersistedActiveMode::read(&store), PersistedActiveMode::Absent);
//!
//! PersistedActiveMode::Mode("records".to_string()).write(&mut store).unwrap();
//! assert_eq!(
//!     PersistedActiveMode::read(&store),
//!     PersistedActiveMode::Mode("records".to_string())
//! );
//!
//! PersistedActiveMode::Disabled.write(&mut store).unwrap();
//! assert_eq!(store.get("modeswitch.activeMode"), Some(serde_json::json!("none")));
//! ```

pub mod file;

pub use file::FileStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Key holding the last active mode id.
pub const ACTIVE_MODE_KEY: &str = "modeswitch.activeMode";

/// Value stored under [`ACTIVE_MODE_KEY`] after an explicit "disable all".
pub const DISABLED_SENTINEL: &str = "none";

/// Small persistent key-value storage scoped to the host session.
pub trait StateStore {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: Value) -> anyhow::Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> anyhow::Result<()>;

    /// All keys currently present, sorted.
    fn keys(&self) -> Vec<String>;
}

/// A store shared between the session, the registry and mode environments.
pub type SharedStore = Rc<RefCell<dyn StateStore>>;

/// Wraps a concrete store for sharing.
pub fn shared<S: StateStore + 'static>(store: S) -> SharedStore {
    Rc::new(RefCell::new(store))
}

/// In-memory store. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> anyhow::Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        self.values.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

/// What the store says about the last active mode.
///
/// `Absent` (never written) and `Disabled` (the user turned every mode off)
/// are deliberately different: bootstrap falls back to a default for the
/// former and honors the latter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistedActiveMode {
    Absent,
    Disabled,
    Mode(String),
}

impl PersistedActiveMode {
    /// Reads the active-mode key. Values that are not strings are treated as
    /// absent.
    pub fn read(store: &dyn StateStore) -> Self {
        match store.get(ACTIVE_MODE_KEY) {
            Some(Value::String(id)) if id == DISABLED_SENTINEL => PersistedActiveMode::Disabled,
            Some(Value::String(id)) if !id.is_empty() => PersistedActiveMode::Mode(id),
            Some(other) => {
                log::warn!(
                    "ignoring malformed value for '{}': {}",
                    ACTIVE_MODE_KEY,
                    other
                );
                PersistedActiveMode::Absent
            }
            None => PersistedActiveMode::Absent,
        }
    }

    /// Writes the active-mode key. `Absent` removes it.
    pub fn write(&self, store: &mut dyn StateStore) -> anyhow::Result<()> {
        match self {
            PersistedActiveMode::Absent => store.remove(ACTIVE_MODE_KEY),
            PersistedActiveMode::Disabled => {
                store.set(ACTIVE_MODE_KEY, Value::String(DISABLED_SENTINEL.to_string()))
            }
            PersistedActiveMode::Mode(id) => store.set(ACTIVE_MODE_KEY, Value::String(id.clone())),
        }
    }

    pub fn mode_id(&self) -> Option<&str> {
        match self {
            PersistedActiveMode::Mode(id) => Some(id),
            _ => None,
        }
    }
}

/// A mode's private view of the store. Keys are prefixed with the mode id.
#[derive(Clone)]
pub struct ScopedStore {
    store: SharedStore,
    scope: String,
}

impl ScopedStore {
    pub fn new(store: SharedStore, scope: impl Into<String>) -> Self {
        Self {
            store,
            scope: scope.into(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    fn key(&self, key: &str) -> String {
        format!("{}.{}", self.scope, key)
    }

    /// Reads and deserializes `key`. A value of the wrong shape reads as
    /// missing.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.store.borrow().get(&self.key(key))?;
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                log::warn!("discarding unreadable '{}': {}", self.key(key), err);
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> anyhow::Result<()> {
        let value = serde_json::to_value(value)?;
        self.store.borrow_mut().set(&self.key(key), value)
    }

    pub fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.store.borrow_mut().remove(&self.key(key))
    }
}
