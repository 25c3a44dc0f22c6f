//! The contract every mode implements.
//!
//! A mode is a unit of pluggable behavior: it has an identity, shows some
//! indicator while it is active, and reacts to cursor moves. The registry is
//! the only caller of the lifecycle methods and guarantees at most one mode
//! is active at a time.
//!
//! # Lifecycle
//!
//! - constructed once at startup and registered once
//! - `activate` / `deactivate` any number of times, never overlapping
//! - `update` only while active
//!
//! A mode owns everything it allocates in `activate` and releases it in
//! `deactivate`. `deactivate` must be safe to call when the mode holds
//! nothing, because the registry also calls it to clean up after a failed
//! `activate`.
//!
//! # Example
//!
//! ```
//! use modeswitch::mode::{Mode, ModeEnv};
//!
//! #[derive(Default)]
//! struct Ruler {
//!     active: bool,
//!     last: Option<(usize, usize)>,
//! }
//!
//! impl Mode for Ruler {
//!     fn id(&self) -> &str {
//!         "ruler"
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Ruler"
//!     }
//!
//!     fn activate(&mut self, _env: &mut ModeEnv<'_>) -> anyhow::Result<()> {
//!         self.active = true;
//!         Ok(())
//!     }
//!
//!     fn deactivate(&mut self) {
//!         self.active = false;
//!         self.last = None;
//!     }
//!
//!     fn update(&mut self, line: usize, column: usize) {
//!         self.last = Some((line, column));
//!     }
//! }
//! ```

pub mod env;
pub mod subscription;

pub use env::ModeEnv;
pub use subscription::{Disposable, Subscriptions};

use crate::host::HostEvent;
use crate::registry::commands::ModeCommand;
use serde::Serialize;

/// A pluggable unit of behavior driven by the registry.
pub trait Mode {
    /// Stable key, unique across the registry.
    fn id(&self) -> &str;

    /// Display label.
    fn name(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    /// Commands bound by the registry before `activate` runs and unbound
    /// after `deactivate`.
    fn commands(&self) -> Vec<ModeCommand> {
        Vec::new()
    }

    /// Sets the mode up. An error leaves the mode inactive and rolls back
    /// everything registered through `env`.
    fn activate(&mut self, env: &mut ModeEnv<'_>) -> anyhow::Result<()>;

    /// Releases everything acquired by `activate`. Must be idempotent.
    fn deactivate(&mut self);

    /// Cursor moved to `line`/`column` (zero-based).
    fn update(&mut self, line: usize, column: usize);

    /// Document and editor notifications. Ignored unless overridden.
    fn on_host_event(&mut self, _event: &HostEvent) {}
}

/// Identity of a registered mode, as shown in the selection surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeDescriptor {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl ModeDescriptor {
    pub fn of(mode: &dyn Mode) -> Self {
        Self {
            id: mode.id().to_string(),
            name: mode.name().to_string(),
            description: mode.description().map(str::to_string),
        }
    }
}
