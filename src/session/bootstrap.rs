//! Restoring the last active mode at startup.

use crate::host::Notifications;
use crate::registry::{ModeError, ModeRegistry};
use crate::store::PersistedActiveMode;

/// Mode used when nothing persisted or configured can be activated.
pub const FALLBACK_MODE: &str = "position";

/// What bootstrap ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootOutcome {
    /// The persisted mode was activated.
    Restored(String),
    /// Nothing usable was persisted; the configured (or hard-coded) default
    /// was activated.
    Defaulted(String),
    /// The first choice failed and the hard-coded fallback took over.
    FellBack(String),
    /// The user had turned every mode off; nothing was activated.
    Disabled,
    /// Nothing could be activated. One error notification was emitted.
    Failed,
}

impl BootOutcome {
    pub fn active_mode(&self) -> Option<&str> {
        match self {
            BootOutcome::Restored(id) | BootOutcome::Defaulted(id) | BootOutcome::FellBack(id) => {
                Some(id)
            }
            BootOutcome::Disabled | BootOutcome::Failed => None,
        }
    }
}

/// Activates the persisted mode, or a default.
///
/// Order of preference: the persisted mode (if still registered), the
/// configured default (if registered), [`FALLBACK_MODE`]. If the chosen mode
/// fails, the fallback is tried exactly once more (unless it was the one that
/// just failed). A persisted "no mode" is honored and activates nothing.
pub fn bootstrap(
    registry: &ModeRegistry,
    configured_default: Option<&str>,
    notifications: &Notifications,
) -> BootOutcome {
    let (candidate, restoring) = match registry.persisted() {
        PersistedActiveMode::Disabled => {
            log::info!("all modes were disabled last session, starting idle");
            return BootOutcome::Disabled;
        }
        PersistedActiveMode::Mode(id) if registry.contains(&id) => (id, true),
        PersistedActiveMode::Mode(id) => {
            log::warn!("persisted mode '{}' is no longer registered", id);
            (default_candidate(registry, configured_default), false)
        }
        PersistedActiveMode::Absent => (default_candidate(registry, configured_default), false),
    };

    let mut last_error = match registry.activate(&candidate) {
        Ok(_) if restoring => return BootOutcome::Restored(candidate),
        Ok(_) => return BootOutcome::Defaulted(candidate),
        Err(err) => {
            log::warn!("startup activation of '{}' failed: {}", candidate, err);
            err
        }
    };

    if candidate != FALLBACK_MODE {
        match registry.activate(FALLBACK_MODE) {
            Ok(_) => return BootOutcome::FellBack(FALLBACK_MODE.to_string()),
            Err(err) => last_error = err,
        }
    }

    report_failure(&last_error, notifications);
    BootOutcome::Failed
}

fn default_candidate(registry: &ModeRegistry, configured_default: Option<&str>) -> String {
    match configured_default {
        Some(id) if registry.contains(id) => id.to_string(),
        Some(id) => {
            log::warn!(
                "configured default mode '{}' is not registered, using '{}'",
                id,
                FALLBACK_MODE
            );
            FALLBACK_MODE.to_string()
        }
        None => FALLBACK_MODE.to_string(),
    }
}

fn report_failure(err: &ModeError, notifications: &Notifications) {
    log::error!("no mode could be activated at startup: {}", err);
    notifications.error(format!("No mode could be activated: {}", err));
}
