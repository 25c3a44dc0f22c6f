//! Error types for mode registration, activation and command dispatch.

use thiserror::Error;

/// Errors reported by the [`ModeRegistry`](super::ModeRegistry).
///
/// None of these are fatal. `UnknownMode` and `TransitionBusy` leave the
/// registry untouched, `ModeActivationFailed` is reported after the registry
/// has rolled back to its previous stable state, and `CommandCollision` is
/// only ever logged by the registrar while the activation carries on.
#[derive(Debug, Error)]
pub enum ModeError {
    /// Activation requested for an id that was never registered.
    #[error("unknown mode '{0}'")]
    UnknownMode(String),

    /// Another activation or deactivation is still in flight.
    #[error("cannot switch to '{requested}': a mode transition is already in progress")]
    TransitionBusy { requested: String },

    /// The target mode's `activate` returned an error or panicked.
    #[error("mode '{id}' failed to activate: {source}")]
    ModeActivationFailed {
        id: String,
        #[source]
        source: anyhow::Error,
    },

    /// A command id is already bound in the command table.
    #[error("command '{0}' is already registered")]
    CommandCollision(String),

    /// A mode with the same id is already registered.
    #[error("mode '{0}' is already registered")]
    DuplicateMode(String),

    /// The id is empty or collides with the persisted "no mode" sentinel.
    #[error("'{0}' is not a valid mode id")]
    InvalidModeId(String),

    /// No handler is bound for the command id.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// A command handler returned an error.
    #[error("command '{id}' failed: {source}")]
    CommandFailed {
        id: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ModeError {
    /// Returns true for the errors that a caller is expected to simply report
    /// (nothing was changed by the failed request).
    pub fn left_state_unchanged(&self) -> bool {
        matches!(
            self,
            ModeError::UnknownMode(_)
                | ModeError::TransitionBusy { .. }
                | ModeError::DuplicateMode(_)
                | ModeError::InvalidModeId(_)
                | ModeError::UnknownCommand(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_message_names_requested_mode() {
        let err = ModeError::TransitionBusy {
            requested: "records".to_string(),
        };
        assert!(err.to_string().contains("records"));
        assert!(err.left_state_unchanged());
    }

    #[test]
    fn test_activation_failure_keeps_source() {
        let err = ModeError::ModeActivationFailed {
            id: "position".to_string(),
            source: anyhow::anyhow!("status bar unavailable"),
        };
        assert_eq!(
            err.to_string(),
            "mode 'position' failed to activate: status bar unavailable"
        );
        assert!(!err.left_state_unchanged());
    }
}
