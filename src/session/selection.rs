//! The mode picker: list every mode plus "disable all", and act on a pick.

use crate::host::Notifications;
use crate::registry::{Activation, ModeError, ModeRegistry};
use crate::store::DISABLED_SENTINEL;
use serde::Serialize;

/// Label of the synthetic entry that turns every mode off.
pub const DISABLE_ALL_LABEL: &str = "Disable all modes";

/// One row of the picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionItem {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
}

/// What the user picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionTarget {
    Mode(String),
    DisableAll,
}

impl SelectionTarget {
    /// `"none"` means "disable all"; anything else names a mode.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input == DISABLED_SENTINEL {
            SelectionTarget::DisableAll
        } else {
            SelectionTarget::Mode(input.to_string())
        }
    }
}

/// Registered modes in registration order, then the "disable all" entry.
pub fn selection_items(registry: &ModeRegistry) -> Vec<SelectionItem> {
    let active = registry.active_id();
    let mut items: Vec<SelectionItem> = registry
        .list_all()
        .into_iter()
        .map(|mode| SelectionItem {
            active: active.as_deref() == Some(mode.id.as_str()),
            id: mode.id,
            name: mode.name,
            description: mode.description,
        })
        .collect();

    items.push(SelectionItem {
        id: DISABLED_SENTINEL.to_string(),
        name: DISABLE_ALL_LABEL.to_string(),
        description: Some("Turn every mode off".to_string()),
        active: active.is_none(),
    });
    items
}

/// Applies a pick and tells the user how it went.
///
/// A failed request produces exactly one notification; picking the mode that
/// is already active produces none.
pub fn select(
    registry: &ModeRegistry,
    target: &SelectionTarget,
    notifications: &Notifications,
) -> Result<(), ModeError> {
    let result = match target {
        SelectionTarget::Mode(id) => registry.activate(id).map(|activation| {
            if activation == Activation::Activated {
                let name = registry
                    .get_active()
                    .map(|mode| mode.name)
                    .unwrap_or_else(|| id.clone());
                notifications.info(format!("{} activated", name));
            }
        }),
        SelectionTarget::DisableAll => registry.deactivate_all().map(|was_active| {
            if was_active {
                notifications.info("All modes disabled");
            }
        }),
    };

    if let Err(err) = &result {
        match err {
            ModeError::TransitionBusy { .. } => notifications.warning(err.to_string()),
            _ => notifications.error(err.to_string()),
        }
    }
    result
}
