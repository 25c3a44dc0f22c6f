//! Built-in modes.
//!
//! - `position`: cursor position and characters typed (the fallback mode)
//! - `line-length`: warns when the current line gets too long
//! - `records`: furthest line and column reached, persisted across sessions

pub mod line_length;
pub mod position;
pub mod records;

pub use line_length::LineLengthMode;
pub use position::PositionMode;
pub use records::RecordsMode;

use crate::config::Config;
use crate::host::{Notifications, StatusBar};
use crate::mode::Mode;

/// Every built-in mode, in the order they should be listed.
pub fn builtin_modes(
    config: &Config,
    status_bar: &StatusBar,
    notifications: &Notifications,
) -> Vec<Box<dyn Mode>> {
    vec![
        Box::new(PositionMode::new(status_bar)),
        Box::new(LineLengthMode::new(
            status_bar,
            notifications,
            config.line_length_limit,
            config.line_length_threshold,
        )),
        Box::new(RecordsMode::new(status_bar, notifications)),
    ]
}
