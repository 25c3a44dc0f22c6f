//! The boundary with the host editor.
//!
//! Nothing in here knows about modes or the registry. It is the surface the
//! registry and the modes talk to:
//!
//! - `event`: cursor / document / editor notifications coming from the host
//! - `status_bar`: the ambient UI surface modes write their indicators to
//! - `notifications`: one-line user-facing messages
//! - `script`: a line-oriented host simulator used by the `modeswitch` binary

pub mod event;
pub mod notifications;
pub mod script;
pub mod status_bar;

pub use event::HostEvent;
pub use notifications::{Message, MessageLevel, Notifications};
pub use status_bar::{StatusBar, StatusItem, StatusTone};
