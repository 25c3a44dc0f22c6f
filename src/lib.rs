//! modeswitch - a plugin host where exactly one "mode" at a time drives an
//! editor's ambient UI in reaction to cursor and document events.
//!
//! # Modules
//!
//! - `registry`: the mode registry, activation state machine and command registrar
//! - `mode`: the contract every mode implements
//! - `session`: bootstrap, event dispatch and the selection surface
//! - `store`: persisted key-value state
//! - `host`: events, status bar and notifications at the host boundary
//! - `modes`: built-in modes
//! - `config`: TOML configuration

pub mod config;
pub mod host;
pub mod mode;
pub mod modes;
pub mod registry;
pub mod session;
pub mod store;
