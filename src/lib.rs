//! prattle - plugin host for a console chat client
//!
//! The host owns registration, dispatch and isolation of plugin callbacks:
//! plugins contribute commands, timers and event hooks, and everything they
//! may do to the outside world goes through the restricted host facade.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod plugins;
