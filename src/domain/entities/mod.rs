pub mod command;
pub mod event;
pub mod plugin;

pub use command::CommandSpec;
pub use event::HostEvent;
pub use plugin::{LoadLogEntry, PluginState};
