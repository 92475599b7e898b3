//! Plugin system - trait surface, lifecycle management and built-ins

pub mod builtin;
pub mod manager;
pub mod trait_def;

pub use manager::PluginManager;
pub use trait_def::Plugin;
