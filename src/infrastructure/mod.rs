pub mod adapters;
pub mod config;
pub mod host;
pub mod plugins;
