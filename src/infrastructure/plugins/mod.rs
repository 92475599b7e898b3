//! Dynamic plugin loading infrastructure

pub mod loader;
pub mod manifest;

pub use loader::{LoadedPlugin, PluginLoader};
pub use manifest::PluginManifest;
