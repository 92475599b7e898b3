//! Plugin loader - dynamically loads plugins from shared libraries
//!
//! Each plugin lives in its own directory with a `plugin.yaml` manifest
//! and a cdylib exposing `prattle_plugin_init`. A broken plugin fails
//! alone; its siblings still load.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::{Library, Symbol};

use crate::application::errors::PluginError;
use crate::plugins::trait_def::Plugin;

use super::manifest::PluginManifest;

/// Function signature the plugin library must export
///
/// The trait-object pointer is not C-compatible; it is an opaque value
/// that only crosses between binaries built against this crate's ABI.
#[allow(improper_ctypes_definitions)]
pub type PluginInitFn = extern "C" fn() -> *mut dyn Plugin;

/// A plugin instance together with the library that backs it
///
/// The library must stay mapped as long as the instance is callable, so
/// both travel together into the manager's slot.
pub struct LoadedPlugin {
    library: Library,
    manifest: PluginManifest,
    instance: Arc<dyn Plugin>,
}

impl LoadedPlugin {
    pub fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    pub fn into_parts(self) -> (Arc<dyn Plugin>, Library, PluginManifest) {
        (self.instance, self.library, self.manifest)
    }
}

/// Loads plugins out of a plugins directory
pub struct PluginLoader {
    plugin_dir: PathBuf,
}

impl PluginLoader {
    pub fn new(plugin_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
        }
    }

    /// Load a single plugin from a directory
    pub fn load_plugin(&self, path: impl AsRef<Path>) -> Result<LoadedPlugin, PluginError> {
        let path = path.as_ref();

        let manifest_path = path.join("plugin.yaml");
        if !manifest_path.exists() {
            return Err(PluginError::Load(format!(
                "Missing plugin.yaml in {}",
                path.display()
            )));
        }

        let manifest = PluginManifest::from_file(&manifest_path)?;

        let library_path = if let Some(lib) = &manifest.library {
            path.join(lib)
        } else {
            path.join(format!("libprattle_{}.so", manifest.name))
        };

        if !library_path.exists() {
            return Err(PluginError::Load(format!(
                "Library not found: {}",
                library_path.display()
            )));
        }

        let library = unsafe {
            Library::new(&library_path)
                .map_err(|e| PluginError::Load(format!("Failed to load library: {}", e)))?
        };

        let init_fn: Symbol<PluginInitFn> = unsafe {
            library
                .get(b"prattle_plugin_init")
                .map_err(|e| PluginError::Load(format!("Failed to find init function: {}", e)))?
        };

        let instance: Arc<dyn Plugin> = unsafe {
            let plugin_ptr = init_fn();
            if plugin_ptr.is_null() {
                return Err(PluginError::Load("Plugin init returned null".to_string()));
            }
            Arc::from(Box::from_raw(plugin_ptr))
        };

        tracing::info!("Found plugin: {} v{}", manifest.name, manifest.version);

        Ok(LoadedPlugin {
            library,
            manifest,
            instance,
        })
    }

    /// Load all plugins from the plugin directory
    pub fn load_all(&self) -> Result<Vec<LoadedPlugin>, PluginError> {
        let mut plugins = Vec::new();

        if !self.plugin_dir.exists() {
            tracing::warn!(
                "Plugin directory does not exist: {}",
                self.plugin_dir.display()
            );
            return Ok(plugins);
        }

        for entry in std::fs::read_dir(&self.plugin_dir)
            .map_err(|e| PluginError::Load(format!("Failed to read plugin directory: {}", e)))?
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            // Skip hidden directories
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    continue;
                }
            }

            match self.load_plugin(&path) {
                Ok(plugin) => plugins.push(plugin),
                Err(e) => {
                    tracing::warn!("Failed to load plugin from {}: {}", path.display(), e);
                }
            }
        }

        Ok(plugins)
    }
}
