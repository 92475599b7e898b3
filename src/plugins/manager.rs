//! Plugin manager - load/unload lifecycle and per-plugin state
//!
//! State machine per plugin: `Unloaded -> Initialized (init ok) ->
//! Started (on_start ok) -> Unloaded`. A failure in `init` or `on_start`
//! moves the attempt to `Failed`, which is terminal until an explicit
//! reload. Failing or unloading a plugin removes all of its
//! registrations atomically; a callback already in flight is allowed to
//! run to completion.

use std::path::Path;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use libloading::Library;

use crate::application::dispatcher::EventDispatcher;
use crate::application::errors::{PluginError, PluginResult};
use crate::application::registry::SharedRegistry;
use crate::domain::entities::{LoadLogEntry, PluginState};
use crate::infrastructure::host::{Host, HostHandle, SharedLoadLog};
use crate::infrastructure::plugins::loader::PluginLoader;
use crate::plugins::trait_def::Plugin;

/// One loaded (or failed) plugin and its lifecycle state
pub struct PluginSlot {
    pub instance: Arc<dyn Plugin>,
    pub state: PluginState,
    pub loaded_at: DateTime<Utc>,
    /// Keeps a dynamic plugin's library mapped for the slot's lifetime
    library: Option<Library>,
}

impl PluginSlot {
    pub fn new(instance: Arc<dyn Plugin>) -> Self {
        Self {
            instance,
            state: PluginState::Initialized,
            loaded_at: Utc::now(),
            library: None,
        }
    }

    fn with_library(mut self, library: Option<Library>) -> Self {
        self.library = library;
        self
    }
}

/// Plugins in load order, shared with the event dispatcher
pub type SharedSlots = Arc<RwLock<Vec<PluginSlot>>>;

/// Manages all plugins for the host
pub struct PluginManager {
    slots: SharedSlots,
    registry: SharedRegistry,
    load_log: SharedLoadLog,
    host: Arc<Host>,
    api_version: String,
    api_status: String,
}

impl PluginManager {
    pub fn new(
        host: Arc<Host>,
        registry: SharedRegistry,
        load_log: SharedLoadLog,
        api_version: impl Into<String>,
        api_status: impl Into<String>,
    ) -> Self {
        Self {
            slots: Arc::new(RwLock::new(Vec::new())),
            registry,
            load_log,
            host,
            api_version: api_version.into(),
            api_status: api_status.into(),
        }
    }

    /// Dispatcher over this manager's plugins, in load order
    pub fn dispatcher(&self) -> EventDispatcher {
        EventDispatcher::new(
            self.slots.clone(),
            self.registry.clone(),
            self.load_log.clone(),
        )
    }

    /// Load a plugin and run its `init` hook
    pub fn load(&self, plugin: Arc<dyn Plugin>) -> PluginResult<()> {
        self.load_inner(plugin, None)
    }

    /// Load every dynamic plugin found under `dir`
    ///
    /// A plugin that fails to load or initialize never stops its
    /// siblings.
    pub fn load_directory(&self, dir: impl AsRef<Path>) -> PluginResult<usize> {
        let loader = PluginLoader::new(dir.as_ref());
        let mut loaded = 0;
        for candidate in loader.load_all()? {
            let (instance, library, manifest) = candidate.into_parts();
            match self.load_inner(instance, Some(library)) {
                Ok(()) => loaded += 1,
                Err(e) => {
                    tracing::warn!("Skipping plugin '{}': {}", manifest.name, e);
                }
            }
        }
        Ok(loaded)
    }

    fn load_inner(&self, plugin: Arc<dyn Plugin>, library: Option<Library>) -> PluginResult<()> {
        let name = plugin.name().to_string();
        {
            let slots = self.lock_slots_read()?;
            if slots.iter().any(|s| s.instance.name() == name) {
                return Err(PluginError::Load(format!(
                    "plugin '{}' is already loaded",
                    name
                )));
            }
        }

        let handle = HostHandle::new(name.clone(), self.host.clone());
        match plugin.init(handle, &self.api_version, &self.api_status) {
            Ok(()) => {
                tracing::info!("Loaded plugin: {}", name);
                self.log(&name, "initialized");
                let mut slots = self.lock_slots_write()?;
                slots.push(PluginSlot::new(plugin).with_library(library));
                Ok(())
            }
            Err(e) => {
                tracing::error!("Plugin '{}' init failed: {}", name, e);
                self.log(&name, format!("init failed: {}", e));
                // Registrations made before init failed never linger
                if let Ok(mut registry) = self.registry.write() {
                    registry.unregister_all(&name);
                }
                let mut slot = PluginSlot::new(plugin).with_library(library);
                slot.state = PluginState::Failed;
                self.lock_slots_write()?.push(slot);
                Err(PluginError::Init(e.to_string()))
            }
        }
    }

    /// Unload a plugin, removing all of its registrations
    pub fn unload(&self, name: &str) -> PluginResult<()> {
        self.remove_slot(name)?;
        tracing::info!("Unloaded plugin: {}", name);
        self.log(name, "unloaded");
        Ok(())
    }

    /// Unload (if present) and load again; the only way to retry `Failed`
    pub fn reload(&self, plugin: Arc<dyn Plugin>) -> PluginResult<()> {
        let name = plugin.name().to_string();
        if self.state(&name).is_some() {
            self.remove_slot(&name)?;
        }
        self.load(plugin)
    }

    fn remove_slot(&self, name: &str) -> PluginResult<()> {
        let removed = {
            let mut slots = self.lock_slots_write()?;
            let position = slots.iter().position(|s| s.instance.name() == name);
            position.map(|i| slots.remove(i))
        };
        if removed.is_none() {
            return Err(PluginError::NotFound(name.to_string()));
        }
        if let Ok(mut registry) = self.registry.write() {
            registry.unregister_all(name);
        }
        Ok(())
    }

    /// Lifecycle state of a plugin, if the host knows it
    pub fn state(&self, name: &str) -> Option<PluginState> {
        self.slots
            .read()
            .ok()?
            .iter()
            .find(|s| s.instance.name() == name)
            .map(|s| s.state)
    }

    /// Names of all plugins in load order
    pub fn names(&self) -> Vec<String> {
        self.slots
            .read()
            .ok()
            .map(|slots| {
                slots
                    .iter()
                    .map(|s| s.instance.name().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Snapshot of the load log
    pub fn load_log(&self) -> Vec<LoadLogEntry> {
        self.load_log
            .read()
            .ok()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    fn log(&self, plugin: &str, message: impl Into<String>) {
        if let Ok(mut log) = self.load_log.write() {
            log.push(LoadLogEntry::new(plugin, message));
        }
    }

    fn lock_slots_read(&self) -> PluginResult<std::sync::RwLockReadGuard<'_, Vec<PluginSlot>>> {
        self.slots
            .read()
            .map_err(|_| PluginError::Internal("slot lock poisoned".to_string()))
    }

    fn lock_slots_write(&self) -> PluginResult<std::sync::RwLockWriteGuard<'_, Vec<PluginSlot>>> {
        self.slots
            .write()
            .map_err(|_| PluginError::Internal("slot lock poisoned".to_string()))
    }
}
