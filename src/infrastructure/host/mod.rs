//! Plugin host facade - the sole capability surface exposed to plugin code
//!
//! Every observable effect a plugin can produce goes through here, so the
//! host can audit, rate-limit or sandbox plugin activity without touching
//! its internal APIs. The facade itself is pass-throughs: real subsystems
//! sit behind the backend traits below.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::application::errors::RegistryError;
use crate::application::registry::{CommandAction, RegistrationId, SharedRegistry};
use crate::domain::entities::{CommandSpec, LoadLogEntry};
use crate::plugins::trait_def::{CommandHandler, TimerHandler};

/// Console backend: plugin-visible text output
pub trait Console: Send + Sync {
    fn show(&self, text: &str);
    fn alert(&self);
}

/// Outgoing protocol transport
pub trait Transport: Send + Sync {
    fn send_line(&self, line: &str);
}

/// OS notification backend
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, timeout_ms: u64, category: &str);
}

/// Session state the host tracks on behalf of the user
pub trait Session: Send + Sync {
    fn current_recipient(&self) -> Option<String>;
}

/// Shared load log; registration failures during load land here so the
/// offending plugin's author can see them
pub type SharedLoadLog = Arc<RwLock<Vec<LoadLogEntry>>>;

pub fn shared_load_log() -> SharedLoadLog {
    Arc::new(RwLock::new(Vec::new()))
}

/// The host behind the facade
pub struct Host {
    registry: SharedRegistry,
    load_log: SharedLoadLog,
    console: Arc<dyn Console>,
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
    session: Arc<dyn Session>,
}

impl Host {
    pub fn new(
        registry: SharedRegistry,
        load_log: SharedLoadLog,
        console: Arc<dyn Console>,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
        session: Arc<dyn Session>,
    ) -> Self {
        Self {
            registry,
            load_log,
            console,
            transport,
            notifier,
            session,
        }
    }

    fn record(&self, plugin: &str, message: String) {
        if let Ok(mut log) = self.load_log.write() {
            log.push(LoadLogEntry::new(plugin, message));
        }
    }

    fn register_command(
        &self,
        plugin: &str,
        spec: CommandSpec,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<RegistrationId, RegistryError> {
        let result = self
            .registry
            .write()
            .map_err(|_| RegistryError::Poisoned)
            .and_then(|mut r| r.register_command(plugin, spec, CommandAction::Plugin(handler)));
        if let Err(e) = &result {
            tracing::warn!("Plugin '{}' command registration rejected: {}", plugin, e);
            self.record(plugin, format!("command registration rejected: {}", e));
        }
        result
    }

    fn register_timed(
        &self,
        plugin: &str,
        handler: Arc<dyn TimerHandler>,
        interval: Duration,
    ) -> Result<RegistrationId, RegistryError> {
        let result = self
            .registry
            .write()
            .map_err(|_| RegistryError::Poisoned)
            .and_then(|mut r| r.register_timer(plugin, handler, interval));
        if let Err(e) = &result {
            tracing::warn!("Plugin '{}' timer registration rejected: {}", plugin, e);
            self.record(plugin, format!("timer registration rejected: {}", e));
        }
        result
    }
}

/// Capability handle bound to one plugin, handed to `init`
///
/// Plugins keep a clone to call back into the host later; the handle
/// carries the owning plugin's identity so registrations can never be
/// attributed to someone else.
#[derive(Clone)]
pub struct HostHandle {
    plugin: String,
    host: Arc<Host>,
}

impl HostHandle {
    pub fn new(plugin: impl Into<String>, host: Arc<Host>) -> Self {
        Self {
            plugin: plugin.into(),
            host,
        }
    }

    /// Name of the plugin this handle belongs to
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Show a line of text in the console window
    pub fn cons_show(&self, text: &str) {
        self.host.console.show(text);
    }

    /// Ring the console attention flag
    pub fn cons_alert(&self) {
        self.host.console.alert();
    }

    /// Send a raw line over the protocol transport
    pub fn send_line(&self, line: &str) {
        self.host.transport.send_line(line);
    }

    /// Raise an OS notification
    pub fn notify(&self, message: &str, timeout_ms: u64, category: &str) {
        self.host.notifier.notify(message, timeout_ms, category);
    }

    /// The recipient of the currently focused chat, if any
    pub fn get_current_recipient(&self) -> Option<String> {
        self.host.session.current_recipient()
    }

    /// Register a command owned by this plugin
    pub fn register_command(
        &self,
        spec: CommandSpec,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<RegistrationId, RegistryError> {
        self.host.register_command(&self.plugin, spec, handler)
    }

    /// Register a repeating timer owned by this plugin
    pub fn register_timed(
        &self,
        handler: Arc<dyn TimerHandler>,
        interval_secs: u64,
    ) -> Result<RegistrationId, RegistryError> {
        self.host
            .register_timed(&self.plugin, handler, Duration::from_secs(interval_secs))
    }
}
