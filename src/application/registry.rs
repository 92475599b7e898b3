//! Callback registry - commands and timers contributed by plugins
//!
//! Registration order is recorded and stable; dispatch, routing and
//! scheduling all iterate in it. The registry is mutated only on plugin
//! load/unload and read everywhere else, so a single `RwLock` per
//! operation is enough to make a multi-threaded host safe.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::application::errors::{CallbackResult, RegistryError};
use crate::domain::entities::CommandSpec;
use crate::plugins::trait_def::{CommandHandler, TimerHandler};

/// Opaque handle identifying one registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(Uuid);

impl RegistrationId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// How a command is backed: built-ins ship with the host, plugin
/// handlers arrive through the facade as opaque callables.
pub enum CommandAction {
    Builtin(fn(Option<&str>) -> CallbackResult),
    Plugin(Arc<dyn CommandHandler>),
}

impl CommandAction {
    pub fn call(&self, arg: Option<&str>) -> CallbackResult {
        match self {
            CommandAction::Builtin(f) => f(arg),
            CommandAction::Plugin(h) => h.call(arg),
        }
    }
}

/// A named command contributed by a plugin
pub struct CommandRegistration {
    pub id: RegistrationId,
    pub owner: String,
    pub spec: CommandSpec,
    pub action: CommandAction,
}

/// A repeating timer contributed by a plugin
pub struct TimerRegistration {
    pub id: RegistrationId,
    pub owner: String,
    pub interval: Duration,
    /// Baseline for the first fire
    pub registered_at: Instant,
    pub handler: Arc<dyn TimerHandler>,
}

/// Stores named command and timer callbacks in registration order
#[derive(Default)]
pub struct CallbackRegistry {
    commands: Vec<Arc<CommandRegistration>>,
    timers: Vec<Arc<TimerRegistration>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command; the first registration of a name wins
    pub fn register_command(
        &mut self,
        owner: &str,
        spec: CommandSpec,
        action: CommandAction,
    ) -> Result<RegistrationId, RegistryError> {
        if spec.min_args > spec.max_args {
            return Err(RegistryError::InvalidArity {
                min: spec.min_args,
                max: spec.max_args,
            });
        }

        if let Some(existing) = self.commands.iter().find(|c| c.spec.name == spec.name) {
            return Err(RegistryError::DuplicateName {
                name: spec.name,
                owner: existing.owner.clone(),
            });
        }

        let id = RegistrationId::new();
        tracing::info!("Registered command {} for plugin '{}'", spec.name, owner);
        self.commands.push(Arc::new(CommandRegistration {
            id,
            owner: owner.to_string(),
            spec,
            action,
        }));
        Ok(id)
    }

    /// Register a repeating timer with a positive interval
    pub fn register_timer(
        &mut self,
        owner: &str,
        handler: Arc<dyn TimerHandler>,
        interval: Duration,
    ) -> Result<RegistrationId, RegistryError> {
        if interval.is_zero() {
            return Err(RegistryError::ZeroInterval);
        }

        let id = RegistrationId::new();
        tracing::info!(
            "Registered {}s timer for plugin '{}'",
            interval.as_secs(),
            owner
        );
        self.timers.push(Arc::new(TimerRegistration {
            id,
            owner: owner.to_string(),
            interval,
            registered_at: Instant::now(),
            handler,
        }));
        Ok(id)
    }

    /// Remove every registration the plugin owns, atomically with unload
    pub fn unregister_all(&mut self, owner: &str) {
        let before = self.commands.len() + self.timers.len();
        self.commands.retain(|c| c.owner != owner);
        self.timers.retain(|t| t.owner != owner);
        let removed = before - self.commands.len() - self.timers.len();
        if removed > 0 {
            tracing::info!("Removed {} registrations for plugin '{}'", removed, owner);
        }
    }

    /// Look up a command by its typed name
    pub fn command(&self, name: &str) -> Option<Arc<CommandRegistration>> {
        self.commands.iter().find(|c| c.spec.name == name).cloned()
    }

    /// Snapshot of all timers in registration order
    pub fn timers(&self) -> Vec<Arc<TimerRegistration>> {
        self.timers.clone()
    }

    /// All registered command names in registration order
    pub fn command_names(&self) -> Vec<String> {
        self.commands.iter().map(|c| c.spec.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len() + self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.timers.is_empty()
    }
}

/// Thread-safe handle shared between the facade, router, scheduler and manager
pub type SharedRegistry = Arc<RwLock<CallbackRegistry>>;

/// Create a new shared registry
pub fn shared_registry() -> SharedRegistry {
    Arc::new(RwLock::new(CallbackRegistry::new()))
}
