//! Command router - maps a typed command token to a registered handler
//!
//! Argument handling follows the plugin surface: the handler receives the
//! raw argument string (or nothing), and the router only counts
//! whitespace-separated tokens to enforce arity. No shell tokenization.

use crate::application::errors::RouterError;
use crate::application::registry::SharedRegistry;

pub struct CommandRouter {
    registry: SharedRegistry,
}

impl CommandRouter {
    pub fn new(registry: SharedRegistry) -> Self {
        Self { registry }
    }

    /// Route a typed command to its registered handler
    ///
    /// `UnknownCommand` and `Arity` surface to the user with expected
    /// usage; a failure inside the handler is caught and logged, never
    /// returned to the caller.
    pub fn route(&self, name: &str, raw_args: Option<&str>) -> Result<(), RouterError> {
        let registration = self
            .registry
            .read()
            .ok()
            .and_then(|r| r.command(name))
            .ok_or_else(|| RouterError::UnknownCommand(name.to_string()))?;

        let arg = raw_args.map(str::trim).filter(|s| !s.is_empty());
        let count = arg.map(|s| s.split_whitespace().count()).unwrap_or(0);
        if !registration.spec.accepts(count) {
            return Err(RouterError::Arity {
                min: registration.spec.min_args,
                max: registration.spec.max_args,
                got: count,
                usage: registration.spec.usage.clone(),
            });
        }

        // Registry lock is released; the handler may re-enter the facade
        if let Err(e) = registration.action.call(arg) {
            tracing::warn!(
                "Command {} from plugin '{}' failed: {}",
                name,
                registration.owner,
                e
            );
        }
        Ok(())
    }

    /// Usage line for a command, for the outer client's help output
    pub fn usage(&self, name: &str) -> Option<String> {
        self.registry
            .read()
            .ok()
            .and_then(|r| r.command(name))
            .map(|reg| reg.spec.usage.clone())
    }
}
