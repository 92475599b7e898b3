//! Host-side error taxonomy

use thiserror::Error;

/// Registration-time errors
///
/// These are reported to the registering plugin's load log and prevent
/// that specific registration from taking effect; they never fail the
/// whole plugin load on their own.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command '{name}' is already registered by plugin '{owner}'")]
    DuplicateName { name: String, owner: String },

    #[error("invalid argument range: min {min} > max {max}")]
    InvalidArity { min: usize, max: usize },

    #[error("timer interval must be positive")]
    ZeroInterval,

    #[error("registry lock poisoned")]
    Poisoned,
}

/// Errors surfaced to the user when routing a typed command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("expected between {min} and {max} arguments, got {got}. Usage: {usage}")]
    Arity {
        min: usize,
        max: usize,
        got: usize,
        usage: String,
    },
}

/// Plugin lifecycle errors
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("plugin init failed: {0}")]
    Init(String),

    #[error("failed to load plugin: {0}")]
    Load(String),

    #[error("plugin not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type PluginResult<T> = Result<T, PluginError>;

/// Failure raised by a dispatched handler
///
/// Always caught at the call site, logged with plugin identity and event
/// name, and never propagated to sibling plugins or the host's own
/// control flow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct CallbackError(pub String);

impl CallbackError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

pub type CallbackResult<T = ()> = Result<T, CallbackError>;
